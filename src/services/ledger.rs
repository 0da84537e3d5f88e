use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::group::{BalanceEntryDto, BalanceSummaryResponse, GroupMembership};
use crate::models::share::Share;

/// Two hours. A group whose balance spread stays under this is "balanced".
pub const DEFAULT_BALANCE_THRESHOLD_SECONDS: i64 = 7_200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceEntry {
    pub user_id: Uuid,
    pub balance_seconds: i64,
}

// ── Pure ledger computations ────────────────────────────────────────────────
// All arithmetic in integer seconds. No I/O, no mutation; callers pass the
// group's membership and share rows.

/// Net time given minus received by a user, over confirmed, non-deleted
/// shares. Zero when the user has no qualifying shares.
pub fn balance(user_id: Uuid, shares: &[Share]) -> i64 {
    shares
        .iter()
        .filter(|s| s.counts_toward_balance())
        .map(|s| {
            if s.giver_user_id == user_id {
                s.duration_seconds
            } else if s.receiver_user_id == user_id {
                -s.duration_seconds
            } else {
                0
            }
        })
        .sum()
}

/// One entry per active member, descending balance. The sort is stable, so
/// ties keep membership iteration order (joined_at ascending).
pub fn balance_summary(active_memberships: &[GroupMembership], shares: &[Share]) -> Vec<BalanceEntry> {
    let mut entries: Vec<BalanceEntry> = active_memberships
        .iter()
        .filter(|m| m.is_active)
        .map(|m| BalanceEntry {
            user_id: m.user_id,
            balance_seconds: balance(m.user_id, shares),
        })
        .collect();
    entries.sort_by(|a, b| b.balance_seconds.cmp(&a.balance_seconds));
    entries
}

/// Sum of durations of confirmed, non-deleted shares, each counted once.
pub fn total_time_exchanged(shares: &[Share]) -> i64 {
    shares
        .iter()
        .filter(|s| s.counts_toward_balance())
        .map(|s| s.duration_seconds)
        .sum()
}

/// True iff the spread between the highest and lowest member balance is
/// strictly under the threshold. A group with fewer than two active members
/// is trivially balanced.
pub fn is_balanced(
    active_memberships: &[GroupMembership],
    shares: &[Share],
    threshold_seconds: i64,
) -> bool {
    let entries = balance_summary(active_memberships, shares);
    if entries.len() < 2 {
        return true;
    }
    // Sorted descending: first is max, last is min.
    let max = entries[0].balance_seconds;
    let min = entries[entries.len() - 1].balance_seconds;
    (max - min) < threshold_seconds
}

// ── Storage-backed wrappers ─────────────────────────────────────────────────

pub struct LedgerService;

impl LedgerService {
    /// Active memberships for a group, in join order.
    pub async fn active_memberships(pool: &PgPool, group_id: Uuid) -> ApiResult<Vec<GroupMembership>> {
        let memberships = sqlx::query_as::<_, GroupMembership>(
            "SELECT * FROM group_memberships
             WHERE group_id = $1 AND is_active = TRUE
             ORDER BY joined_at",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;
        Ok(memberships)
    }

    /// Confirmed, non-deleted shares for a group.
    pub async fn ledger_shares(pool: &PgPool, group_id: Uuid) -> ApiResult<Vec<Share>> {
        let shares = sqlx::query_as::<_, Share>(
            "SELECT * FROM shares
             WHERE group_id = $1 AND status = 'confirmed' AND is_deleted = FALSE",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;
        Ok(shares)
    }

    pub async fn balance(pool: &PgPool, group_id: Uuid, user_id: Uuid) -> ApiResult<i64> {
        let shares = Self::ledger_shares(pool, group_id).await?;
        Ok(balance(user_id, &shares))
    }

    pub async fn summary(
        pool: &PgPool,
        group_id: Uuid,
        threshold_seconds: i64,
    ) -> ApiResult<BalanceSummaryResponse> {
        let memberships = Self::active_memberships(pool, group_id).await?;
        let shares = Self::ledger_shares(pool, group_id).await?;

        let profiles: Vec<(Uuid, String, String)> = sqlx::query_as(
            "SELECT u.id, u.nickname, u.avatar_emoji
             FROM group_memberships m
             JOIN users u ON u.id = m.user_id
             WHERE m.group_id = $1 AND m.is_active = TRUE",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;

        let entries = balance_summary(&memberships, &shares)
            .into_iter()
            .map(|e| {
                let profile = profiles.iter().find(|(id, _, _)| *id == e.user_id);
                BalanceEntryDto {
                    user_id: e.user_id,
                    nickname: profile.map(|(_, n, _)| n.clone()).unwrap_or_default(),
                    avatar_emoji: profile.map(|(_, _, a)| a.clone()).unwrap_or_default(),
                    balance_seconds: e.balance_seconds,
                }
            })
            .collect();

        Ok(BalanceSummaryResponse {
            group_id,
            entries,
            total_time_exchanged_seconds: total_time_exchanged(&shares),
            is_balanced: is_balanced(&memberships, &shares, threshold_seconds),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::share::ShareStatus;
    use chrono::{Duration, Utc};

    fn share(group: Uuid, giver: Uuid, receiver: Uuid, duration: i64, status: ShareStatus) -> Share {
        let now = Utc::now();
        Share {
            id: Uuid::new_v4(),
            group_id: group,
            giver_user_id: giver,
            receiver_user_id: receiver,
            description: "아이 돌봄".into(),
            category: Some("childcare".into()),
            occurred_at: now,
            duration_seconds: duration,
            status: status.to_string(),
            confirmed_at: None,
            confirmed_by: None,
            thank_you_note: None,
            created_by: giver,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn membership(group: Uuid, user: Uuid, joined_offset_mins: i64) -> GroupMembership {
        GroupMembership {
            id: Uuid::new_v4(),
            user_id: user,
            group_id: group,
            role: "member".into(),
            display_name: None,
            is_active: true,
            joined_at: Utc::now() + Duration::minutes(joined_offset_mins),
            left_at: None,
        }
    }

    #[test]
    fn single_confirmed_share_is_symmetric() {
        let (group, a, b) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let shares = vec![share(group, a, b, 3_600, ShareStatus::Confirmed)];

        assert_eq!(balance(a, &shares), 3_600);
        assert_eq!(balance(b, &shares), -3_600);
        assert_eq!(balance(Uuid::new_v4(), &shares), 0);
    }

    #[test]
    fn pending_disputed_and_deleted_shares_do_not_count() {
        let (group, a, b) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut deleted = share(group, a, b, 1_800, ShareStatus::Confirmed);
        deleted.is_deleted = true;
        let shares = vec![
            share(group, a, b, 600, ShareStatus::Pending),
            share(group, a, b, 900, ShareStatus::Disputed),
            deleted,
        ];

        assert_eq!(balance(a, &shares), 0);
        assert_eq!(total_time_exchanged(&shares), 0);
    }

    #[test]
    fn total_counts_each_share_once_and_drops_deleted() {
        let (group, a, b) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut shares = vec![
            share(group, a, b, 3_600, ShareStatus::Confirmed),
            share(group, b, a, 1_800, ShareStatus::Confirmed),
        ];
        assert_eq!(total_time_exchanged(&shares), 5_400);

        // Soft-deleting one share decreases the total by exactly its duration.
        shares[1].is_deleted = true;
        assert_eq!(total_time_exchanged(&shares), 3_600);
    }

    #[test]
    fn summary_sorted_descending_with_stable_ties() {
        let group = Uuid::new_v4();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let memberships = vec![
            membership(group, a, 0),
            membership(group, b, 1),
            membership(group, c, 2),
        ];
        // a gives c one hour; b has no activity.
        let shares = vec![share(group, a, c, 3_600, ShareStatus::Confirmed)];

        let summary = balance_summary(&memberships, &shares);
        assert_eq!(
            summary,
            vec![
                BalanceEntry { user_id: a, balance_seconds: 3_600 },
                BalanceEntry { user_id: b, balance_seconds: 0 },
                BalanceEntry { user_id: c, balance_seconds: -3_600 },
            ]
        );

        // With no shares everyone ties at zero; join order is preserved.
        let summary = balance_summary(&memberships, &[]);
        let order: Vec<Uuid> = summary.iter().map(|e| e.user_id).collect();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn inactive_members_excluded_from_summary() {
        let group = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut left = membership(group, b, 1);
        left.is_active = false;
        let memberships = vec![membership(group, a, 0), left];

        let summary = balance_summary(&memberships, &[]);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].user_id, a);
    }

    #[test]
    fn two_hour_scenario() {
        let group = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let memberships = vec![membership(group, a, 0), membership(group, b, 1)];

        // A gives B 2 hours, confirmed: spread is 14400, not balanced at 7200.
        let mut shares = vec![share(group, a, b, 7_200, ShareStatus::Confirmed)];
        assert_eq!(balance(a, &shares), 7_200);
        assert_eq!(balance(b, &shares), -7_200);
        assert!(!is_balanced(&memberships, &shares, DEFAULT_BALANCE_THRESHOLD_SECONDS));

        // B gives A 2 hours back: both at zero, balanced.
        shares.push(share(group, b, a, 7_200, ShareStatus::Confirmed));
        assert_eq!(balance(a, &shares), 0);
        assert_eq!(balance(b, &shares), 0);
        assert!(is_balanced(&memberships, &shares, DEFAULT_BALANCE_THRESHOLD_SECONDS));
    }

    #[test]
    fn confirm_then_delete_round_trip() {
        let group = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        // Pending share contributes nothing.
        let mut s = share(group, a, b, 5_400, ShareStatus::Pending);
        assert_eq!(balance(a, std::slice::from_ref(&s)), 0);

        // Confirmation makes exactly the recorded duration visible.
        s.status = ShareStatus::Confirmed.to_string();
        assert_eq!(balance(a, std::slice::from_ref(&s)), 5_400);
        assert_eq!(balance(b, std::slice::from_ref(&s)), -5_400);

        // Soft delete restores the pre-creation balance.
        s.is_deleted = true;
        assert_eq!(balance(a, std::slice::from_ref(&s)), 0);
        assert_eq!(balance(b, std::slice::from_ref(&s)), 0);
    }

    #[test]
    fn single_member_is_trivially_balanced() {
        let group = Uuid::new_v4();
        let a = Uuid::new_v4();
        let memberships = vec![membership(group, a, 0)];

        assert!(is_balanced(&memberships, &[], DEFAULT_BALANCE_THRESHOLD_SECONDS));
        assert!(is_balanced(&[], &[], DEFAULT_BALANCE_THRESHOLD_SECONDS));
    }
}
