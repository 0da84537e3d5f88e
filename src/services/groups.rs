use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::group::{Group, GroupMemberDto, GroupMembership, MembershipRole};
use crate::services::validation;

/// Invite codes live for 24 hours from generation.
const INVITE_CODE_TTL_HOURS: i64 = 24;

pub struct GroupService;

impl GroupService {
    /// Create a group and its creator membership in one transaction.
    pub async fn create(
        pool: &PgPool,
        creator_id: Uuid,
        name: &str,
        emoji: Option<&str>,
    ) -> ApiResult<Group> {
        let name = validation::group_name(name)?;
        let invite_code = generate_invite_code();
        let invite_expires_at = Utc::now() + Duration::hours(INVITE_CODE_TTL_HOURS);

        let mut tx = pool.begin().await?;

        let group = sqlx::query_as::<_, Group>(
            "INSERT INTO groups (name, emoji, created_by, invite_code, invite_expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(&name)
        .bind(emoji.unwrap_or("👥"))
        .bind(creator_id)
        .bind(&invite_code)
        .bind(invite_expires_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO group_memberships (user_id, group_id, role)
             VALUES ($1, $2, $3)",
        )
        .bind(creator_id)
        .bind(group.id)
        .bind(MembershipRole::Creator.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(group)
    }

    /// Join a group with an invite code. Codes are not single-use, only
    /// time-expiring, checked lazily at use time. A former member is
    /// reactivated; an active member gets `IllegalState`. A concurrent
    /// duplicate join loses on the partial unique index.
    pub async fn join_by_invite_code(pool: &PgPool, user_id: Uuid, code: &str) -> ApiResult<Group> {
        let code = validation::invite_code(code)?;

        let group = sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE invite_code = $1")
            .bind(&code)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("유효하지 않은 초대 코드입니다".into()))?;

        if !group.is_invite_valid(Utc::now()) {
            return Err(ApiError::NotFound("초대 코드가 만료되었습니다".into()));
        }
        if group.is_archived {
            return Err(ApiError::IllegalState("보관된 그룹에는 참여할 수 없습니다".into()));
        }

        let active_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM group_memberships WHERE group_id = $1 AND is_active = TRUE",
        )
        .bind(group.id)
        .fetch_one(pool)
        .await?;
        if active_count >= group.max_members as i64 {
            return Err(ApiError::IllegalState("그룹 인원이 가득 찼습니다".into()));
        }

        let existing = sqlx::query_as::<_, GroupMembership>(
            "SELECT * FROM group_memberships
             WHERE group_id = $1 AND user_id = $2
             ORDER BY joined_at DESC
             LIMIT 1",
        )
        .bind(group.id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        let insert_result = match existing {
            Some(m) if m.is_active => {
                return Err(ApiError::IllegalState("이미 이 그룹의 멤버입니다".into()));
            }
            Some(m) => {
                // Left before — reactivate rather than insert a second row.
                sqlx::query(
                    "UPDATE group_memberships
                     SET is_active = TRUE, role = 'member', joined_at = now(), left_at = NULL
                     WHERE id = $1",
                )
                .bind(m.id)
                .execute(pool)
                .await
            }
            None => {
                sqlx::query(
                    "INSERT INTO group_memberships (user_id, group_id, role)
                     VALUES ($1, $2, 'member')",
                )
                .bind(user_id)
                .bind(group.id)
                .execute(pool)
                .await
            }
        };

        match insert_result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(ApiError::IllegalState("이미 이 그룹의 멤버입니다".into()));
            }
            Err(e) => return Err(e.into()),
        }

        Self::touch_activity(pool, group.id).await?;
        Ok(group)
    }

    /// Deactivate the caller's membership. The creator archives instead of
    /// leaving.
    pub async fn leave(pool: &PgPool, group_id: Uuid, user_id: Uuid) -> ApiResult<()> {
        let membership = Self::require_active_member(pool, group_id, user_id).await?;
        if membership.role == MembershipRole::Creator.to_string() {
            return Err(ApiError::IllegalState(
                "그룹을 만든 분은 나갈 수 없어요. 대신 그룹을 보관해 주세요".into(),
            ));
        }

        sqlx::query(
            "UPDATE group_memberships
             SET is_active = FALSE, left_at = now()
             WHERE id = $1 AND is_active = TRUE",
        )
        .bind(membership.id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn archive(pool: &PgPool, group_id: Uuid, user_id: Uuid) -> ApiResult<()> {
        Self::require_creator(pool, group_id, user_id).await?;
        sqlx::query("UPDATE groups SET is_archived = TRUE WHERE id = $1")
            .bind(group_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Issue a fresh invite code with a fresh 24h expiry.
    pub async fn regenerate_invite_code(
        pool: &PgPool,
        group_id: Uuid,
        user_id: Uuid,
    ) -> ApiResult<Group> {
        Self::require_creator(pool, group_id, user_id).await?;

        let group = sqlx::query_as::<_, Group>(
            "UPDATE groups
             SET invite_code = $2, invite_expires_at = $3
             WHERE id = $1
             RETURNING *",
        )
        .bind(group_id)
        .bind(generate_invite_code())
        .bind(Utc::now() + Duration::hours(INVITE_CODE_TTL_HOURS))
        .fetch_one(pool)
        .await?;
        Ok(group)
    }

    /// Non-archived groups the user is an active member of, most recently
    /// active first.
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> ApiResult<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT g.* FROM groups g
             JOIN group_memberships m ON m.group_id = g.id
             WHERE m.user_id = $1 AND m.is_active = TRUE AND g.is_archived = FALSE
             ORDER BY g.last_activity_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(groups)
    }

    pub async fn get(pool: &PgPool, group_id: Uuid, user_id: Uuid) -> ApiResult<Group> {
        Self::require_active_member(pool, group_id, user_id).await?;
        sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1")
            .bind(group_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("그룹을 찾을 수 없습니다".into()))
    }

    pub async fn members(pool: &PgPool, group_id: Uuid, user_id: Uuid) -> ApiResult<Vec<GroupMemberDto>> {
        Self::require_active_member(pool, group_id, user_id).await?;
        let members = sqlx::query_as::<_, GroupMemberDto>(
            "SELECT m.user_id, u.nickname, u.avatar_emoji, m.role, m.joined_at
             FROM group_memberships m
             JOIN users u ON u.id = m.user_id
             WHERE m.group_id = $1 AND m.is_active = TRUE
             ORDER BY m.joined_at",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;
        Ok(members)
    }

    /// Gate used by every lifecycle operation: the actor must hold an active
    /// membership in the group.
    pub async fn require_active_member(
        pool: &PgPool,
        group_id: Uuid,
        user_id: Uuid,
    ) -> ApiResult<GroupMembership> {
        sqlx::query_as::<_, GroupMembership>(
            "SELECT * FROM group_memberships
             WHERE group_id = $1 AND user_id = $2 AND is_active = TRUE",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("그룹 멤버만 이용할 수 있습니다".into()))
    }

    async fn require_creator(pool: &PgPool, group_id: Uuid, user_id: Uuid) -> ApiResult<GroupMembership> {
        let membership = Self::require_active_member(pool, group_id, user_id).await?;
        if membership.role != MembershipRole::Creator.to_string() {
            return Err(ApiError::Unauthorized("그룹을 만든 분만 할 수 있습니다".into()));
        }
        Ok(membership)
    }

    pub async fn touch_activity(pool: &PgPool, group_id: Uuid) -> ApiResult<()> {
        sqlx::query("UPDATE groups SET last_activity_at = now() WHERE id = $1")
            .bind(group_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// 8 uppercase alphanumeric characters, e.g. "K7P2XQ9M".
fn generate_invite_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect()
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_codes_are_well_formed() {
        for _ in 0..50 {
            let code = generate_invite_code();
            assert_eq!(code.len(), 8);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(!code.chars().any(|c| c.is_ascii_lowercase()));
            // Codes validate against the same gate join uses.
            assert_eq!(validation::invite_code(&code).unwrap(), code);
        }
    }
}
