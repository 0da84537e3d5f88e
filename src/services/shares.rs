use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::notification::NotificationKind;
use crate::models::share::{CreateShareRequest, Share, ShareStatus};
use crate::services::groups::GroupService;
use crate::services::notifications::NotificationIntent;
use crate::services::validation;

/// Share lifecycle: pending → confirmed | disputed, with an orthogonal soft
/// delete. Every transition is a single compare-and-swap UPDATE keyed on the
/// current status, so concurrent actors on the same share serialize and the
/// loser gets `IllegalState`.
pub struct ShareService;

impl ShareService {
    pub async fn create(
        pool: &PgPool,
        group_id: Uuid,
        created_by: Uuid,
        req: &CreateShareRequest,
    ) -> ApiResult<(Share, Vec<NotificationIntent>)> {
        let description = validation::share_description(&req.description)?;
        validation::share_duration(req.duration_seconds)?;
        if req.giver_user_id == req.receiver_user_id {
            return Err(ApiError::InvalidInput("같은 사람을 선택할 수 없습니다".into()));
        }

        GroupService::require_active_member(pool, group_id, created_by).await?;
        GroupService::require_active_member(pool, group_id, req.giver_user_id).await?;
        GroupService::require_active_member(pool, group_id, req.receiver_user_id).await?;

        let share = sqlx::query_as::<_, Share>(
            "INSERT INTO shares
                (group_id, giver_user_id, receiver_user_id, description, category,
                 occurred_at, duration_seconds, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(group_id)
        .bind(req.giver_user_id)
        .bind(req.receiver_user_id)
        .bind(&description)
        .bind(&req.category)
        .bind(req.occurred_at)
        .bind(req.duration_seconds)
        .bind(created_by)
        .fetch_one(pool)
        .await?;

        GroupService::touch_activity(pool, group_id).await?;

        let giver_name = Self::nickname(pool, share.giver_user_id).await?;
        let intents = vec![NotificationIntent {
            recipient_user_id: share.receiver_user_id,
            kind: NotificationKind::SharePending,
            title: "나눔 확인 요청".into(),
            body: format!("{giver_name}님이 도움을 기록했어요. 확인해 주세요"),
            related_entity_type: "Share".into(),
            related_entity_id: share.id,
        }];

        Ok((share, intents))
    }

    pub async fn confirm(
        pool: &PgPool,
        share_id: Uuid,
        confirming_user: Uuid,
        thank_you_note: Option<&str>,
    ) -> ApiResult<(Share, Vec<NotificationIntent>)> {
        let share = Self::fetch(pool, share_id).await?;
        confirm_preconditions(&share, confirming_user)?;
        let note = match thank_you_note {
            Some(n) => validation::thank_you_note(n)?,
            None => None,
        };

        let updated = sqlx::query_as::<_, Share>(
            "UPDATE shares
             SET status = 'confirmed', confirmed_at = now(), confirmed_by = $2,
                 thank_you_note = $3, updated_at = now()
             WHERE id = $1 AND status = 'pending' AND is_deleted = FALSE
             RETURNING *",
        )
        .bind(share_id)
        .bind(confirming_user)
        .bind(&note)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::IllegalState("이미 처리된 나눔입니다".into()))?;

        let receiver_name = Self::nickname(pool, updated.receiver_user_id).await?;
        let body = match &updated.thank_you_note {
            Some(n) => format!("{receiver_name}님: {n}"),
            None => format!("{receiver_name}님이 나눔을 확인했어요"),
        };
        let intents = vec![NotificationIntent {
            recipient_user_id: updated.giver_user_id,
            kind: NotificationKind::ThankYou,
            title: "감사 메시지".into(),
            body,
            related_entity_type: "Share".into(),
            related_entity_id: updated.id,
        }];

        Ok((updated, intents))
    }

    /// Dispute is terminal: there is no un-dispute transition.
    pub async fn dispute(pool: &PgPool, share_id: Uuid, disputing_user: Uuid) -> ApiResult<Share> {
        let share = Self::fetch(pool, share_id).await?;
        confirm_preconditions(&share, disputing_user)?;

        let updated = sqlx::query_as::<_, Share>(
            "UPDATE shares
             SET status = 'disputed', updated_at = now()
             WHERE id = $1 AND status = 'pending' AND is_deleted = FALSE
             RETURNING *",
        )
        .bind(share_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::IllegalState("이미 처리된 나눔입니다".into()))?;

        Ok(updated)
    }

    /// Soft delete: legal from any non-deleted state, status untouched. The
    /// share stops counting toward balances.
    pub async fn soft_delete(pool: &PgPool, share_id: Uuid, user_id: Uuid) -> ApiResult<()> {
        let share = Self::fetch(pool, share_id).await?;
        delete_preconditions(&share, user_id)?;

        let result = sqlx::query(
            "UPDATE shares
             SET is_deleted = TRUE, deleted_at = now(), updated_at = now()
             WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(share_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::IllegalState("이미 삭제된 나눔입니다".into()));
        }
        Ok(())
    }

    pub async fn list_for_group(pool: &PgPool, group_id: Uuid, user_id: Uuid) -> ApiResult<Vec<Share>> {
        GroupService::require_active_member(pool, group_id, user_id).await?;
        let shares = sqlx::query_as::<_, Share>(
            "SELECT * FROM shares
             WHERE group_id = $1 AND is_deleted = FALSE
             ORDER BY occurred_at DESC",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;
        Ok(shares)
    }

    pub async fn fetch(pool: &PgPool, share_id: Uuid) -> ApiResult<Share> {
        sqlx::query_as::<_, Share>("SELECT * FROM shares WHERE id = $1")
            .bind(share_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("나눔 기록을 찾을 수 없습니다".into()))
    }

    async fn nickname(pool: &PgPool, user_id: Uuid) -> ApiResult<String> {
        let nickname: Option<String> = sqlx::query_scalar("SELECT nickname FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(nickname.unwrap_or_else(|| "누군가".into()))
    }
}

/// Confirm and dispute share the same gate: the actor must be the receiver,
/// the share must still be pending and not deleted.
fn confirm_preconditions(share: &Share, acting_user: Uuid) -> ApiResult<()> {
    if share.is_deleted {
        return Err(ApiError::IllegalState("삭제된 나눔입니다".into()));
    }
    if acting_user != share.receiver_user_id {
        return Err(ApiError::Unauthorized(
            "도움을 받은 분만 확인할 수 있습니다".into(),
        ));
    }
    if share.status != ShareStatus::Pending.to_string() {
        return Err(ApiError::IllegalState("이미 처리된 나눔입니다".into()));
    }
    Ok(())
}

/// Only a participant (or whoever recorded it) may soft-delete a share.
fn delete_preconditions(share: &Share, acting_user: Uuid) -> ApiResult<()> {
    if share.is_deleted {
        return Err(ApiError::IllegalState("이미 삭제된 나눔입니다".into()));
    }
    if acting_user != share.giver_user_id
        && acting_user != share.receiver_user_id
        && acting_user != share.created_by
    {
        return Err(ApiError::Unauthorized("본인의 나눔만 삭제할 수 있습니다".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pending_share(giver: Uuid, receiver: Uuid) -> Share {
        let now = Utc::now();
        Share {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            giver_user_id: giver,
            receiver_user_id: receiver,
            description: "장보기".into(),
            category: None,
            occurred_at: now,
            duration_seconds: 3_600,
            status: ShareStatus::Pending.to_string(),
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

    #[test]
    fn only_receiver_may_confirm() {
        let (giver, receiver) = (Uuid::new_v4(), Uuid::new_v4());
        let share = pending_share(giver, receiver);

        assert!(confirm_preconditions(&share, receiver).is_ok());
        assert!(matches!(
            confirm_preconditions(&share, giver),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            confirm_preconditions(&share, Uuid::new_v4()),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn confirm_is_single_shot() {
        let (giver, receiver) = (Uuid::new_v4(), Uuid::new_v4());
        let mut share = pending_share(giver, receiver);

        assert!(confirm_preconditions(&share, receiver).is_ok());
        share.status = ShareStatus::Confirmed.to_string();
        // Second attempt loses with IllegalState, state untouched.
        assert!(matches!(
            confirm_preconditions(&share, receiver),
            Err(ApiError::IllegalState(_))
        ));
        assert_eq!(share.status, ShareStatus::Confirmed.to_string());
    }

    #[test]
    fn disputed_is_terminal() {
        let (giver, receiver) = (Uuid::new_v4(), Uuid::new_v4());
        let mut share = pending_share(giver, receiver);
        share.status = ShareStatus::Disputed.to_string();

        assert!(matches!(
            confirm_preconditions(&share, receiver),
            Err(ApiError::IllegalState(_))
        ));
    }

    #[test]
    fn deleted_share_cannot_transition() {
        let (giver, receiver) = (Uuid::new_v4(), Uuid::new_v4());
        let mut share = pending_share(giver, receiver);
        share.is_deleted = true;

        assert!(matches!(
            confirm_preconditions(&share, receiver),
            Err(ApiError::IllegalState(_))
        ));
        assert!(matches!(
            delete_preconditions(&share, giver),
            Err(ApiError::IllegalState(_))
        ));
    }

    #[test]
    fn delete_restricted_to_participants() {
        let (giver, receiver) = (Uuid::new_v4(), Uuid::new_v4());
        let share = pending_share(giver, receiver);

        assert!(delete_preconditions(&share, giver).is_ok());
        assert!(delete_preconditions(&share, receiver).is_ok());
        assert!(matches!(
            delete_preconditions(&share, Uuid::new_v4()),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
