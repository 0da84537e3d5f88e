use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::help_request::{CreateHelpRequestRequest, HelpRequest, HelpRequestStatus};
use crate::models::notification::NotificationKind;
use crate::services::groups::GroupService;
use crate::services::notifications::NotificationIntent;
use crate::services::shares::ShareService;
use crate::services::validation;

/// Help request lifecycle: open → claimed → completed, or open → cancelled.
/// `completed` and `cancelled` are terminal; a claimed request cannot be
/// cancelled or unclaimed. Transitions are compare-and-swap UPDATEs keyed on
/// the current status — when two members race to claim the same request,
/// exactly one wins and the other receives `IllegalState`.
pub struct HelpRequestService;

impl HelpRequestService {
    pub async fn create(
        pool: &PgPool,
        group_id: Uuid,
        requester_id: Uuid,
        req: &CreateHelpRequestRequest,
    ) -> ApiResult<(HelpRequest, Vec<NotificationIntent>)> {
        let description = validation::help_request_description(&req.description)?;
        if req.estimated_duration_seconds <= 0 {
            return Err(ApiError::InvalidInput("예상 시간을 입력해 주세요".into()));
        }
        GroupService::require_active_member(pool, group_id, requester_id).await?;

        let request = sqlx::query_as::<_, HelpRequest>(
            "INSERT INTO help_requests
                (group_id, requester_id, description, estimated_duration_seconds, needed_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(group_id)
        .bind(requester_id)
        .bind(&description)
        .bind(req.estimated_duration_seconds)
        .bind(req.needed_by)
        .fetch_one(pool)
        .await?;

        GroupService::touch_activity(pool, group_id).await?;

        // Every other active member hears about the ask.
        let requester_name = Self::nickname(pool, requester_id).await?;
        let member_ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM group_memberships
             WHERE group_id = $1 AND is_active = TRUE AND user_id <> $2",
        )
        .bind(group_id)
        .bind(requester_id)
        .fetch_all(pool)
        .await?;

        let intents = member_ids
            .into_iter()
            .map(|member_id| NotificationIntent {
                recipient_user_id: member_id,
                kind: NotificationKind::HelpRequest,
                title: "도움 요청".into(),
                body: format!("{requester_name}님이 도움이 필요해요\n시간을 나눠볼까요? 🤝"),
                related_entity_type: "HelpRequest".into(),
                related_entity_id: request.id,
            })
            .collect();

        Ok((request, intents))
    }

    pub async fn claim(
        pool: &PgPool,
        request_id: Uuid,
        claimant_id: Uuid,
    ) -> ApiResult<(HelpRequest, Vec<NotificationIntent>)> {
        let request = Self::fetch(pool, request_id).await?;
        GroupService::require_active_member(pool, request.group_id, claimant_id).await?;
        claim_preconditions(&request, claimant_id)?;

        // First successful claim wins; a concurrent claimant finds zero rows.
        let updated = sqlx::query_as::<_, HelpRequest>(
            "UPDATE help_requests
             SET status = 'claimed', claimed_by = $2, claimed_at = now(), updated_at = now()
             WHERE id = $1 AND status = 'open'
             RETURNING *",
        )
        .bind(request_id)
        .bind(claimant_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::IllegalState("이미 다른 분이 도와주기로 했습니다".into()))?;

        let claimant_name = Self::nickname(pool, claimant_id).await?;
        let intents = vec![NotificationIntent {
            recipient_user_id: updated.requester_id,
            kind: NotificationKind::HelpClaimed,
            title: "도움 확정".into(),
            body: format!("{claimant_name}님이 도와주기로 했어요 💛"),
            related_entity_type: "HelpRequest".into(),
            related_entity_id: updated.id,
        }];

        Ok((updated, intents))
    }

    /// Links the resulting share (created separately via the share lifecycle)
    /// to a claimed request. The caller composes createShare → complete; this
    /// never auto-creates the share, and the share must already exist so the
    /// reference cannot dangle.
    pub async fn complete(
        pool: &PgPool,
        request_id: Uuid,
        acting_user: Uuid,
        resulting_share_id: Uuid,
    ) -> ApiResult<HelpRequest> {
        let request = Self::fetch(pool, request_id).await?;
        GroupService::require_active_member(pool, request.group_id, acting_user).await?;

        let share = ShareService::fetch(pool, resulting_share_id).await?;
        if share.group_id != request.group_id {
            return Err(ApiError::InvalidInput(
                "다른 그룹의 나눔 기록입니다".into(),
            ));
        }

        let updated = sqlx::query_as::<_, HelpRequest>(
            "UPDATE help_requests
             SET status = 'completed', completed_at = now(), resulting_share_id = $2,
                 updated_at = now()
             WHERE id = $1 AND status = 'claimed'
             RETURNING *",
        )
        .bind(request_id)
        .bind(resulting_share_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::IllegalState("완료할 수 없는 요청입니다".into()))?;

        Ok(updated)
    }

    /// Only an unclaimed request can be cancelled; once someone committed to
    /// help there is no unclaim path.
    pub async fn cancel(pool: &PgPool, request_id: Uuid, acting_user: Uuid) -> ApiResult<HelpRequest> {
        let request = Self::fetch(pool, request_id).await?;
        cancel_preconditions(&request, acting_user)?;

        let updated = sqlx::query_as::<_, HelpRequest>(
            "UPDATE help_requests
             SET status = 'cancelled', updated_at = now()
             WHERE id = $1 AND status = 'open'
             RETURNING *",
        )
        .bind(request_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::IllegalState("취소할 수 없는 요청입니다".into()))?;

        Ok(updated)
    }

    pub async fn list_for_group(
        pool: &PgPool,
        group_id: Uuid,
        user_id: Uuid,
    ) -> ApiResult<Vec<HelpRequest>> {
        GroupService::require_active_member(pool, group_id, user_id).await?;
        let requests = sqlx::query_as::<_, HelpRequest>(
            "SELECT * FROM help_requests
             WHERE group_id = $1
             ORDER BY created_at DESC",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;
        Ok(requests)
    }

    pub async fn fetch(pool: &PgPool, request_id: Uuid) -> ApiResult<HelpRequest> {
        sqlx::query_as::<_, HelpRequest>("SELECT * FROM help_requests WHERE id = $1")
            .bind(request_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("도움 요청을 찾을 수 없습니다".into()))
    }

    async fn nickname(pool: &PgPool, user_id: Uuid) -> ApiResult<String> {
        let nickname: Option<String> = sqlx::query_scalar("SELECT nickname FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(nickname.unwrap_or_else(|| "누군가".into()))
    }
}

/// The legality table for help request transitions, independent of storage.
/// The precondition gates consult it; the SQL CAS enforces the same table
/// under concurrency.
pub fn can_transition(from: HelpRequestStatus, to: HelpRequestStatus) -> bool {
    use HelpRequestStatus::*;
    matches!(
        (from, to),
        (Open, Claimed) | (Claimed, Completed) | (Open, Cancelled)
    )
}

/// A member cannot claim their own request, and only an open request can be
/// claimed. A late claimant gets the same error the CAS would hand a
/// concurrent one.
fn claim_preconditions(request: &HelpRequest, claimant: Uuid) -> ApiResult<()> {
    if request.requester_id == claimant {
        return Err(ApiError::InvalidInput(
            "본인의 요청은 맡을 수 없습니다".into(),
        ));
    }
    let status: HelpRequestStatus = request.status.parse()?;
    if !can_transition(status, HelpRequestStatus::Claimed) {
        return Err(ApiError::IllegalState(
            "이미 다른 분이 도와주기로 했습니다".into(),
        ));
    }
    Ok(())
}

/// Only the requester may cancel, and only while the request is still open.
fn cancel_preconditions(request: &HelpRequest, acting_user: Uuid) -> ApiResult<()> {
    if request.requester_id != acting_user {
        return Err(ApiError::Unauthorized(
            "요청한 분만 취소할 수 있습니다".into(),
        ));
    }
    let status: HelpRequestStatus = request.status.parse()?;
    if !can_transition(status, HelpRequestStatus::Cancelled) {
        return Err(ApiError::IllegalState("취소할 수 없는 요청입니다".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use HelpRequestStatus::*;

    fn open_request(requester: Uuid) -> HelpRequest {
        let now = Utc::now();
        HelpRequest {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            requester_id: requester,
            description: "내일 아이 하원 부탁해요".into(),
            estimated_duration_seconds: 7_200,
            needed_by: None,
            status: Open.to_string(),
            claimed_by: None,
            claimed_at: None,
            completed_at: None,
            resulting_share_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn legal_transitions_only() {
        assert!(can_transition(Open, Claimed));
        assert!(can_transition(Claimed, Completed));
        assert!(can_transition(Open, Cancelled));

        // Claimed requests cannot be cancelled or reopened.
        assert!(!can_transition(Claimed, Cancelled));
        assert!(!can_transition(Claimed, Open));
        // Terminal states stay terminal.
        assert!(!can_transition(Completed, Open));
        assert!(!can_transition(Completed, Claimed));
        assert!(!can_transition(Cancelled, Open));
        assert!(!can_transition(Cancelled, Claimed));
        // No self-loops.
        assert!(!can_transition(Open, Open));
        assert!(!can_transition(Claimed, Claimed));
    }

    #[test]
    fn second_claim_loses() {
        let requester = Uuid::new_v4();
        let (winner, loser) = (Uuid::new_v4(), Uuid::new_v4());
        let mut request = open_request(requester);

        assert!(claim_preconditions(&request, winner).is_ok());
        request.status = Claimed.to_string();
        request.claimed_by = Some(winner);

        // The loser arrives after the claim lands: IllegalState, and the
        // winner stays recorded.
        assert!(matches!(
            claim_preconditions(&request, loser),
            Err(ApiError::IllegalState(_))
        ));
        assert_eq!(request.claimed_by, Some(winner));
        assert_eq!(request.status, Claimed.to_string());
    }

    #[test]
    fn requester_cannot_claim_own_request() {
        let requester = Uuid::new_v4();
        let request = open_request(requester);

        assert!(matches!(
            claim_preconditions(&request, requester),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn cancel_only_by_requester_while_open() {
        let requester = Uuid::new_v4();
        let helper = Uuid::new_v4();
        let mut request = open_request(requester);

        assert!(matches!(
            cancel_preconditions(&request, helper),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(cancel_preconditions(&request, requester).is_ok());

        // Once someone committed to help there is no unclaim path.
        request.status = Claimed.to_string();
        request.claimed_by = Some(helper);
        assert!(matches!(
            cancel_preconditions(&request, requester),
            Err(ApiError::IllegalState(_))
        ));
    }
}
