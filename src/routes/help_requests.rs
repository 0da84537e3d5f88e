use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::ApiResult,
    models::{
        auth::AuthenticatedUser,
        help_request::{CompleteHelpRequestRequest, CreateHelpRequestRequest, HelpRequest},
    },
    services::{activity, help_requests::HelpRequestService, metrics},
    AppState,
};

pub async fn list_help_requests(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Json<Vec<HelpRequest>>> {
    let requests = HelpRequestService::list_for_group(&state.db, group_id, user.user_id).await?;
    Ok(Json(requests))
}

pub async fn create_help_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(group_id): Path<Uuid>,
    Json(body): Json<CreateHelpRequestRequest>,
) -> ApiResult<(StatusCode, Json<HelpRequest>)> {
    let (request, intents) =
        HelpRequestService::create(&state.db, group_id, user.user_id, &body).await?;
    state.notifications.dispatch_all(&state.db, intents).await?;
    metrics::HELP_REQUESTS_CREATED.inc();

    activity::log(
        state.db.clone(),
        activity::ActivityEntry {
            user_id: user.user_id,
            action: "help_request.create".into(),
            entity_type: Some("HelpRequest".into()),
            entity_id: Some(request.id),
            device_info: None,
        },
    );
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn claim_help_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<HelpRequest>> {
    let (request, intents) = HelpRequestService::claim(&state.db, id, user.user_id).await?;
    state.notifications.dispatch_all(&state.db, intents).await?;
    metrics::HELP_REQUESTS_CLAIMED.inc();

    activity::log(
        state.db.clone(),
        activity::ActivityEntry {
            user_id: user.user_id,
            action: "help_request.claim".into(),
            entity_type: Some("HelpRequest".into()),
            entity_id: Some(request.id),
            device_info: None,
        },
    );
    Ok(Json(request))
}

/// The caller records the resulting share first (POST /groups/{id}/shares,
/// claimant as giver, requester as receiver), then completes the request
/// with that share's id.
pub async fn complete_help_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CompleteHelpRequestRequest>,
) -> ApiResult<Json<HelpRequest>> {
    let request =
        HelpRequestService::complete(&state.db, id, user.user_id, body.resulting_share_id).await?;

    activity::log(
        state.db.clone(),
        activity::ActivityEntry {
            user_id: user.user_id,
            action: "help_request.complete".into(),
            entity_type: Some("HelpRequest".into()),
            entity_id: Some(request.id),
            device_info: None,
        },
    );
    Ok(Json(request))
}

pub async fn cancel_help_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<HelpRequest>> {
    let request = HelpRequestService::cancel(&state.db, id, user.user_id).await?;

    activity::log(
        state.db.clone(),
        activity::ActivityEntry {
            user_id: user.user_id,
            action: "help_request.cancel".into(),
            entity_type: Some("HelpRequest".into()),
            entity_id: Some(request.id),
            device_info: None,
        },
    );
    Ok(Json(request))
}
