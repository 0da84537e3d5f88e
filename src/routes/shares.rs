use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::ApiResult,
    models::{
        auth::AuthenticatedUser,
        share::{ConfirmShareRequest, CreateShareRequest, Share},
    },
    services::{activity, metrics, shares::ShareService},
    AppState,
};

pub async fn list_shares(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Share>>> {
    let shares = ShareService::list_for_group(&state.db, group_id, user.user_id).await?;
    Ok(Json(shares))
}

pub async fn create_share(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(group_id): Path<Uuid>,
    Json(body): Json<CreateShareRequest>,
) -> ApiResult<(StatusCode, Json<Share>)> {
    let (share, intents) = ShareService::create(&state.db, group_id, user.user_id, &body).await?;
    state.notifications.dispatch_all(&state.db, intents).await?;
    metrics::SHARES_CREATED.inc();

    activity::log(
        state.db.clone(),
        activity::ActivityEntry {
            user_id: user.user_id,
            action: "share.create".into(),
            entity_type: Some("Share".into()),
            entity_id: Some(share.id),
            device_info: None,
        },
    );
    Ok((StatusCode::CREATED, Json(share)))
}

pub async fn confirm_share(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ConfirmShareRequest>,
) -> ApiResult<Json<Share>> {
    let (share, intents) =
        ShareService::confirm(&state.db, id, user.user_id, body.thank_you_note.as_deref()).await?;
    state.notifications.dispatch_all(&state.db, intents).await?;
    metrics::SHARES_CONFIRMED.inc();

    activity::log(
        state.db.clone(),
        activity::ActivityEntry {
            user_id: user.user_id,
            action: "share.confirm".into(),
            entity_type: Some("Share".into()),
            entity_id: Some(share.id),
            device_info: None,
        },
    );
    Ok(Json(share))
}

pub async fn dispute_share(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Share>> {
    let share = ShareService::dispute(&state.db, id, user.user_id).await?;
    metrics::SHARES_DISPUTED.inc();

    activity::log(
        state.db.clone(),
        activity::ActivityEntry {
            user_id: user.user_id,
            action: "share.dispute".into(),
            entity_type: Some("Share".into()),
            entity_id: Some(share.id),
            device_info: None,
        },
    );
    Ok(Json(share))
}

pub async fn delete_share(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    ShareService::soft_delete(&state.db, id, user.user_id).await?;

    activity::log(
        state.db.clone(),
        activity::ActivityEntry {
            user_id: user.user_id,
            action: "share.delete".into(),
            entity_type: Some("Share".into()),
            entity_id: Some(id),
            device_info: None,
        },
    );
    Ok(Json(json!({ "message": "Share deleted" })))
}
