use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{auth::AuthenticatedUser, notification::Notification},
    services::notifications::NotificationService,
    AppState,
};

#[derive(Deserialize)]
pub struct NotificationQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<NotificationQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    let limit = params.limit.unwrap_or(50).min(200);
    let notifications = NotificationService::list(
        &state.db,
        user.user_id,
        params.unread_only.unwrap_or(false),
        limit,
    )
    .await?;
    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let updated = NotificationService::mark_read(&state.db, user.user_id, id).await?;
    if !updated {
        return Err(ApiError::NotFound("알림을 찾을 수 없습니다".into()));
    }
    Ok(Json(json!({ "message": "Notification marked read" })))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Value>> {
    let count = NotificationService::mark_all_read(&state.db, user.user_id).await?;
    Ok(Json(json!({ "marked_read": count })))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let deleted = NotificationService::delete(&state.db, user.user_id, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("알림을 찾을 수 없습니다".into()));
    }
    Ok(Json(json!({ "message": "Notification deleted" })))
}
