use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::ApiResult,
    models::{activity_log::ActivityLog, auth::AuthenticatedUser},
    services::activity,
    AppState,
};

#[derive(Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

pub async fn list_my_activity(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ActivityQuery>,
) -> ApiResult<Json<Vec<ActivityLog>>> {
    let limit = params.limit.unwrap_or(100).min(500);
    let entries = activity::list_for_user(&state.db, user.user_id, limit).await?;
    Ok(Json(entries))
}

pub async fn clear_my_activity(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Value>> {
    let deleted = activity::clear_for_user(&state.db, user.user_id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
