use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::ApiResult,
    models::{
        auth::AuthenticatedUser,
        group::{BalanceSummaryResponse, CreateGroupRequest, Group, GroupMemberDto, JoinGroupRequest},
    },
    services::{
        activity,
        groups::GroupService,
        ledger::{LedgerService, DEFAULT_BALANCE_THRESHOLD_SECONDS},
        metrics,
    },
    AppState,
};

#[derive(Deserialize)]
pub struct BalanceQuery {
    /// Spread under which the group counts as balanced, default two hours.
    pub threshold_seconds: Option<i64>,
}

pub async fn list_groups(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<Group>>> {
    let groups = GroupService::list_for_user(&state.db, user.user_id).await?;
    Ok(Json(groups))
}

pub async fn create_group(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateGroupRequest>,
) -> ApiResult<(StatusCode, Json<Group>)> {
    let group = GroupService::create(&state.db, user.user_id, &body.name, body.emoji.as_deref()).await?;

    activity::log(
        state.db.clone(),
        activity::ActivityEntry {
            user_id: user.user_id,
            action: "group.create".into(),
            entity_type: Some("Group".into()),
            entity_id: Some(group.id),
            device_info: None,
        },
    );
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn join_group(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<JoinGroupRequest>,
) -> ApiResult<Json<Group>> {
    let group = GroupService::join_by_invite_code(&state.db, user.user_id, &body.invite_code).await?;
    metrics::GROUP_JOINS.inc();

    activity::log(
        state.db.clone(),
        activity::ActivityEntry {
            user_id: user.user_id,
            action: "group.join".into(),
            entity_type: Some("Group".into()),
            entity_id: Some(group.id),
            device_info: None,
        },
    );
    Ok(Json(group))
}

pub async fn get_group(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Group>> {
    let group = GroupService::get(&state.db, id, user.user_id).await?;
    Ok(Json(group))
}

pub async fn list_members(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<GroupMemberDto>>> {
    let members = GroupService::members(&state.db, id, user.user_id).await?;
    Ok(Json(members))
}

pub async fn leave_group(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    GroupService::leave(&state.db, id, user.user_id).await?;
    Ok(Json(json!({ "message": "Left group" })))
}

pub async fn archive_group(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    GroupService::archive(&state.db, id, user.user_id).await?;
    Ok(Json(json!({ "message": "Group archived" })))
}

pub async fn regenerate_invite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Group>> {
    let group = GroupService::regenerate_invite_code(&state.db, id, user.user_id).await?;
    Ok(Json(group))
}

/// Balance view for a group: per-member balances (descending), group total
/// and the balanced flag, all computed by the ledger engine.
pub async fn balance_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(params): Query<BalanceQuery>,
) -> ApiResult<Json<BalanceSummaryResponse>> {
    GroupService::require_active_member(&state.db, id, user.user_id).await?;
    let threshold = params
        .threshold_seconds
        .unwrap_or(DEFAULT_BALANCE_THRESHOLD_SECONDS);
    let summary = LedgerService::summary(&state.db, id, threshold).await?;
    Ok(Json(summary))
}

pub async fn my_balance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    GroupService::require_active_member(&state.db, id, user.user_id).await?;
    let balance = LedgerService::balance(&state.db, id, user.user_id).await?;
    Ok(Json(json!({
        "group_id": id,
        "user_id": user.user_id,
        "balance_seconds": balance,
    })))
}
