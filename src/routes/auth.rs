use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{
    error::ApiResult,
    models::{
        auth::AuthenticatedUser,
        user::{LoginRequest, LoginResponse, RefreshTokenRequest, RegisterPushTokenRequest, UserProfile},
    },
    services::{activity, auth::AuthService, notifications::NotificationService},
    AppState,
};

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<(StatusCode, Json<LoginResponse>)> {
    let response = AuthService::login(
        &state.db,
        &body,
        &state.config.jwt_secret,
        &state.config.jwt_refresh_secret,
        state.config.jwt_expiry_seconds,
        state.config.jwt_refresh_expiry_days,
    )
    .await?;

    let status = if response.is_new_user {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    activity::log(
        state.db.clone(),
        activity::ActivityEntry {
            user_id: response.user.id,
            action: if response.is_new_user { "auth.register".into() } else { "auth.login".into() },
            entity_type: None,
            entity_id: None,
            device_info: None,
        },
    );
    Ok((status, Json(response)))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> ApiResult<Json<Value>> {
    let (access_token, refresh_token) = AuthService::refresh(
        &state.db,
        &body.refresh_token,
        &state.config.jwt_secret,
        &state.config.jwt_refresh_secret,
        state.config.jwt_expiry_seconds,
        state.config.jwt_refresh_expiry_days,
    )
    .await?;

    Ok(Json(json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
    })))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<UserProfile>> {
    let profile = AuthService::me(&state.db, user.user_id).await?;
    Ok(Json(profile))
}

pub async fn register_push_token(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<RegisterPushTokenRequest>,
) -> ApiResult<Json<Value>> {
    NotificationService::register_push_token(&state.db, user.user_id, &body.platform, &body.token)
        .await?;
    Ok(Json(json!({ "message": "Push token registered" })))
}
