use axum::{extract::State, Json};

use crate::{
    error::ApiResult,
    models::{
        auth::AuthenticatedUser,
        user::{UpdateProfileRequest, UserProfile},
    },
    services::auth::AuthService,
    AppState,
};

pub async fn update_me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserProfile>> {
    let profile = AuthService::update_profile(&state.db, user.user_id, &body).await?;
    Ok(Json(profile))
}
