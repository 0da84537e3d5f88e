use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error taxonomy surfaced by every service operation.
///
/// Expected business conditions map to the first four variants and are
/// returned, never panicked; `Storage`/`Internal` cover genuinely unexpected
/// failures and are fatal to the operation only.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or out-of-range input. Caller should re-prompt.
    #[error("{0}")]
    InvalidInput(String),

    /// Requested transition is not legal from the entity's current state
    /// ("someone already acted first").
    #[error("{0}")]
    IllegalState(String),

    /// Actor lacks permission for the operation.
    #[error("{0}")]
    Unauthorized(String),

    /// Referenced entity does not resolve.
    #[error("{0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::IllegalState(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
