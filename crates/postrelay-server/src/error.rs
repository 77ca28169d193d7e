//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use postrelay_core::CoreError;
use serde_json::json;
use thiserror::Error;

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned to HTTP callers as `{"error": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body is not a valid request
    #[error("{0}")]
    BadRequest(String),

    /// No route for this endpoint
    #[error("endpoint not found: /{0}")]
    NotFound(String),

    /// Relay failure
    #[error(transparent)]
    Relay(#[from] CoreError),

    /// Anything else
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Relay(CoreError::InvalidRequest(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Relay(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
