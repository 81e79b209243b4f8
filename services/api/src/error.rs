//! API error type and its HTTP mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::storage::StorageError;

/// Errors a route handler can surface to the client
#[derive(Error, Debug)]
pub enum ApiError {
    /// No session, or the session is expired
    #[error("authentication required")]
    Unauthorized,

    /// Authenticated but lacking the required permission, or reaching
    /// across the tenant boundary
    #[error("insufficient permissions")]
    Forbidden,

    /// The request itself is invalid
    #[error("{0}")]
    BadRequest(String),

    /// The entity does not exist in the caller's organization
    #[error("{0}")]
    NotFound(String),

    /// The operation collides with existing state (double setup, duplicate
    /// unique value, repeated dismissal)
    #[error("{0}")]
    Conflict(String),

    /// Anything unexpected; the detail stays in the server log
    #[error("internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::AlreadyInitialized => {
                ApiError::Conflict("system is already configured".to_string())
            }
            StorageError::Duplicate(field) => {
                ApiError::Conflict(format!("{field} is already in use"))
            }
            StorageError::AlreadyDismissed => {
                ApiError::Conflict("employee is already dismissed".to_string())
            }
            StorageError::Database(e) => {
                error!("storage failure: {e}");
                ApiError::Internal
            }
        }
    }
}

/// Result alias for route handlers
pub type ApiResult<T> = Result<T, ApiError>;
