//! Error types for acm-ingest
//!
//! `Error` is what the pipeline and store report to adapters. `ApiError` is
//! the HTTP face of it: shutdown → 503, unknown chunk → 404, timeout → 504.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Pipeline and service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Submission rejected or abandoned because the pipeline was cancelled
    #[error("Pipeline is shutting down")]
    Shutdown,

    /// Lookup found no matching record
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transformation faulted for this one job
    #[error("Transformation failed for chunk {0}")]
    TransformFailed(Uuid),

    /// Result did not arrive within the configured wait
    #[error("No result for chunk {chunk_id} after {waited:?}")]
    Timeout { chunk_id: Uuid, waited: Duration },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// acm-common error
    #[error("Common error: {0}")]
    Common(#[from] acm_common::Error),
}

/// Convenience Result type using acm-ingest Error
pub type Result<T> = std::result::Result<T, Error>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Pipeline not accepting work (503)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Result wait expired (504)
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Shutdown => ApiError::Unavailable(err.to_string()),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Timeout { .. } => ApiError::Timeout(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SHUTTING_DOWN"),
            ApiError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        let message = match self {
            ApiError::NotFound(msg)
            | ApiError::Unavailable(msg)
            | ApiError::Timeout(msg)
            | ApiError::Internal(msg) => msg,
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;
