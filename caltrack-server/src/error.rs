//! HTTP error responses
//!
//! Two kinds reach the client: a missing record (404) and a failed operation
//! (500). The 500 body carries only a generic message; the cause is logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use caltrack_common::Error;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    /// Referenced id does not exist
    NotFound(&'static str),

    /// Persistence failure or unusable request; the transaction was rolled back
    Failed {
        message: &'static str,
        source: Error,
    },
}

impl ApiError {
    pub fn failed(message: &'static str, source: impl Into<Error>) -> Self {
        ApiError::Failed {
            message,
            source: source.into(),
        }
    }
}

/// Map any error convertible into `caltrack_common::Error` to a 500 response
pub trait OrFail<T> {
    fn or_fail(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T, E: Into<Error>> OrFail<T> for Result<T, E> {
    fn or_fail(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::failed(message, e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Failed { message, source } => {
                if source.is_constraint_violation() {
                    error!("{} (constraint violation): {}", message, source);
                } else {
                    error!("{}: {}", message, source);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
