// Error handling for the hackathon API
// Single taxonomy mapped onto the {status, error} response envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use tracing::{debug, error, warn};

/// Message shown for every 500-class failure. Internal details are logged,
/// never sent to the client.
pub const INTERNAL_ERROR_MESSAGE: &str = "Whoops! Something went wrong!";

/// Main error type for the API
/// All handlers and services return Result<T, ApiError>.
///
/// Every failure surfaces as `{status, error}` where `error` is a plain
/// string message, so each variant carries the exact client-facing text
/// (except `Internal`, which is sanitized).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Malformed or missing request data, business-rule violations
    /// Maps to HTTP 400 Bad Request
    BadRequest(String),

    /// Missing/invalid credentials, insufficient role, bad reset token
    /// Maps to HTTP 401 Unauthorized
    Unauthorized(String),

    /// Unexpected failures (store connectivity, hashing, signing)
    /// Maps to HTTP 500 Internal Server Error; details never leave the server
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Safe to send: internal details are replaced
    /// by a generic message.
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) => msg,
            ApiError::Internal(_) => INTERNAL_ERROR_MESSAGE,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            // Expected client errors, logged quietly
            ApiError::BadRequest(msg) => debug!("Bad request: {}", msg),
            ApiError::Unauthorized(msg) => warn!("Unauthorized: {}", msg),
            // Full detail stays in the logs
            ApiError::Internal(msg) => error!("Unhandled exception: {}", msg),
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "error": self.message(),
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::Internal(error.to_string())
    }
}
