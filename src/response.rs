// Success envelope shared by every handler

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

/// Wraps a handler result as `{status: 200, response: ...}`.
///
/// The error half of the envelope lives in [`crate::error::ApiError`].
pub struct Success<T>(pub T);

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        Json(json!({
            "status": 200,
            "response": self.0,
        }))
        .into_response()
    }
}
