//! HTTP route handlers.

pub mod health;
pub mod review;
pub mod search;
pub mod servers;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// JSON `{error}` body with a non-200 status.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}
