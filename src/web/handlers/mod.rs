pub mod gateway;
pub mod n8n;
pub mod ollama;
pub mod providers;
pub mod settings;
pub mod status;

use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::upstream::UpstreamError;

/// Map an upstream failure onto our response: the upstream's own status
/// code when it answered, 503 when it could not be reached at all.
pub(crate) fn upstream_error(e: UpstreamError) -> (StatusCode, Json<Value>) {
    match e {
        UpstreamError::Status { status, message } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(json!({ "error": message })),
        ),
        UpstreamError::Unreachable(message) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": message })),
        ),
    }
}
