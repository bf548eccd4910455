use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::super::AppState;
use crate::config::sanitize_updates;
use crate::services::testing::run_test;

/// GET /api/settings: full document with secrets masked.
pub async fn get_settings(State(state): State<AppState>) -> Json<serde_json::Value> {
    let masked = state.config.masked_view().await;
    let has_values = !masked.is_empty();
    Json(json!({ "settings": masked, "hasValues": has_values }))
}

/// POST /api/settings: merge-and-persist. Empty values and masked echoes
/// are dropped before the merge; a persistence failure is a hard 500
/// because silently losing a settings save is unacceptable.
pub async fn save_settings(
    State(state): State<AppState>,
    Json(submitted): Json<HashMap<String, String>>,
) -> impl IntoResponse {
    let updates = sanitize_updates(submitted);
    let count = updates.len();
    match state.config.write(updates).await {
        Ok(_) => {
            info!("Settings updated ({count} value(s))");
            Json(json!({ "success": true, "updated": count })).into_response()
        }
        Err(e) => {
            error!("Failed to persist settings: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct TestRequest {
    key: Option<String>,
}

/// POST /api/settings/test/{provider}: optional `{"key": ...}` override
/// so a credential can be verified before saving it.
pub async fn test_provider(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    body: Option<Json<TestRequest>>,
) -> Json<serde_json::Value> {
    let supplied_key = body.and_then(|Json(b)| b.key).filter(|k| !k.is_empty());
    let verdict = run_test(&state.http, &state.config, &provider, supplied_key).await;
    Json(json!({ "success": verdict.success, "message": verdict.message }))
}
