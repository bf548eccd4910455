use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{Value, json};

use super::super::AppState;
use crate::services::health::aggregate_all;
use crate::upstream::ollama::OllamaClient;

/// GET /api/providers/health: the full fleet snapshot, one entry per
/// registered service regardless of how many are down.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let snapshot = aggregate_all(&state.http, &state.config).await;
    let providers: serde_json::Map<String, Value> = snapshot
        .services
        .iter()
        .map(|(id, probe)| {
            (
                id.clone(),
                json!({
                    "id": id,
                    "status": probe.status_str(),
                    "data": probe.data,
                }),
            )
        })
        .collect();
    Json(json!({
        "timestamp": snapshot.timestamp,
        "providers": providers,
    }))
}

/// GET /api/providers/ollama/models: raw tag listing passthrough.
pub async fn ollama_models(State(state): State<AppState>) -> impl IntoResponse {
    let client = OllamaClient::from_config(state.http.clone(), &state.config).await;
    match client.raw_tags().await {
        Ok(body) => Json(body).into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Ollama offline", "models": [] })),
        )
            .into_response(),
    }
}
