use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{Value, json};

use super::super::AppState;
use super::upstream_error;
use crate::upstream::ollama::OllamaClient;

async fn client(state: &AppState) -> OllamaClient {
    OllamaClient::from_config(state.http.clone(), &state.config).await
}

/// GET /api/ollama/models: normalized model listing.
pub async fn list_models(State(state): State<AppState>) -> impl IntoResponse {
    match client(&state).await.list_models().await {
        Ok(models) => Json(json!({
            "total": models.len(),
            "models": models,
            "status": "online",
        }))
        .into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "models": [], "total": 0, "status": "offline" })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    model: Option<String>,
    prompt: String,
}

/// POST /api/ollama/generate: forwarded with the long generation budget.
pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> impl IntoResponse {
    match client(&state)
        .await
        .generate(payload.model, &payload.prompt)
        .await
    {
        Ok(reply) => Json(json!({ "response": reply.response, "model": reply.model }))
            .into_response(),
        Err(e) => upstream_error(e).into_response(),
    }
}

#[derive(Deserialize)]
pub struct ChatRequest {
    model: Option<String>,
    messages: Value,
}

/// POST /api/ollama/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> impl IntoResponse {
    match client(&state)
        .await
        .chat(payload.model, payload.messages)
        .await
    {
        Ok(reply) => {
            Json(json!({ "message": reply.message, "model": reply.model })).into_response()
        }
        Err(e) => upstream_error(e).into_response(),
    }
}
