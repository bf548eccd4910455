use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use super::super::AppState;
use super::upstream_error;
use crate::services;
use crate::services::probe::probe_service;
use crate::upstream::gateway::GatewayClient;

/// GET /api/gateway/status: any HTTP answer counts as online.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let def = services::service("gateway").expect("gateway is registered");
    let url = state.config.get_or(def.url_key, def.default_url).await;
    let probe = probe_service(&state.http, def, &url).await;
    if probe.reachable {
        Json(json!({ "status": "online", "url": url })).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "offline", "url": url })),
        )
            .into_response()
    }
}

/// GET /api/gateway/sessions: active agent sessions, passed through.
pub async fn sessions(State(state): State<AppState>) -> impl IntoResponse {
    let client = GatewayClient::from_config(state.http.clone(), &state.config).await;
    match client.sessions().await {
        Ok(body) => Json(body).into_response(),
        Err(e) => upstream_error(e).into_response(),
    }
}

#[derive(Deserialize)]
pub struct GatewayChatRequest {
    message: String,
    model: Option<String>,
    system: Option<String>,
}

/// POST /api/gateway/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<GatewayChatRequest>,
) -> impl IntoResponse {
    let client = GatewayClient::from_config(state.http.clone(), &state.config).await;
    match client
        .chat(&payload.message, payload.model, payload.system)
        .await
    {
        Ok(body) => Json(body).into_response(),
        Err(e) => upstream_error(e).into_response(),
    }
}
