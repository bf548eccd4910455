use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{Value, json};

use super::super::AppState;
use super::upstream_error;
use crate::services;
use crate::services::probe::probe_service;
use crate::upstream::n8n::{DEFAULT_EXECUTION_LIMIT, N8nClient};

async fn client(state: &AppState) -> N8nClient {
    N8nClient::from_config(state.http.clone(), &state.config).await
}

/// GET /api/n8n/status
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let def = services::service("n8n").expect("n8n is registered");
    let url = state.config.get_or(def.url_key, def.default_url).await;
    let probe = probe_service(&state.http, def, &url).await;
    let body = json!({ "status": probe.status_str(), "url": url });
    if probe.reachable {
        Json(body).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    }
}

/// GET /api/n8n/workflows
pub async fn list_workflows(State(state): State<AppState>) -> impl IntoResponse {
    match client(&state).await.list_workflows().await {
        Ok(workflows) => Json(json!({
            "total": workflows.len(),
            "workflows": workflows,
        }))
        .into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "n8n unreachable or API key missing",
                "workflows": [],
                "total": 0,
            })),
        )
            .into_response(),
    }
}

/// GET /api/n8n/workflows/{id}: native object passthrough.
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match client(&state).await.get_workflow(&id).await {
        Ok(workflow) => Json(workflow).into_response(),
        Err(e) => upstream_error(e).into_response(),
    }
}

/// PATCH /api/n8n/workflows/{id}/activate
pub async fn activate_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    set_active(state, id, true).await
}

/// PATCH /api/n8n/workflows/{id}/deactivate
pub async fn deactivate_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    set_active(state, id, false).await
}

async fn set_active(state: AppState, id: String, active: bool) -> axum::response::Response {
    match client(&state).await.set_active(&id, active).await {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(e) => upstream_error(e).into_response(),
    }
}

/// POST /api/n8n/workflows/{id}/run: optional body forwarded as-is.
pub async fn run_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> impl IntoResponse {
    let payload = body.map(|Json(v)| v);
    match client(&state).await.run_workflow(&id, payload).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => upstream_error(e).into_response(),
    }
}

#[derive(Deserialize)]
pub struct ExecutionsQuery {
    limit: Option<u32>,
}

/// GET /api/n8n/executions?limit=N
pub async fn list_executions(
    State(state): State<AppState>,
    Query(query): Query<ExecutionsQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_EXECUTION_LIMIT);
    match client(&state).await.list_executions(limit).await {
        Ok(executions) => Json(json!({
            "total": executions.len(),
            "executions": executions,
        }))
        .into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "n8n unreachable",
                "executions": [],
                "total": 0,
            })),
        )
            .into_response(),
    }
}

/// GET /api/n8n/executions/{id}
pub async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match client(&state).await.get_execution(&id).await {
        Ok(execution) => Json(execution).into_response(),
        Err(e) => upstream_error(e).into_response(),
    }
}
