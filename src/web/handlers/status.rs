use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use super::super::AppState;
use crate::services::health::{HealthSnapshot, aggregate_all, status_summary};
use crate::upstream::gateway::{DEFAULT_MODEL as GATEWAY_MODEL, DEFAULT_MODEL_KEY};

/// GET /api/status: settle-state of the core services plus their URLs.
pub async fn overall_status(State(state): State<AppState>) -> Json<Value> {
    let services = status_summary(&state.http, &state.config).await;
    Json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "services": services,
    }))
}

/// GET /api/agents: dashboard agent cards derived from live probes.
pub async fn agents(State(state): State<AppState>) -> Json<Value> {
    let snapshot = aggregate_all(&state.http, &state.config).await;
    let gateway_model = state.config.get_or(DEFAULT_MODEL_KEY, GATEWAY_MODEL).await;

    let cards = json!([
        card(&snapshot, "gateway", "Claude Gateway", "local/gateway", &gateway_model, 18789,
            "Main AI brain for intent parsing, routing and content generation"),
        card(&snapshot, "ollama", "Ollama (Local LLM)", "local/ollama",
            &ollama_models(&snapshot), 11434,
            "Local LLM server for captions, scripts and research summaries"),
        card(&snapshot, "comfyui", "ComfyUI (Image Gen)", "local/comfyui",
            "SDXL / InstantID", 8188,
            "Node-based image generation with face consistency"),
        card(&snapshot, "automatic1111", "Automatic1111 (Image Gen)", "local/automatic1111",
            "SDXL", 7860, "Stable Diffusion WebUI with API"),
        card(&snapshot, "wan2", "Wan2.1 (Video Gen)", "local/wan2",
            "wan2.1-14b", 8085, "Local video generation"),
        card(&snapshot, "lmstudio", "LM Studio", "local/lmstudio",
            &lmstudio_model(&snapshot), 1234, "GUI-managed local LLM server"),
        card(&snapshot, "n8n", "n8n Automation", "n8n",
            "workflow engine", 5678, "Workflow orchestration connecting all services"),
    ]);

    Json(json!({ "agents": cards }))
}

fn card(
    snapshot: &HealthSnapshot,
    id: &str,
    name: &str,
    provider: &str,
    model: &str,
    port: u16,
    description: &str,
) -> Value {
    let online = snapshot
        .services
        .get(id)
        .map(|p| p.reachable)
        .unwrap_or(false);
    json!({
        "id": id,
        "name": name,
        "status": if online { "active" } else { "offline" },
        "provider": provider,
        "model": model,
        "port": port,
        "description": description,
    })
}

/// Comma-joined loaded model names, or a placeholder when none/offline.
fn ollama_models(snapshot: &HealthSnapshot) -> String {
    let entry = match snapshot.services.get("ollama") {
        Some(p) if p.reachable => p,
        _ => return "offline".to_string(),
    };
    let names: Vec<&str> = entry
        .data
        .as_ref()
        .and_then(|d| d.get("models")?.as_array())
        .map(|models| models.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if names.is_empty() {
        "no models".to_string()
    } else {
        names.join(", ")
    }
}

fn lmstudio_model(snapshot: &HealthSnapshot) -> String {
    let entry = match snapshot.services.get("lmstudio") {
        Some(p) if p.reachable => p,
        _ => return "offline".to_string(),
    };
    entry
        .data
        .as_ref()
        .and_then(|d| d.get("models")?.as_array()?.first()?.as_str())
        .unwrap_or("loaded")
        .to_string()
}
