use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, patch, post},
};
use tower_http::cors::CorsLayer;

use super::AppState;
use super::handlers::{gateway, n8n, ollama, providers, settings, status};

/// Dashboard dev server origin plus same-host access.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://127.0.0.1:3000",
        "http://localhost:3000",
    ]
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

pub fn build_api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(status::overall_status))
        .route("/api/agents", get(status::agents))
        .route("/api/providers/health", get(providers::health))
        .route("/api/providers/ollama/models", get(providers::ollama_models))
        .route("/api/n8n/status", get(n8n::status))
        .route("/api/n8n/workflows", get(n8n::list_workflows))
        .route("/api/n8n/workflows/{id}", get(n8n::get_workflow))
        .route("/api/n8n/workflows/{id}/activate", patch(n8n::activate_workflow))
        .route("/api/n8n/workflows/{id}/deactivate", patch(n8n::deactivate_workflow))
        .route("/api/n8n/workflows/{id}/run", post(n8n::run_workflow))
        .route("/api/n8n/executions", get(n8n::list_executions))
        .route("/api/n8n/executions/{id}", get(n8n::get_execution))
        .route("/api/ollama/models", get(ollama::list_models))
        .route("/api/ollama/generate", post(ollama::generate))
        .route("/api/ollama/chat", post(ollama::chat))
        .route("/api/gateway/status", get(gateway::status))
        .route("/api/gateway/sessions", get(gateway::sessions))
        .route("/api/gateway/chat", post(gateway::chat))
        .route(
            "/api/settings",
            get(settings::get_settings).post(settings::save_settings),
        )
        .route("/api/settings/test/{provider}", post(settings::test_provider))
        .layer(build_localhost_cors())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use crate::services::SERVICES;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    /// State whose config points every service at a dead port so no test
    /// depends on what happens to be listening on this machine.
    async fn test_state(dir: &tempfile::TempDir) -> AppState {
        let store = ConfigStore::open(dir.path().join("opsdeck.env"));
        let updates: HashMap<String, String> = SERVICES
            .iter()
            .map(|def| (def.url_key.to_string(), "http://127.0.0.1:9".to_string()))
            .collect();
        store.write(updates).await.unwrap();
        AppState {
            config: Arc::new(store),
            http: reqwest::Client::new(),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn settings_round_trip_masks_secrets_and_keeps_urls_plain() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;
        let app = build_api_router(state);

        let save = json_request(
            "POST",
            "/api/settings",
            json!({
                "ANTHROPIC_API_KEY": "sk-ant-0123456789",
                "COMFYUI_BASE_URL": "http://gpu-box:8188",
            }),
        );
        let response = app.clone().oneshot(save).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["updated"], 2);

        let response = app
            .oneshot(Request::get("/api/settings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["hasValues"], true);
        assert_eq!(body["settings"]["ANTHROPIC_API_KEY"], "sk-ant***6789");
        assert_eq!(body["settings"]["COMFYUI_BASE_URL"], "http://gpu-box:8188");
    }

    #[tokio::test]
    async fn saving_a_masked_echo_is_counted_as_zero_updates() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;
        let config = state.config.clone();
        config
            .write(HashMap::from([(
                "N8N_API_KEY".to_string(),
                "n8n_api_0123456789".to_string(),
            )]))
            .await
            .unwrap();
        let app = build_api_router(state);

        let save = json_request(
            "POST",
            "/api/settings",
            json!({ "N8N_API_KEY": "n8n_ap***6789", "UNSET": "" }),
        );
        let response = app.oneshot(save).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["updated"], 0);
        assert_eq!(
            config.get("N8N_API_KEY").await.unwrap(),
            "n8n_api_0123456789"
        );
    }

    #[tokio::test]
    async fn provider_test_endpoint_handles_unknown_ids() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_api_router(test_state(&dir).await);

        let response = app
            .oneshot(
                Request::post("/api/settings/test/betamax")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "No test available for betamax");
    }

    #[tokio::test]
    async fn overall_status_lists_every_core_service_with_its_url() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_api_router(test_state(&dir).await);

        let response = app
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let services = body["services"].as_object().unwrap();
        assert_eq!(
            services.len(),
            crate::services::STATUS_SERVICE_IDS.len()
        );
        for (_, entry) in services {
            assert_eq!(entry["status"], "offline");
            assert_eq!(entry["url"], "http://127.0.0.1:9");
        }
    }

    #[tokio::test]
    async fn n8n_executions_fold_unreachable_engine_into_empty_listing() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_api_router(test_state(&dir).await);

        let response = app
            .oneshot(
                Request::get("/api/n8n/executions?limit=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["total"], 0);
        assert_eq!(body["executions"], json!([]));
    }

    #[tokio::test]
    async fn providers_health_is_complete_even_when_all_probes_fail() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_api_router(test_state(&dir).await);

        let response = app
            .oneshot(
                Request::get("/api/providers/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let providers = body["providers"].as_object().unwrap();
        assert_eq!(providers.len(), SERVICES.len());
        for def in SERVICES {
            assert_eq!(providers[def.id]["status"], "offline");
        }
    }
}
