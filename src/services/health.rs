use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use super::probe::{ProbeResult, probe_service};
use super::{SERVICES, STATUS_SERVICE_IDS, ServiceDef};
use crate::config::SharedConfig;

/// Point-in-time result of probing the whole fleet. Ephemeral: recomputed
/// on every request, never cached or persisted.
#[derive(Debug, Serialize)]
pub struct HealthSnapshot {
    pub timestamp: String,
    pub services: HashMap<String, ProbeResult>,
}

/// One entry of the narrower status-bar view.
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub status: &'static str,
    pub url: String,
}

/// Probe every registered service concurrently and wait for all of them to
/// settle. A dead or slow service degrades its own entry to offline and
/// nothing else; the snapshot always contains every registered id.
pub async fn aggregate_all(client: &reqwest::Client, config: &SharedConfig) -> HealthSnapshot {
    let snapshot = probe_set(client, config, SERVICES.iter()).await;
    HealthSnapshot {
        timestamp: chrono::Utc::now().to_rfc3339(),
        services: snapshot,
    }
}

/// Boolean-only view over the status-bar subset, same reachability
/// semantics as the full snapshot (including the gateway 4xx rule).
pub async fn status_summary(
    client: &reqwest::Client,
    config: &SharedConfig,
) -> HashMap<String, ServiceStatus> {
    let defs = STATUS_SERVICE_IDS.iter().copied().filter_map(super::service);
    let mut urls = HashMap::new();
    for def in defs.clone() {
        urls.insert(def.id, config.get_or(def.url_key, def.default_url).await);
    }
    let probes = probe_set(client, config, defs).await;

    probes
        .into_iter()
        .map(|(id, result)| {
            let url = urls.get(id.as_str()).cloned().unwrap_or_default();
            (
                id,
                ServiceStatus {
                    status: result.status_str(),
                    url,
                },
            )
        })
        .collect()
}

/// Fan out one task per service and join them all. Task failure (a panic
/// inside a probe) is captured as data, not propagated: that single entry
/// reports offline while its siblings complete normally.
async fn probe_set(
    client: &reqwest::Client,
    config: &SharedConfig,
    defs: impl Iterator<Item = &'static ServiceDef>,
) -> HashMap<String, ProbeResult> {
    let mut handles = Vec::new();
    for def in defs {
        let client = client.clone();
        let base = config.get_or(def.url_key, def.default_url).await;
        handles.push((
            def.id,
            tokio::spawn(async move { probe_service(&client, def, &base).await }),
        ));
    }

    let mut results = HashMap::new();
    for (id, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Probe task for {id} failed: {e}");
                ProbeResult::offline(id)
            }
        };
        results.insert(id.to_string(), result);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use crate::services::SERVICES;
    use std::sync::Arc;

    /// Store pointing every service at a port that refuses connections, so
    /// tests never depend on what happens to be running locally.
    async fn dead_fleet_config(dir: &tempfile::TempDir) -> SharedConfig {
        let store = ConfigStore::open(dir.path().join("opsdeck.env"));
        let updates = SERVICES
            .iter()
            .map(|def| (def.url_key.to_string(), "http://127.0.0.1:9".to_string()))
            .collect();
        store.write(updates).await.unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn snapshot_is_complete_under_total_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = dead_fleet_config(&dir).await;
        let client = reqwest::Client::new();

        let snapshot = aggregate_all(&client, &config).await;
        assert_eq!(snapshot.services.len(), SERVICES.len());
        for def in SERVICES {
            let entry = &snapshot.services[def.id];
            assert!(!entry.reachable, "{} should be offline", def.id);
        }
        assert!(!snapshot.timestamp.is_empty());
    }

    #[tokio::test]
    async fn status_summary_reports_configured_urls() {
        let dir = tempfile::tempdir().unwrap();
        let config = dead_fleet_config(&dir).await;
        let client = reqwest::Client::new();

        let summary = status_summary(&client, &config).await;
        assert_eq!(summary.len(), STATUS_SERVICE_IDS.len());
        for id in STATUS_SERVICE_IDS {
            let entry = &summary[*id];
            assert_eq!(entry.status, "offline");
            assert_eq!(entry.url, "http://127.0.0.1:9");
        }
    }

    #[tokio::test]
    async fn one_live_service_does_not_depend_on_dead_siblings() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Healthz endpoint only; everything else in the fleet is dead.
            use axum::routing::get;
            let app = axum::Router::new().route("/healthz", get(|| async { "ok" }));
            axum::serve(listener, app).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let config = dead_fleet_config(&dir).await;
        config
            .write(std::collections::HashMap::from([(
                "N8N_BASE_URL".to_string(),
                format!("http://{addr}"),
            )]))
            .await
            .unwrap();

        let client = reqwest::Client::new();
        let snapshot = aggregate_all(&client, &config).await;
        assert!(snapshot.services["n8n"].reachable);
        assert!(!snapshot.services["ollama"].reachable);
    }
}
