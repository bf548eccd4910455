use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::ServiceDef;

/// Outcome of one bounded reachability check. Built fresh per probe and
/// folded straight into a snapshot; never cached.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub id: String,
    pub reachable: bool,
    pub timed_out: bool,
    pub data: Option<Value>,
}

impl ProbeResult {
    pub fn offline(id: &str) -> Self {
        Self {
            id: id.to_string(),
            reachable: false,
            timed_out: false,
            data: None,
        }
    }

    pub fn status_str(&self) -> &'static str {
        if self.reachable { "online" } else { "offline" }
    }
}

/// Probe `def`'s health path under `base_url`.
///
/// Never returns an error: transport failures of any kind (refused
/// connection, DNS, timeout, unparseable URL) come back as
/// `reachable: false`. A non-2xx response still counts as online for
/// gateway-style services, because an HTTP answer proves something is
/// listening; for everything else it is offline.
pub async fn probe_service(
    client: &reqwest::Client,
    def: &ServiceDef,
    base_url: &str,
) -> ProbeResult {
    let url = format!("{}{}", base_url.trim_end_matches('/'), def.health_path);
    let request = client
        .get(&url)
        .timeout(Duration::from_millis(def.timeout_ms));

    match request.send().await {
        Ok(resp) if resp.status().is_success() => {
            let data = match def.adapter {
                Some(adapt) => resp.json::<Value>().await.ok().map(|body| adapt(&body)),
                None => None,
            };
            ProbeResult {
                id: def.id.to_string(),
                reachable: true,
                timed_out: false,
                data,
            }
        }
        Ok(_) => ProbeResult {
            id: def.id.to_string(),
            reachable: def.gateway_style,
            timed_out: false,
            data: None,
        },
        Err(e) => ProbeResult {
            id: def.id.to_string(),
            reachable: false,
            timed_out: e.is_timeout(),
            data: None,
        },
    }
}
