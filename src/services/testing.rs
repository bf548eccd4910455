//! Per-provider connectivity and credential tests behind the settings page
//! "Test" button. Every failure mode folds into a verdict; nothing here
//! returns an error to the handler.

use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};

use crate::config::SharedConfig;
use crate::services;

const REACH_TIMEOUT: Duration = Duration::from_millis(4000);
const ANTHROPIC_TIMEOUT: Duration = Duration::from_millis(10_000);
const TELEGRAM_TIMEOUT: Duration = Duration::from_millis(8000);

#[derive(Debug, Serialize)]
pub struct TestVerdict {
    pub success: bool,
    pub message: String,
}

impl TestVerdict {
    fn pass(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Run the provider-specific aliveness/credential check. `supplied_key`
/// overrides the stored credential for the cloud providers so a key can be
/// tested before it is saved.
pub async fn run_test(
    client: &reqwest::Client,
    config: &SharedConfig,
    provider: &str,
    supplied_key: Option<String>,
) -> TestVerdict {
    match provider {
        "n8n" => reach_check(client, config, "n8n", "n8n is reachable").await,
        "comfyui" => reach_check(client, config, "comfyui", "ComfyUI is reachable").await,
        "automatic1111" => {
            reach_check(client, config, "automatic1111", "Automatic1111 is reachable").await
        }
        "wan2" => reach_check(client, config, "wan2", "Wan2.1 is reachable").await,
        "ollama" => ollama_check(client, config).await,
        "lmstudio" => lmstudio_check(client, config).await,
        "gateway" => gateway_check(client, config).await,
        "anthropic" => anthropic_check(client, config, supplied_key).await,
        "telegram" => telegram_check(client, config, supplied_key).await,
        other => TestVerdict::fail(format!("No test available for {other}")),
    }
}

async fn service_url(config: &SharedConfig, id: &str) -> String {
    // Registered ids only reach this point, so the lookup cannot miss.
    let def = services::service(id).expect("registered service");
    let base = config.get_or(def.url_key, def.default_url).await;
    format!("{}{}", base.trim_end_matches('/'), def.health_path)
}

/// Plain GET against the service's health path; 2xx passes.
async fn reach_check(
    client: &reqwest::Client,
    config: &SharedConfig,
    id: &str,
    ok_message: &str,
) -> TestVerdict {
    let url = service_url(config, id).await;
    match client.get(&url).timeout(REACH_TIMEOUT).send().await {
        Ok(resp) if resp.status().is_success() => TestVerdict::pass(ok_message),
        Ok(resp) => TestVerdict::fail(upstream_message(resp).await),
        Err(e) => TestVerdict::fail(e.to_string()),
    }
}

async fn ollama_check(client: &reqwest::Client, config: &SharedConfig) -> TestVerdict {
    let url = service_url(config, "ollama").await;
    match client.get(&url).timeout(REACH_TIMEOUT).send().await {
        Ok(resp) if resp.status().is_success() => {
            let count = resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("models")?.as_array().map(Vec::len))
                .unwrap_or(0);
            TestVerdict::pass(format!("Ollama online — {count} model(s) loaded"))
        }
        Ok(resp) => TestVerdict::fail(upstream_message(resp).await),
        Err(e) => TestVerdict::fail(e.to_string()),
    }
}

async fn lmstudio_check(client: &reqwest::Client, config: &SharedConfig) -> TestVerdict {
    let url = service_url(config, "lmstudio").await;
    match client.get(&url).timeout(REACH_TIMEOUT).send().await {
        Ok(resp) if resp.status().is_success() => {
            let count = resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("data")?.as_array().map(Vec::len))
                .unwrap_or(0);
            TestVerdict::pass(format!("LM Studio online — {count} model(s)"))
        }
        Ok(resp) => TestVerdict::fail(upstream_message(resp).await),
        Err(e) => TestVerdict::fail(e.to_string()),
    }
}

/// Any HTTP status passes: the gateway has no health endpoint, so an HTTP
/// answer of any kind proves the process is listening.
async fn gateway_check(client: &reqwest::Client, config: &SharedConfig) -> TestVerdict {
    let url = service_url(config, "gateway").await;
    match client.get(&url).timeout(REACH_TIMEOUT).send().await {
        Ok(resp) => TestVerdict::pass(format!("Gateway reachable ({})", resp.status().as_u16())),
        Err(e) => TestVerdict::fail(e.to_string()),
    }
}

/// Minimal-cost authenticated call: one "ping" message capped at 10 output
/// tokens. Succeeds only if the API accepts the key.
async fn anthropic_check(
    client: &reqwest::Client,
    config: &SharedConfig,
    supplied_key: Option<String>,
) -> TestVerdict {
    let key = match supplied_key.or(config.get("ANTHROPIC_API_KEY").await) {
        Some(k) if !k.is_empty() => k,
        _ => return TestVerdict::fail("No API key provided"),
    };
    let body = json!({
        "model": "claude-sonnet-4-5",
        "max_tokens": 10,
        "messages": [{ "role": "user", "content": "ping" }],
    });
    let request = client
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", key)
        .header("anthropic-version", "2023-06-01")
        .json(&body)
        .timeout(ANTHROPIC_TIMEOUT);

    match request.send().await {
        Ok(resp) if resp.status().is_success() => {
            let model = resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|b| b.get("model")?.as_str().map(str::to_string))
                .unwrap_or_else(|| "unknown".to_string());
            TestVerdict::pass(format!("Claude API key valid (model: {model})"))
        }
        Ok(resp) => TestVerdict::fail(upstream_message(resp).await),
        Err(e) => TestVerdict::fail(e.to_string()),
    }
}

async fn telegram_check(
    client: &reqwest::Client,
    config: &SharedConfig,
    supplied_key: Option<String>,
) -> TestVerdict {
    let token = match supplied_key.or(config.get("TELEGRAM_BOT_TOKEN").await) {
        Some(t) if !t.is_empty() => t,
        _ => return TestVerdict::fail("No bot token provided"),
    };
    let url = format!("https://api.telegram.org/bot{token}/getMe");
    match client.get(&url).timeout(TELEGRAM_TIMEOUT).send().await {
        Ok(resp) if resp.status().is_success() => {
            let username = resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|b| b.pointer("/result/username")?.as_str().map(str::to_string))
                .unwrap_or_else(|| "unknown".to_string());
            TestVerdict::pass(format!("Bot: @{username}"))
        }
        Ok(resp) => TestVerdict::fail(upstream_message(resp).await),
        Err(e) => TestVerdict::fail(e.to_string()),
    }
}

/// Prefer the human-readable message inside the upstream error payload over
/// a bare status line.
async fn upstream_message(resp: reqwest::Response) -> String {
    let status = resp.status();
    let extracted = resp.json::<Value>().await.ok().and_then(|body| {
        body.pointer("/error/message")
            .or_else(|| body.get("message"))
            .or_else(|| body.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    extracted.unwrap_or_else(|| format!("Upstream returned HTTP {status}"))
}
