//! Client for a local Ollama server: installed-model listing plus
//! generation/chat forwarding with the longer budget generation needs.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{UpstreamError, expect_success};
use crate::config::SharedConfig;
use crate::services;

const LIST_TIMEOUT: Duration = Duration::from_millis(5000);
/// Generation can legitimately take minutes on consumer GPUs.
const GENERATE_TIMEOUT: Duration = Duration::from_millis(120_000);

pub const DEFAULT_MODEL_KEY: &str = "OLLAMA_DEFAULT_MODEL";
pub const DEFAULT_MODEL: &str = "llama3.2";

#[derive(Debug, Serialize)]
pub struct ModelEntry {
    pub name: String,
    pub size: Option<u64>,
    pub modified: Option<String>,
    pub digest: Option<String>,
}

#[derive(Deserialize)]
struct TagList {
    #[serde(default)]
    models: Vec<RawModel>,
}

#[derive(Deserialize)]
struct RawModel {
    #[serde(default)]
    name: String,
    size: Option<u64>,
    modified_at: Option<String>,
    digest: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateReply {
    pub response: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub message: Option<Value>,
    pub model: Option<String>,
}

pub struct OllamaClient {
    base: String,
    default_model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub async fn from_config(client: reqwest::Client, config: &SharedConfig) -> Self {
        let def = services::service("ollama").expect("ollama is registered");
        let base = config.get_or(def.url_key, def.default_url).await;
        let default_model = config.get_or(DEFAULT_MODEL_KEY, DEFAULT_MODEL).await;
        Self {
            base: base.trim_end_matches('/').to_string(),
            default_model,
            client,
        }
    }

    /// `/api/tags` normalized to `{name, size, modified, digest}`.
    pub async fn list_models(&self) -> Result<Vec<ModelEntry>, UpstreamError> {
        let resp = self
            .client
            .get(format!("{}/api/tags", self.base))
            .timeout(LIST_TIMEOUT)
            .send()
            .await?;
        let tags: TagList = expect_success(resp).await?.json().await?;
        Ok(tags
            .models
            .into_iter()
            .map(|m| ModelEntry {
                name: m.name,
                size: m.size,
                modified: m.modified_at,
                digest: m.digest,
            })
            .collect())
    }

    /// Raw `/api/tags` body, for the passthrough endpoint.
    pub async fn raw_tags(&self) -> Result<Value, UpstreamError> {
        let resp = self
            .client
            .get(format!("{}/api/tags", self.base))
            .timeout(LIST_TIMEOUT)
            .send()
            .await?;
        Ok(expect_success(resp).await?.json().await?)
    }

    pub async fn generate(
        &self,
        model: Option<String>,
        prompt: &str,
    ) -> Result<GenerateReply, UpstreamError> {
        let body = serde_json::json!({
            "model": model.unwrap_or_else(|| self.default_model.clone()),
            "prompt": prompt,
            "stream": false,
        });
        let resp = self
            .client
            .post(format!("{}/api/generate", self.base))
            .json(&body)
            .timeout(GENERATE_TIMEOUT)
            .send()
            .await?;
        let reply: Value = expect_success(resp).await?.json().await?;
        Ok(GenerateReply {
            response: reply
                .get("response")
                .and_then(Value::as_str)
                .map(str::to_string),
            model: reply.get("model").and_then(Value::as_str).map(str::to_string),
        })
    }

    pub async fn chat(
        &self,
        model: Option<String>,
        messages: Value,
    ) -> Result<ChatReply, UpstreamError> {
        let body = serde_json::json!({
            "model": model.unwrap_or_else(|| self.default_model.clone()),
            "messages": messages,
            "stream": false,
        });
        let resp = self
            .client
            .post(format!("{}/api/chat", self.base))
            .json(&body)
            .timeout(GENERATE_TIMEOUT)
            .send()
            .await?;
        let reply: Value = expect_success(resp).await?.json().await?;
        Ok(ChatReply {
            message: reply.get("message").cloned(),
            model: reply.get("model").and_then(Value::as_str).map(str::to_string),
        })
    }
}
