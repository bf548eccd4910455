//! Client for the Claude chat gateway. The gateway exposes no health
//! endpoint, so reachability is judged by "did it answer HTTP at all";
//! real calls carry the configured bearer token.

use std::time::Duration;

use serde_json::Value;

use super::{UpstreamError, expect_success};
use crate::config::SharedConfig;
use crate::services;

const CHAT_TIMEOUT: Duration = Duration::from_millis(30_000);

pub const DEFAULT_MODEL_KEY: &str = "GATEWAY_DEFAULT_MODEL";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

pub struct GatewayClient {
    base: String,
    token: Option<String>,
    default_model: String,
    client: reqwest::Client,
}

impl GatewayClient {
    pub async fn from_config(client: reqwest::Client, config: &SharedConfig) -> Self {
        let def = services::service("gateway").expect("gateway is registered");
        let base = config.get_or(def.url_key, def.default_url).await;
        let token = config
            .get("GATEWAY_AUTH_TOKEN")
            .await
            .filter(|t| !t.is_empty());
        let default_model = config.get_or(DEFAULT_MODEL_KEY, DEFAULT_MODEL).await;
        Self {
            base: base.trim_end_matches('/').to_string(),
            token,
            default_model,
            client,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base, path))
            .timeout(CHAT_TIMEOUT);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    pub async fn sessions(&self) -> Result<Value, UpstreamError> {
        let resp = self.request(reqwest::Method::GET, "/sessions").send().await?;
        Ok(expect_success(resp).await?.json().await?)
    }

    pub async fn chat(
        &self,
        message: &str,
        model: Option<String>,
        system: Option<String>,
    ) -> Result<Value, UpstreamError> {
        let body = serde_json::json!({
            "message": message,
            "model": model.unwrap_or_else(|| self.default_model.clone()),
            "system": system.unwrap_or_default(),
        });
        let resp = self
            .request(reqwest::Method::POST, "/chat")
            .json(&body)
            .send()
            .await?;
        Ok(expect_success(resp).await?.json().await?)
    }
}
