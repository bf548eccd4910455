//! Client for the n8n workflow engine's v1 REST API, normalizing its
//! native objects into the summaries the console renders. The engine is
//! the source of truth; nothing here is persisted locally.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{UpstreamError, expect_success};
use crate::config::SharedConfig;
use crate::services;

const API_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_EXECUTION_LIMIT: u32 = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub tags: Vec<String>,
    pub node_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub id: Value,
    pub workflow_id: Value,
    pub workflow_name: String,
    pub status: String,
    pub started_at: Option<String>,
    pub stopped_at: Option<String>,
    pub mode: Option<String>,
    pub duration_ms: Option<i64>,
}

// Native n8n shapes, only the fields we project.

#[derive(Deserialize)]
struct Listing<T> {
    #[serde(default)]
    data: Vec<T>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWorkflow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    active: bool,
    created_at: Option<String>,
    updated_at: Option<String>,
    #[serde(default)]
    tags: Vec<RawTag>,
    #[serde(default)]
    nodes: Vec<Value>,
}

#[derive(Deserialize)]
struct RawTag {
    #[serde(default)]
    name: String,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExecution {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    workflow_id: Value,
    workflow_data: Option<RawWorkflowData>,
    status: Option<String>,
    started_at: Option<String>,
    stopped_at: Option<String>,
    mode: Option<String>,
}

#[derive(Deserialize)]
struct RawWorkflowData {
    name: Option<String>,
}

pub struct N8nClient {
    base: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl N8nClient {
    pub async fn from_config(client: reqwest::Client, config: &SharedConfig) -> Self {
        let def = services::service("n8n").expect("n8n is registered");
        let base = config.get_or(def.url_key, def.default_url).await;
        let api_key = config.get("N8N_API_KEY").await.filter(|k| !k.is_empty());
        Self {
            base: base.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/api/v1{}", self.base, path);
        let mut req = self.client.request(method, url).timeout(API_TIMEOUT);
        if let Some(key) = &self.api_key {
            req = req.header("X-N8N-API-KEY", key);
        }
        req
    }

    pub async fn list_workflows(&self) -> Result<Vec<WorkflowSummary>, UpstreamError> {
        let resp = self.request(reqwest::Method::GET, "/workflows").send().await?;
        let listing: Listing<RawWorkflow> = expect_success(resp).await?.json().await?;
        Ok(listing.data.into_iter().map(summarize_workflow).collect())
    }

    /// Full native workflow object, passed through untouched.
    pub async fn get_workflow(&self, id: &str) -> Result<Value, UpstreamError> {
        let resp = self
            .request(reqwest::Method::GET, &format!("/workflows/{id}"))
            .send()
            .await?;
        Ok(expect_success(resp).await?.json().await?)
    }

    /// Activation is a partial update of the `active` flag.
    pub async fn set_active(&self, id: &str, active: bool) -> Result<(), UpstreamError> {
        let resp = self
            .request(reqwest::Method::PATCH, &format!("/workflows/{id}"))
            .json(&serde_json::json!({ "active": active }))
            .send()
            .await?;
        expect_success(resp).await?;
        Ok(())
    }

    pub async fn run_workflow(&self, id: &str, body: Option<Value>) -> Result<Value, UpstreamError> {
        let resp = self
            .request(reqwest::Method::POST, &format!("/workflows/{id}/run"))
            .json(&body.unwrap_or_else(|| serde_json::json!({})))
            .send()
            .await?;
        Ok(expect_success(resp).await?.json().await?)
    }

    /// Recent executions without their (heavy) run data.
    pub async fn list_executions(
        &self,
        limit: u32,
    ) -> Result<Vec<ExecutionSummary>, UpstreamError> {
        let path = format!("/executions?limit={limit}&includeData=false");
        let resp = self.request(reqwest::Method::GET, &path).send().await?;
        let listing: Listing<RawExecution> = expect_success(resp).await?.json().await?;
        Ok(listing.data.into_iter().map(summarize_execution).collect())
    }

    pub async fn get_execution(&self, id: &str) -> Result<Value, UpstreamError> {
        let resp = self
            .request(reqwest::Method::GET, &format!("/executions/{id}"))
            .send()
            .await?;
        Ok(expect_success(resp).await?.json().await?)
    }
}

fn summarize_workflow(raw: RawWorkflow) -> WorkflowSummary {
    WorkflowSummary {
        id: raw.id,
        name: raw.name,
        active: raw.active,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        tags: raw.tags.into_iter().map(|t| t.name).collect(),
        node_count: raw.nodes.len(),
    }
}

fn summarize_execution(raw: RawExecution) -> ExecutionSummary {
    let duration_ms = duration_between(raw.started_at.as_deref(), raw.stopped_at.as_deref());
    ExecutionSummary {
        id: raw.id,
        workflow_id: raw.workflow_id,
        workflow_name: raw
            .workflow_data
            .and_then(|wd| wd.name)
            .unwrap_or_else(|| "Unknown".to_string()),
        status: raw.status.unwrap_or_else(|| "unknown".to_string()),
        started_at: raw.started_at,
        stopped_at: raw.stopped_at,
        mode: raw.mode,
        duration_ms,
    }
}

/// `stopped - started` in milliseconds; `None` when either timestamp is
/// missing or unparseable.
fn duration_between(started: Option<&str>, stopped: Option<&str>) -> Option<i64> {
    let start = chrono::DateTime::parse_from_rfc3339(started?).ok()?;
    let stop = chrono::DateTime::parse_from_rfc3339(stopped?).ok()?;
    Some((stop - start).num_milliseconds())
}
