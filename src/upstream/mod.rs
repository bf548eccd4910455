pub mod gateway;
pub mod n8n;
pub mod ollama;

use serde_json::Value;
use thiserror::Error;

/// Failure talking to an upstream service. `Status` carries the upstream's
/// own HTTP status plus a best-effort message pulled from its payload;
/// `Unreachable` is any connection-level failure (DNS, refused, timeout).
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Unreachable(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        UpstreamError::Unreachable(e.to_string())
    }
}

/// Pass 2xx responses through; turn anything else into `Status` with the
/// payload's message when one can be extracted.
pub async fn expect_success(resp: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| {
            body.pointer("/error/message")
                .or_else(|| body.get("message"))
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Upstream returned HTTP {status}"));
    Err(UpstreamError::Status {
        status: status.as_u16(),
        message,
    })
}
