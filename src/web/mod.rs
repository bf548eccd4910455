mod handlers;
mod router;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::SharedConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: SharedConfig,
    pub http: reqwest::Client,
}

pub struct ApiServer {
    host: String,
    port: u16,
    state: AppState,
}

impl ApiServer {
    pub fn new(host: String, port: u16, state: AppState) -> Self {
        Self { host, port, state }
    }

    pub async fn serve(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let app = router::build_api_router(self.state);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding {addr}"))?;
        info!("opsdeck API running at http://{addr}");
        axum::serve(listener, app).await.context("API server crashed")?;
        Ok(())
    }
}
