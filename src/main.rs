mod config;
mod services;
mod upstream;
mod web;

use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, warn};
use tracing_subscriber::FmtSubscriber;

use crate::config::ConfigStore;
use crate::web::{ApiServer, AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("opsdeck: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let store = Arc::new(ConfigStore::open(ConfigStore::default_path()));

    let host = store.get_or("OPSDECK_HOST", "127.0.0.1").await;
    let port = match store.get_or("OPSDECK_PORT", "3001").await.parse::<u16>() {
        Ok(p) => p,
        Err(_) => {
            warn!("Invalid OPSDECK_PORT, falling back to 3001");
            3001
        }
    };

    let state = AppState {
        config: store,
        http: reqwest::Client::new(),
    };
    ApiServer::new(host, port, state).serve().await
}
