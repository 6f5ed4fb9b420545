//! Entry point for the token-sentinel signals service.

use anyhow::{Context, Result};
use sentinel::api;
use sentinel::config::AppConfig;
use sentinel::engine::SignalEngine;
use tracing::{info, Level};
use tracing_subscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let addr = config
        .listen_addr
        .parse()
        .context("parsing LISTEN_ADDR")?;

    info!("Starting token-sentinel signals service");
    let engine = SignalEngine::new(&config)?;
    api::serve(engine, addr).await
}
