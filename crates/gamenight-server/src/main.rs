//! Game night session server.

use anyhow::Context;
use gamenight_core::EngineConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod host;
mod ledger;
mod protocol;
mod server;

use server::ServerState;

/// Engine settings from the JSON file named by `GAMENIGHT_CONFIG`, if any
fn load_config() -> anyhow::Result<EngineConfig> {
    let Ok(path) = std::env::var("GAMENIGHT_CONFIG") else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading engine config {path}"))?;
    EngineConfig::from_json(&text).with_context(|| format!("parsing engine config {path}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse address from env or use default
    let addr: SocketAddr = std::env::var("SERVER_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()?;

    let config = load_config()?;
    info!("Starting game night server...");

    let state = Arc::new(ServerState::new(config));
    tokio::spawn(server::run_clock(Arc::clone(&state)));

    server::run_server(addr, state).await
}
