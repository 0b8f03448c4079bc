//! Scan agent entry point.
//!
//! Loads configuration from the environment, wires the production command
//! runner into the router, and serves until SIGINT.

mod command;
mod config;
mod scanner;
mod server;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::command::TokioCommandRunner;
use crate::config::ScanAgentConfig;
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ScanAgentConfig::from_env()
        .context("invalid environment configuration (AGENT_TOKEN, AGENT_ID, API_PORT, SCAN_TIMEOUT_SECS, TRIVY_PATH, DOCKER_PATH)")?;

    tracing::info!(
        agent_id = %config.agent_id,
        api_port = config.api_port,
        scan_timeout_secs = config.scan_timeout_secs,
        trivy = %config.trivy_path,
        docker = %config.docker_path,
        "configuration loaded"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let state = Arc::new(AppState::new(config, Arc::new(TokioCommandRunner)));
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("scan agent listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("scan agent stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl-C handler");
    tracing::info!("received shutdown signal");
}
