//! Fleet agent entry point.

mod agent;
mod api;
mod cli;
mod facts;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::agent::RunOptions;
use crate::api::ControllerClient;
use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!(error = %err, "fleet agent failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let api = ControllerClient::new(cli.url, cli.token)
        .context("failed to build the controller client")?;
    let options = RunOptions {
        interval: Duration::from_secs(cli.interval),
        once: cli.once,
        tags: cli.tags,
    };
    agent::run(&api, &options).await
}
