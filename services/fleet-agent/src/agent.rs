//! The register, then heartbeat-and-report loop.
//!
//! Registration runs once and is best-effort; the loop keeps going no
//! matter what the controller answers. Heartbeat and report are
//! independent, one failing never skips the other.

use std::time::Duration;

use anyhow::Result;

use outpost_common::{AgentAction, AgentReport, Heartbeat};

use crate::api::ControllerApi;
use crate::facts::{self, AgentIdentity};

/// Pause after an unexpected iteration failure before retrying.
const FAILURE_BACKOFF: Duration = Duration::from_secs(10);

/// Loop settings carried over from the CLI.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub interval: Duration,
    pub once: bool,
    pub tags: Vec<String>,
}

/// Drive the agent until SIGINT, or for exactly one cycle with `once`.
///
/// Returns whether the most recent cycle fully succeeded; in `once` mode
/// that becomes the process exit code.
pub async fn run(api: &impl ControllerApi, options: &RunOptions) -> Result<bool> {
    let identity = AgentIdentity::collect();
    tracing::info!(
        agent_id = %identity.agent_id,
        hostname = %identity.hostname,
        interval_secs = options.interval.as_secs(),
        once = options.once,
        "fleet agent starting"
    );

    register(api, &identity, &options.tags).await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        match run_cycle(api, &identity).await {
            Ok(cycle_ok) => {
                if options.once {
                    return Ok(cycle_ok);
                }
                tokio::select! {
                    () = tokio::time::sleep(options.interval) => {}
                    _ = &mut shutdown => {
                        tracing::info!("agent stopped");
                        return Ok(cycle_ok);
                    }
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "iteration failed unexpectedly");
                if options.once {
                    return Ok(false);
                }
                tokio::select! {
                    () = tokio::time::sleep(FAILURE_BACKOFF) => {}
                    _ = &mut shutdown => {
                        tracing::info!("agent stopped");
                        return Ok(false);
                    }
                }
            }
        }
    }
}

/// One-shot best-effort registration; the loop proceeds regardless.
async fn register(api: &impl ControllerApi, identity: &AgentIdentity, tags: &[String]) {
    let reply = api
        .call(AgentAction::Register, Some(&identity.registration(tags)))
        .await;
    if reply.success {
        tracing::info!(agent_id = %identity.agent_id, "registered with controller");
    } else {
        tracing::warn!(
            agent_id = %identity.agent_id,
            error = reply.error.as_deref().unwrap_or("unknown"),
            "registration failed, continuing anyway"
        );
    }
}

/// Collect facts, heartbeat, report. Controller refusals are values, not
/// errors; an `Err` here means the iteration itself broke and triggers
/// the backoff in `run`.
async fn run_cycle(api: &impl ControllerApi, identity: &AgentIdentity) -> Result<bool> {
    let info = facts::collect_system_info();

    let heartbeat = api
        .call(
            AgentAction::Heartbeat,
            Some(&Heartbeat {
                agent_id: identity.agent_id.clone(),
            }),
        )
        .await;
    if heartbeat.success {
        tracing::info!("heartbeat sent");
    } else {
        tracing::warn!(
            error = heartbeat.error.as_deref().unwrap_or("unknown"),
            "heartbeat failed"
        );
    }

    let report = api
        .call(
            AgentAction::Report,
            Some(&AgentReport::system(identity.agent_id.clone(), info)),
        )
        .await;
    if report.success {
        tracing::info!("system report sent");
    } else {
        tracing::warn!(
            error = report.error.as_deref().unwrap_or("unknown"),
            "report failed"
        );
    }

    Ok(heartbeat.success && report.success)
}
