//! Scan agent configuration, loaded once at startup.

use std::time::Duration;

use serde::Deserialize;

/// Wall-clock budget for `docker` listing commands. Listings answer from
/// the local daemon and never pull anything.
const LISTING_TIMEOUT_SECS: u64 = 30;

/// Configuration read from the process environment via `envy`.
///
/// Field to variable mapping: `agent_token` is `AGENT_TOKEN`, `agent_id`
/// is `AGENT_ID`, `api_port` is `API_PORT`, `scan_timeout_secs` is
/// `SCAN_TIMEOUT_SECS`, `trivy_path` is `TRIVY_PATH`, `docker_path` is
/// `DOCKER_PATH`. Unset variables fall back to the defaults below.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanAgentConfig {
    /// Shared secret expected in the `X-Agent-Token` header.
    #[serde(default = "default_agent_token")]
    pub agent_token: String,
    /// Identifier reported by `/health`.
    #[serde(default = "default_agent_id")]
    pub agent_id: String,
    /// TCP port to bind on all interfaces.
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Wall-clock budget for scan commands, in seconds.
    #[serde(default = "default_scan_timeout_secs")]
    pub scan_timeout_secs: u64,
    /// Scanner binary to invoke.
    #[serde(default = "default_trivy_path")]
    pub trivy_path: String,
    /// Container runtime binary to invoke.
    #[serde(default = "default_docker_path")]
    pub docker_path: String,
}

fn default_agent_token() -> String {
    "default-agent-token".to_string()
}

fn default_agent_id() -> String {
    "local-agent".to_string()
}

fn default_api_port() -> u16 {
    8888
}

fn default_scan_timeout_secs() -> u64 {
    300
}

fn default_trivy_path() -> String {
    "trivy".to_string()
}

fn default_docker_path() -> String {
    "docker".to_string()
}

impl Default for ScanAgentConfig {
    fn default() -> Self {
        Self {
            agent_token: default_agent_token(),
            agent_id: default_agent_id(),
            api_port: default_api_port(),
            scan_timeout_secs: default_scan_timeout_secs(),
            trivy_path: default_trivy_path(),
            docker_path: default_docker_path(),
        }
    }
}

impl ScanAgentConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Budget for scan commands.
    #[must_use]
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    /// Budget for listing commands.
    #[must_use]
    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(LISTING_TIMEOUT_SECS)
    }
}
