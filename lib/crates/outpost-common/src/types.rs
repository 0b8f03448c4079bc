//! Wire types shared by the scan agent, the fleet agent, and anything
//! that talks to them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Scan agent requests ─────────────────────────────────────────────────

/// Request body for `POST /scan/image`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
    /// Image reference to scan, e.g. `alpine:3.18`. Required, non-empty.
    #[serde(default)]
    pub image: String,
    /// Comma-separated severity filter forwarded to the scanner.
    #[serde(default = "default_severity")]
    pub severity: String,
    /// Comma-separated check categories forwarded to the scanner.
    #[serde(default = "default_checks")]
    pub checks: String,
}

/// Request body for `POST /scan/sbom`.
#[derive(Debug, Clone, Deserialize)]
pub struct SbomRequest {
    #[serde(default)]
    pub image: String,
    /// SBOM output format, passed straight to the scanner.
    #[serde(default = "default_sbom_format")]
    pub format: String,
}

/// Request body for `POST /scan/config`. Severity is never filtered here.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigScanRequest {
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_config_checks")]
    pub checks: String,
}

fn default_severity() -> String {
    "HIGH,CRITICAL".to_string()
}

fn default_checks() -> String {
    "vuln,config".to_string()
}

fn default_sbom_format() -> String {
    "cyclonedx".to_string()
}

fn default_config_checks() -> String {
    "config".to_string()
}

/// Body of `GET /health`. The only unauthenticated answer the scan agent
/// gives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub agent_id: String,
}

// ── Fleet agent payloads ────────────────────────────────────────────────

/// Registration payload, sent once when the fleet agent starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRegistration {
    pub agent_id: String,
    pub hostname: String,
    pub ip_address: String,
    pub os_info: String,
    pub version: String,
    /// Free-form labels; omitted from the wire when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Heartbeat payload, sent on every loop iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub agent_id: String,
}

/// Host telemetry snapshot, collected fresh per iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub ip_address: String,
    pub os: String,
    pub runtime_version: String,
    pub cpu_count: usize,
    /// `"<kB> kB"` from the host; omitted when it cannot be read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_total: Option<String>,
    pub collected_at: DateTime<Utc>,
}

/// Report payload wrapping one telemetry snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReport {
    pub agent_id: String,
    pub data_type: String,
    pub data: SystemInfo,
}

impl AgentReport {
    /// Wrap a telemetry snapshot as a `system` report.
    #[must_use]
    pub fn system(agent_id: impl Into<String>, data: SystemInfo) -> Self {
        Self {
            agent_id: agent_id.into(),
            data_type: "system".to_string(),
            data,
        }
    }
}

/// Controller reply envelope. Unknown fields are ignored; a reply without
/// `success` deserializes as a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiReply {
    /// Failure reply carrying a transport- or HTTP-level reason.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Controller API actions, encoded as the `action` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentAction {
    Register,
    Heartbeat,
    Report,
}

impl AgentAction {
    /// Canonical lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AgentAction::Register => "register",
            AgentAction::Heartbeat => "heartbeat",
            AgentAction::Report => "report",
        }
    }
}

impl fmt::Display for AgentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable agent identifier derived from a hostname: lowercased, spaces
/// replaced with hyphens. Same hostname, same id, across restarts.
#[must_use]
pub fn derive_agent_id(hostname: &str) -> String {
    hostname.to_lowercase().replace(' ', "-")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn scan_request_fills_defaults() {
        let request: ScanRequest = serde_json::from_str(r#"{"image":"alpine:3.18"}"#).unwrap();
        assert_eq!(request.image, "alpine:3.18");
        assert_eq!(request.severity, "HIGH,CRITICAL");
        assert_eq!(request.checks, "vuln,config");
    }

    #[test]
    fn scan_request_missing_image_is_empty_not_error() {
        let request: ScanRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.image, "");
    }

    #[test]
    fn scan_request_overrides_win() {
        let request: ScanRequest =
            serde_json::from_str(r#"{"image":"a","severity":"LOW","checks":"vuln"}"#).unwrap();
        assert_eq!(request.severity, "LOW");
        assert_eq!(request.checks, "vuln");
    }

    #[test]
    fn sbom_request_defaults_to_cyclonedx() {
        let request: SbomRequest = serde_json::from_str(r#"{"image":"a"}"#).unwrap();
        assert_eq!(request.format, "cyclonedx");
    }

    #[test]
    fn config_scan_request_defaults_to_config_checks() {
        let request: ConfigScanRequest = serde_json::from_str(r#"{"image":"a"}"#).unwrap();
        assert_eq!(request.checks, "config");
    }

    #[test]
    fn registration_omits_empty_tags() {
        let registration = AgentRegistration {
            agent_id: "host-a".into(),
            hostname: "host-a".into(),
            ip_address: "10.0.0.5".into(),
            os_info: "Linux 6.8.0".into(),
            version: "0.1.0".into(),
            tags: Vec::new(),
        };
        let wire = serde_json::to_value(&registration).unwrap();
        assert!(wire.get("tags").is_none());

        let tagged = AgentRegistration {
            tags: vec!["edge".into()],
            ..registration
        };
        let wire = serde_json::to_value(&tagged).unwrap();
        assert_eq!(wire["tags"], serde_json::json!(["edge"]));
    }

    #[test]
    fn system_info_omits_unknown_memory() {
        let info = SystemInfo {
            hostname: "host-a".into(),
            ip_address: "10.0.0.5".into(),
            os: "Linux 6.8.0".into(),
            runtime_version: "0.1.0".into(),
            cpu_count: 8,
            memory_total: None,
            collected_at: Utc::now(),
        };
        let wire = serde_json::to_value(&info).unwrap();
        assert!(wire.get("memory_total").is_none());
    }

    #[test]
    fn system_report_sets_data_type() {
        let info = SystemInfo {
            hostname: "host-a".into(),
            ip_address: "10.0.0.5".into(),
            os: "Linux 6.8.0".into(),
            runtime_version: "0.1.0".into(),
            cpu_count: 8,
            memory_total: Some("16309504 kB".into()),
            collected_at: Utc::now(),
        };
        let report = AgentReport::system("host-a", info);
        assert_eq!(report.data_type, "system");
        assert_eq!(report.agent_id, "host-a");
    }

    #[test]
    fn api_reply_without_success_is_failure() {
        let reply: ApiReply = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(!reply.success);
        assert!(reply.error.is_none());
    }

    #[test]
    fn api_reply_ignores_unknown_fields() {
        let reply: ApiReply =
            serde_json::from_str(r#"{"success":true,"agent":"x","pending_commands":[]}"#).unwrap();
        assert!(reply.success);
    }

    #[test]
    fn action_wire_names_are_lowercase() {
        assert_eq!(AgentAction::Register.as_str(), "register");
        assert_eq!(AgentAction::Heartbeat.as_str(), "heartbeat");
        assert_eq!(AgentAction::Report.as_str(), "report");
        assert_eq!(
            serde_json::to_string(&AgentAction::Heartbeat).unwrap(),
            r#""heartbeat""#
        );
    }

    #[test]
    fn agent_id_is_lowercased_and_hyphenated() {
        assert_eq!(derive_agent_id("My Work Laptop"), "my-work-laptop");
        assert_eq!(derive_agent_id("edge-node-01"), "edge-node-01");
    }
}
