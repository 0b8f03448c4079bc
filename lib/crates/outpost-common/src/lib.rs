//! Shared types for the outpost agents.
//!
//! Everything that crosses a process boundary lives here: scan request
//! bodies, fleet payloads, the controller reply envelope, plus the
//! report normalization both sides of the wire agree on.

pub mod report;
pub mod sanitize;
pub mod types;

pub use report::{normalize_report, severity_totals, VulnerabilityRecord};
pub use sanitize::sanitize_image_ref;
pub use types::{
    derive_agent_id, AgentAction, AgentRegistration, AgentReport, ApiReply, ConfigScanRequest,
    HealthResponse, Heartbeat, SbomRequest, ScanRequest, SystemInfo,
};
