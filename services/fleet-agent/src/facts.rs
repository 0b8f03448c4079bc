//! Host fact collection for registration and telemetry reports.
//!
//! Everything here degrades to a fallback instead of failing; a report
//! with partial facts beats no report at all.

use std::net::UdpSocket;

use chrono::Utc;

use outpost_common::{derive_agent_id, AgentRegistration, SystemInfo};

/// Version reported to the controller.
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identity facts captured once at startup, stable for the process
/// lifetime.
#[derive(Debug, Clone)]
pub struct AgentIdentity {
    pub agent_id: String,
    pub hostname: String,
    pub ip_address: String,
    pub os_info: String,
}

impl AgentIdentity {
    /// Read the identity off the live host.
    #[must_use]
    pub fn collect() -> Self {
        let hostname = local_hostname();
        Self {
            agent_id: derive_agent_id(&hostname),
            ip_address: local_ip_address(),
            os_info: os_info(),
            hostname,
        }
    }

    /// Registration payload for this identity.
    #[must_use]
    pub fn registration(&self, tags: &[String]) -> AgentRegistration {
        AgentRegistration {
            agent_id: self.agent_id.clone(),
            hostname: self.hostname.clone(),
            ip_address: self.ip_address.clone(),
            os_info: self.os_info.clone(),
            version: AGENT_VERSION.to_string(),
            tags: tags.to_vec(),
        }
    }
}

/// Fresh telemetry snapshot, collected every loop iteration.
#[must_use]
pub fn collect_system_info() -> SystemInfo {
    SystemInfo {
        hostname: local_hostname(),
        ip_address: local_ip_address(),
        os: os_info(),
        runtime_version: AGENT_VERSION.to_string(),
        cpu_count: num_cpus::get(),
        memory_total: memory_total(),
        collected_at: Utc::now(),
    }
}

fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Routing-table trick: connecting a UDP socket selects the outbound
/// interface without sending a single packet.
fn local_ip_address() -> String {
    fn probe() -> Option<String> {
        let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
        socket.connect("8.8.8.8:80").ok()?;
        Some(socket.local_addr().ok()?.ip().to_string())
    }
    probe().unwrap_or_else(|| "127.0.0.1".to_string())
}

/// `"<Os> <kernel release>"`, e.g. `"Linux 6.8.0-45-generic"`. Falls back
/// to the bare OS name when the release cannot be read.
fn os_info() -> String {
    let mut os = String::from(std::env::consts::OS);
    if let Some(first) = os.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    match std::fs::read_to_string("/proc/sys/kernel/osrelease") {
        Ok(release) if !release.trim().is_empty() => format!("{os} {}", release.trim()),
        _ => os,
    }
}

fn memory_total() -> Option<String> {
    parse_mem_total(&std::fs::read_to_string("/proc/meminfo").ok()?)
}

/// Extract the `MemTotal` line of `/proc/meminfo` as `"<kB> kB"`.
fn parse_mem_total(meminfo: &str) -> Option<String> {
    let line = meminfo.lines().find(|line| line.starts_with("MemTotal"))?;
    let kb = line.split_whitespace().nth(1)?;
    Some(format!("{kb} kB"))
}
