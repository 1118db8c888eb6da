// ABOUTME: Status model derived from the daemon's process state and client output.
// ABOUTME: Daemon/connection states, snapshots, device table parsing and connectivity heuristics.

use chrono::{DateTime, Local};
use serde::Deserialize;
use std::fmt;

pub const NO_DEVICES: &str = "No devices found or the mesh daemon is not running.";

const SEPARATOR_WIDTH: usize = 110;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
    Running,
    Stopped,
}

impl DaemonState {
    pub fn from_running(running: bool) -> Self {
        if running {
            DaemonState::Running
        } else {
            DaemonState::Stopped
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DaemonState::Running => "Running",
            DaemonState::Stopped => "Stopped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
    DaemonOffline,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::DaemonOffline => "Daemon Offline",
        }
    }
}

/// Result of one refresh: both probes taken back to back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub daemon: DaemonState,
    pub connection: ConnectionState,
    pub taken_at: DateTime<Local>,
}

impl StatusSnapshot {
    /// `connected` is ignored when the daemon is not running.
    pub fn new(running: bool, connected: bool) -> Self {
        let connection = match (running, connected) {
            (false, _) => ConnectionState::DaemonOffline,
            (true, true) => ConnectionState::Connected,
            (true, false) => ConnectionState::Disconnected,
        };
        Self {
            daemon: DaemonState::from_running(running),
            connection,
            taken_at: Local::now(),
        }
    }
}

/// One peer line from the client's status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub ip: String,
    pub hostname: String,
    pub user: String,
    pub os: String,
    pub status: String,
}

impl DeviceRecord {
    /// Needs at least four whitespace-separated fields.
    pub fn parse_line(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            return None;
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        if parts.len() < 4 {
            return None;
        }

        let status = parts[4..].join(" ");
        let status = if status.is_empty() || status == "-" {
            "online".to_string()
        } else {
            status
        };

        Some(Self {
            ip: parts[0].to_string(),
            hostname: parts[1].to_string(),
            user: parts[2].to_string(),
            os: parts[3].to_string(),
            status,
        })
    }
}

/// Parsed status output, in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceTable {
    pub devices: Vec<DeviceRecord>,
}

impl DeviceTable {
    pub fn parse(output: &str) -> Self {
        let devices = output
            .trim()
            .lines()
            .filter_map(DeviceRecord::parse_line)
            .collect();
        Self { devices }
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }
}

impl fmt::Display for DeviceTable {
    /// Fixed-width text table, or the "no devices" notice.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "{}", NO_DEVICES);
        }

        let separator = "=".repeat(SEPARATOR_WIDTH);
        writeln!(f, "{}", separator)?;
        writeln!(
            f,
            "{:<17} {:<25} {:<15} {:<10} {}",
            "IP Address", "Hostname", "User", "OS", "Status"
        )?;
        writeln!(f, "{}", separator)?;
        for device in &self.devices {
            writeln!(
                f,
                "{:<17} {:<25} {:<15} {:<10} {}",
                device.ip, device.hostname, device.user, device.os, device.status
            )?;
        }
        write!(f, "{}", separator)
    }
}

#[derive(Deserialize)]
struct StatusJson {
    #[serde(rename = "BackendState")]
    backend_state: Option<String>,
}

/// `BackendState` from `status --json`, or None if the output isn't that shape.
pub fn backend_state(json: &str) -> Option<String> {
    serde_json::from_str::<StatusJson>(json)
        .ok()
        .and_then(|status| status.backend_state)
}

/// Substring heuristic over plain status output.
///
/// Connected iff the text is non-empty, mentions the mesh address prefix and
/// lacks the logged-out marker. A hostname containing the prefix fools it,
/// which is why JSON is preferred when the client supports it.
pub fn looks_connected(output: &str, address_prefix: &str, logged_out_marker: &str) -> bool {
    !output.trim().is_empty()
        && output.contains(address_prefix)
        && !output.contains(logged_out_marker)
}
