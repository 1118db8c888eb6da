// ABOUTME: Detects whether the host's init system should manage the daemon.
// ABOUTME: Auto mode inspects PID 1's command name; explicit modes skip detection.

use crate::error::SupervisorError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

const PID1_COMM: &str = "/proc/1/comm";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceManager {
    /// Use systemd if PID 1 is systemd, otherwise manage the process directly
    #[default]
    Auto,
    Systemd,
    None,
}

impl ServiceManager {
    /// Whether lifecycle operations go through `systemctl`.
    pub fn is_systemd(self) -> bool {
        match self {
            ServiceManager::Auto => init_is_systemd(Path::new(PID1_COMM)),
            ServiceManager::Systemd => true,
            ServiceManager::None => false,
        }
    }
}

impl FromStr for ServiceManager {
    type Err = SupervisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ServiceManager::Auto),
            "systemd" => Ok(ServiceManager::Systemd),
            "none" | "direct" => Ok(ServiceManager::None),
            other => Err(SupervisorError::Config(format!(
                "unknown service manager '{}' (expected auto, systemd or none)",
                other
            ))),
        }
    }
}

/// Unreadable files count as "not systemd".
pub fn init_is_systemd(comm_path: &Path) -> bool {
    std::fs::read_to_string(comm_path)
        .map(|comm| comm.trim() == "systemd")
        .unwrap_or(false)
}
