// ABOUTME: Configuration file handling.
// ABOUTME: TOML config with env var and .env support, CLI overrides applied by the binary.

use crate::error::{Result, SupervisorError};
use crate::service::ServiceManager;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

/// Which daemon and client to drive, and how.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    /// Exact process name, also the program spawned when not service-managed
    #[serde(default = "default_process")]
    pub process: String,
    /// Extra arguments for a directly spawned daemon
    #[serde(default)]
    pub args: Vec<String>,
    /// Command-line client used for up/down/status
    #[serde(default = "default_cli")]
    pub cli: String,
    /// Unit name handed to the service manager
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(default)]
    pub service_manager: ServiceManager,
    /// Privilege escalation prefix; empty runs commands as the current user
    #[serde(default = "default_escalation")]
    pub escalation: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            process: default_process(),
            args: Vec::new(),
            cli: default_cli(),
            service: default_service(),
            service_manager: ServiceManager::default(),
            escalation: default_escalation(),
        }
    }
}

fn default_process() -> String {
    "tailscaled".to_string()
}

fn default_cli() -> String {
    "tailscale".to_string()
}

fn default_service() -> String {
    "tailscaled".to_string()
}

fn default_escalation() -> String {
    "sudo".to_string()
}

/// How connectivity is derived from the client's status output.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Parse `status --json`, falling back to text on unparseable output
    #[default]
    Json,
    /// Substring heuristic on plain `status`
    Text,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    #[serde(default)]
    pub connectivity: Connectivity,
    /// Address prefix of the mesh's private range
    #[serde(default = "default_address_prefix")]
    pub address_prefix: String,
    #[serde(default = "default_logged_out_marker")]
    pub logged_out_marker: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::default(),
            address_prefix: default_address_prefix(),
            logged_out_marker: default_logged_out_marker(),
        }
    }
}

fn default_address_prefix() -> String {
    "100.".to_string()
}

fn default_logged_out_marker() -> String {
    "Logged out".to_string()
}

/// Intervals and grace periods, all in milliseconds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TimingConfig {
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    #[serde(default = "default_start_timeout_ms")]
    pub start_timeout_ms: u64,
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,
}

const MIN_PROBE_INTERVAL_MS: u64 = 10;

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            refresh_ms: default_refresh_ms(),
            probe_interval_ms: default_probe_interval_ms(),
            start_timeout_ms: default_start_timeout_ms(),
            stop_grace_ms: default_stop_grace_ms(),
            kill_grace_ms: default_kill_grace_ms(),
        }
    }
}

impl TimingConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms.max(1))
    }

    /// Floored so a zero interval cannot turn the start/stop wait into a busy loop.
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms.max(MIN_PROBE_INTERVAL_MS))
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_millis(self.start_timeout_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }

    /// Timings with no waiting at all, for tests.
    pub fn immediate() -> Self {
        Self {
            refresh_ms: 1,
            probe_interval_ms: 0,
            start_timeout_ms: 0,
            stop_grace_ms: 0,
            kill_grace_ms: 0,
        }
    }
}

fn default_refresh_ms() -> u64 {
    3000
}

fn default_probe_interval_ms() -> u64 {
    100
}

fn default_start_timeout_ms() -> u64 {
    1000
}

fn default_stop_grace_ms() -> u64 {
    1000
}

fn default_kill_grace_ms() -> u64 {
    500
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BehaviorConfig {
    /// Start the daemon when the TUI launches
    #[serde(default = "default_true")]
    pub autostart: bool,
    /// Stop the daemon when the TUI quits
    #[serde(default = "default_true")]
    pub stop_on_exit: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            autostart: true,
            stop_on_exit: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load config with precedence: env > .env > file > defaults.
    /// CLI overrides are applied by the caller afterwards.
    pub fn load(path_override: Option<&Path>) -> Result<Self> {
        // Load .env file if present (silently ignore if missing)
        let _ = dotenvy::dotenv();

        let path = match path_override {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let mut config = Self::load_from_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `TAILPANEL_*` overrides from the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(process) = lookup("TAILPANEL_DAEMON") {
            self.daemon.process = process;
        }
        if let Some(cli) = lookup("TAILPANEL_CLI") {
            self.daemon.cli = cli;
        }
        if let Some(service) = lookup("TAILPANEL_SERVICE") {
            self.daemon.service = service;
        }
        if let Some(escalation) = lookup("TAILPANEL_ESCALATION") {
            self.daemon.escalation = escalation;
        }
        if let Some(manager) = lookup("TAILPANEL_SERVICE_MANAGER") {
            self.daemon.service_manager = manager.parse()?;
        }
        if let Some(autostart) = lookup("TAILPANEL_AUTOSTART") {
            self.behavior.autostart = parse_flag(&autostart);
        }
        if let Some(stop) = lookup("TAILPANEL_STOP_ON_EXIT") {
            self.behavior.stop_on_exit = parse_flag(&stop);
        }
        Ok(())
    }

    /// Missing file yields defaults; an unreadable or invalid file is an error.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| SupervisorError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| SupervisorError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SupervisorError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SupervisorError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SupervisorError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SupervisorError::Config("Could not find config directory".to_string()))?;
        Ok(config_dir.join("tailpanel").join("config.toml"))
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}
