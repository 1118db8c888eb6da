// ABOUTME: Error types for supervisor operations using thiserror.
// ABOUTME: Covers command spawning, waiting on children and config loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the command runner and config loader.
///
/// Supervisor operations never return these to callers; they are rendered
/// into activity log lines instead.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The external program could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program started but collecting its output failed.
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the config file failed.
    #[error("failed to read config from {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for our schema.
    #[error("failed to parse config from {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Any other configuration problem.
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias using SupervisorError.
pub type Result<T> = std::result::Result<T, SupervisorError>;
