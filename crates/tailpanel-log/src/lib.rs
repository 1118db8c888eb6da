// ABOUTME: Shared logging setup for tailpanel binaries
// ABOUTME: init() logs to stderr for CLI commands, init_file() logs to disk while the TUI owns the terminal

use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Standard logging to stderr. Default: INFO level, RUST_LOG override.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// File-based logging for the TUI. Default: WARN level, RUST_LOG override.
/// Logs to ~/.config/tailpanel/{app_name}/{app_name}.log
/// If setup fails, prints a warning to stderr and continues without logging.
pub fn init_file(app_name: &str) {
    let result = dirs::config_dir()
        .ok_or_else(|| "could not determine config directory".into())
        .and_then(|base| init_file_in(&base, app_name));
    if let Err(e) = result {
        eprintln!("Warning: failed to set up file logging: {e}");
    }
}

/// Location of the log file for `app_name` under `base`.
pub fn log_path(base: &Path, app_name: &str) -> PathBuf {
    base.join("tailpanel")
        .join(app_name)
        .join(format!("{app_name}.log"))
}

fn init_file_in(base: &Path, app_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let log_file = open_log_file(base, app_name)?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_ansi(false)
        .init();

    Ok(())
}

fn open_log_file(base: &Path, app_name: &str) -> std::io::Result<std::fs::File> {
    let path = log_path(base, app_name);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}
