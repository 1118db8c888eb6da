// ABOUTME: Single-action commands run outside the panel.
// ABOUTME: Activity is printed to stdout; a failed outcome becomes a non-zero exit.

use super::Command;
use anyhow::{bail, Result};
use std::sync::Arc;
use tailpanel_core::{Config, StatusSnapshot, StdoutSink, Supervisor};

pub async fn run(command: &Command, config: Config) -> Result<()> {
    let supervisor = Supervisor::system(config, Arc::new(StdoutSink));

    let outcome = match command {
        Command::Status => {
            let snapshot = supervisor.snapshot().await;
            println!("{}", format_snapshot(&snapshot));
            return Ok(());
        }
        Command::Devices => {
            println!("{}", supervisor.fetch_devices().await);
            return Ok(());
        }
        Command::Start => supervisor.start().await,
        Command::Stop => supervisor.stop().await,
        Command::Up => supervisor.connect_network().await,
        Command::Down => supervisor.disconnect_network().await,
        Command::Config { .. } | Command::Completion { .. } | Command::Version => {
            bail!("{:?} is not a supervisor command", command)
        }
    };

    tracing::debug!(?outcome, "One-shot command finished");
    if outcome.is_failure() {
        bail!("command failed");
    }
    Ok(())
}

pub fn format_snapshot(snapshot: &StatusSnapshot) -> String {
    format!(
        "Daemon: {} | Connection: {}",
        snapshot.daemon.label(),
        snapshot.connection.label()
    )
}
