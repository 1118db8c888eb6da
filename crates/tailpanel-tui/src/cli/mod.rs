// ABOUTME: CLI command definitions using clap.
// ABOUTME: No subcommand launches the panel; subcommands run a single supervisor action.

pub mod oneshot;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tailpanel_core::Config;

#[derive(Parser, Debug)]
#[command(
    name = "tailpanel",
    about = "Control panel for a locally installed mesh VPN daemon"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file override
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Don't start the daemon when the panel opens
    #[arg(long, global = true)]
    pub no_autostart: bool,

    /// Leave the daemon running when the panel quits
    #[arg(long, global = true)]
    pub keep_running: bool,

    /// Privilege escalation prefix (empty string disables it)
    #[arg(long, global = true)]
    pub escalation: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print daemon and connection state
    Status,
    /// Start the daemon
    Start,
    /// Stop the daemon
    Stop,
    /// Connect to the mesh network
    Up,
    /// Disconnect from the mesh network
    Down,
    /// List devices on the mesh network
    Devices,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Show version
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show config file path
    Path,
    /// Write the effective config to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Apply command-line overrides on top of file and environment config.
    pub fn apply(&self, config: &mut Config) {
        if self.no_autostart {
            config.behavior.autostart = false;
        }
        if self.keep_running {
            config.behavior.stop_on_exit = false;
        }
        if let Some(escalation) = &self.escalation {
            config.daemon.escalation = escalation.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_launches_panel() {
        let cli = Cli::try_parse_from(["tailpanel"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_overrides_apply() {
        let cli =
            Cli::try_parse_from(["tailpanel", "--no-autostart", "--keep-running", "--escalation", ""])
                .unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert!(!config.behavior.autostart);
        assert!(!config.behavior.stop_on_exit);
        assert_eq!(config.daemon.escalation, "");
    }

    #[test]
    fn test_defaults_untouched_without_flags() {
        let cli = Cli::try_parse_from(["tailpanel", "status"]).unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config, Config::default());
        assert!(matches!(cli.command, Some(Command::Status)));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tailpanel", "stop", "--escalation", "doas"]).unwrap();
        assert_eq!(cli.escalation.as_deref(), Some("doas"));
    }

    #[test]
    fn test_cli_beats_env_beats_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[daemon]\nprocess = \"meshd\"\nescalation = \"doas\"\ncli = \"meshctl\"\n",
        )
        .unwrap();

        let mut config = Config::load_from_file(&path).unwrap();
        config
            .apply_env(|key| match key {
                "TAILPANEL_ESCALATION" => Some("pkexec".to_string()),
                "TAILPANEL_CLI" => Some("meshctl-env".to_string()),
                "TAILPANEL_STOP_ON_EXIT" => Some("true".to_string()),
                _ => None,
            })
            .unwrap();

        let cli = Cli::try_parse_from(["tailpanel", "--escalation", "sudo", "--keep-running"])
            .unwrap();
        cli.apply(&mut config);

        assert_eq!(config.daemon.escalation, "sudo");
        assert!(!config.behavior.stop_on_exit);
        assert_eq!(config.daemon.cli, "meshctl-env");
        assert_eq!(config.daemon.process, "meshd");
        assert!(config.behavior.autostart);
    }
}
