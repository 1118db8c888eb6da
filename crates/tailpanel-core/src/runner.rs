// ABOUTME: Runs external commands for the supervisor.
// ABOUTME: CommandRunner is the seam between supervisor logic and real processes.

use crate::error::{Result, SupervisorError};
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Prefix with a privilege escalation command such as `sudo` or `sudo -n`.
    /// An empty (or blank) prefix leaves the invocation unchanged.
    pub fn escalated(self, escalation: &str) -> Self {
        let mut words = escalation.split_whitespace();
        let Some(program) = words.next() else {
            return self;
        };
        let mut args: Vec<String> = words.map(str::to_string).collect();
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: program.to_string(),
            args,
        }
    }
}

/// Make a `sudo` prefix fail instead of prompting for a password.
///
/// The panel holds the terminal in raw mode, so a prompt would never be
/// answerable and would stall the worker. Other prefixes pass through.
pub fn non_interactive_escalation(escalation: &str) -> String {
    let mut words: Vec<&str> = escalation.split_whitespace().collect();
    let prompts = words.first() == Some(&"sudo")
        && !words
            .iter()
            .any(|w| *w == "-n" || *w == "--non-interactive");
    if prompts {
        words.insert(1, "-n");
    }
    words.join(" ")
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// stdout on success, stderr otherwise.
    pub fn text(&self) -> &str {
        if self.success {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and capture output. No timeout is applied.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Start a background process with null stdio and return immediately.
    async fn spawn_detached(&self, invocation: &Invocation) -> Result<()>;
}

/// Runs real processes with tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        tracing::debug!(command = %invocation, "Running command");

        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| SupervisorError::Wait {
                program: invocation.program.clone(),
                source,
            })?;

        tracing::debug!(command = %invocation, status = ?output.status, "Command finished");

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn spawn_detached(&self, invocation: &Invocation) -> Result<()> {
        // The daemon must outlive us, so no kill_on_drop; tokio reaps it if it exits first.
        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        tracing::info!(command = %invocation, pid = ?child.id(), "Spawned detached process");
        Ok(())
    }
}
