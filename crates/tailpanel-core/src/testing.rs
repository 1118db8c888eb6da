// ABOUTME: Test doubles for supervisor tests.
// ABOUTME: A scripted fake daemon behind CommandRunner and an in-memory activity sink.

use crate::activity::{Activity, ActivitySink};
use crate::config::{Config, TimingConfig};
use crate::error::{Result, SupervisorError};
use crate::runner::{CommandOutput, CommandRunner, Invocation};
use crate::service::ServiceManager;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Simulates the daemon's process-table presence and the client's output.
pub struct FakeDaemon {
    pub running: AtomicBool,
    /// Whether a detached spawn actually brings the daemon up
    pub spawn_works: AtomicBool,
    /// Whether SIGTERM is honoured
    pub term_works: AtomicBool,
    /// Whether SIGKILL is honoured
    pub kill_works: AtomicBool,
    /// Whether the spawn itself errors (binary missing)
    pub spawn_errors: AtomicBool,
    pub status_text: Mutex<CommandOutput>,
    pub status_json: Mutex<CommandOutput>,
    pub up_output: Mutex<CommandOutput>,
    pub systemctl_output: Mutex<CommandOutput>,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeDaemon {
    pub fn new(running: bool) -> Self {
        Self {
            running: AtomicBool::new(running),
            spawn_works: AtomicBool::new(true),
            term_works: AtomicBool::new(true),
            kill_works: AtomicBool::new(true),
            spawn_errors: AtomicBool::new(false),
            status_text: Mutex::new(CommandOutput::ok("")),
            status_json: Mutex::new(CommandOutput::ok("")),
            up_output: Mutex::new(CommandOutput::ok("")),
            systemctl_output: Mutex::new(CommandOutput::ok("")),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn count_calls(&self, needle: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(needle)).count()
    }

    fn strip_sudo(invocation: &Invocation) -> Vec<String> {
        let mut words = vec![invocation.program.clone()];
        words.extend(invocation.args.iter().cloned());
        if words.first().map(String::as_str) == Some("sudo") {
            words.remove(0);
        }
        words
    }
}

#[async_trait]
impl CommandRunner for FakeDaemon {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        let words = Self::strip_sudo(invocation);
        let words: Vec<&str> = words.iter().map(String::as_str).collect();

        let output = match words.as_slice() {
            ["pgrep", "-x", _] => {
                if self.is_running() {
                    CommandOutput::ok("4242\n")
                } else {
                    CommandOutput::failed("")
                }
            }
            ["pkill", "-TERM", "-x", _] => {
                if self.term_works.load(Ordering::SeqCst) {
                    self.running.store(false, Ordering::SeqCst);
                }
                CommandOutput::ok("")
            }
            ["pkill", "-KILL", "-x", _] => {
                if self.kill_works.load(Ordering::SeqCst) {
                    self.running.store(false, Ordering::SeqCst);
                }
                CommandOutput::ok("")
            }
            ["systemctl", "start", _] => {
                self.running.store(true, Ordering::SeqCst);
                self.systemctl_output.lock().unwrap().clone()
            }
            ["systemctl", "stop", _] => {
                self.running.store(false, Ordering::SeqCst);
                self.systemctl_output.lock().unwrap().clone()
            }
            [_, "status", "--json"] => self.status_json.lock().unwrap().clone(),
            [_, "status"] => self.status_text.lock().unwrap().clone(),
            [_, "up"] | [_, "down"] => self.up_output.lock().unwrap().clone(),
            _ => CommandOutput::failed(format!("unexpected command: {}", invocation)),
        };
        Ok(output)
    }

    async fn spawn_detached(&self, invocation: &Invocation) -> Result<()> {
        self.calls.lock().unwrap().push(invocation.clone());
        if self.spawn_errors.load(Ordering::SeqCst) {
            return Err(SupervisorError::Spawn {
                program: invocation.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }
        if self.spawn_works.load(Ordering::SeqCst) {
            self.running.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Collects activity lines for assertions.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }
}

impl ActivitySink for MemorySink {
    fn record(&self, activity: Activity) {
        self.lines.lock().unwrap().push(activity.message);
    }
}

/// Direct process management with no waiting.
pub fn direct_config() -> Config {
    let mut config = Config::default();
    config.daemon.service_manager = ServiceManager::None;
    config.timing = TimingConfig::immediate();
    config
}

pub fn systemd_config() -> Config {
    let mut config = direct_config();
    config.daemon.service_manager = ServiceManager::Systemd;
    config
}
