// ABOUTME: Lifecycle control and probes for the external mesh daemon.
// ABOUTME: Every outcome is reported as an activity line; callers also get a coarse Outcome.

use crate::activity::{Activity, ActivitySink};
use crate::config::{Config, Connectivity};
use crate::runner::{CommandRunner, Invocation, SystemRunner};
use crate::status::{self, DeviceTable, StatusSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// What a lifecycle or network operation ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Started,
    AlreadyRunning,
    Stopped,
    NotRunning,
    /// The service manager succeeded but printed something
    Delegated { output: String },
    Connected,
    Disconnected,
    Failed,
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed)
    }
}

pub struct Supervisor {
    config: Config,
    service_managed: bool,
    runner: Arc<dyn CommandRunner>,
    sink: Arc<dyn ActivitySink>,
}

impl Supervisor {
    pub fn new(config: Config, runner: Arc<dyn CommandRunner>, sink: Arc<dyn ActivitySink>) -> Self {
        let service_managed = config.daemon.service_manager.is_systemd();
        tracing::debug!(
            daemon = %config.daemon.process,
            service_managed,
            "Supervisor configured"
        );
        Self {
            config,
            service_managed,
            runner,
            sink,
        }
    }

    /// Supervisor driving real processes.
    pub fn system(config: Config, sink: Arc<dyn ActivitySink>) -> Self {
        Self::new(config, Arc::new(SystemRunner), sink)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_service_managed(&self) -> bool {
        self.service_managed
    }

    fn daemon_name(&self) -> &str {
        &self.config.daemon.process
    }

    fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(%message, "activity");
        self.sink.record(Activity::now(message));
    }

    fn escalate(&self, invocation: Invocation) -> Invocation {
        invocation.escalated(&self.config.daemon.escalation)
    }

    fn cli(&self, args: &[&str]) -> Invocation {
        self.escalate(Invocation::new(&self.config.daemon.cli).args(args.iter().copied()))
    }

    fn systemctl(&self, verb: &str) -> Invocation {
        self.escalate(
            Invocation::new("systemctl")
                .arg(verb)
                .arg(&self.config.daemon.service),
        )
    }

    fn pkill(&self, signal: &str) -> Invocation {
        self.escalate(
            Invocation::new("pkill")
                .arg(signal)
                .arg("-x")
                .arg(self.daemon_name()),
        )
    }

    /// Run a command and reduce it to (success, text). Runner errors become text.
    async fn execute(&self, invocation: &Invocation) -> (bool, String) {
        match self.runner.run(invocation).await {
            Ok(output) => (output.success, output.text().to_string()),
            Err(e) => {
                tracing::warn!(command = %invocation, error = %e, "Command failed to run");
                (false, e.to_string())
            }
        }
    }

    /// Exact-name process table lookup. Lookup failures read as "not running".
    pub async fn probe_running(&self) -> bool {
        let probe = Invocation::new("pgrep").arg("-x").arg(self.daemon_name());
        match self.runner.run(&probe).await {
            Ok(output) => output.success,
            Err(e) => {
                tracing::debug!(error = %e, "pgrep unavailable, treating daemon as stopped");
                false
            }
        }
    }

    /// Connectivity as reported by the client; false whenever the daemon is down.
    pub async fn probe_connected(&self) -> bool {
        if !self.probe_running().await {
            return false;
        }
        self.client_reports_connected().await
    }

    /// Both probes, connection only consulted when the daemon is up.
    pub async fn snapshot(&self) -> StatusSnapshot {
        let running = self.probe_running().await;
        let connected = running && self.client_reports_connected().await;
        StatusSnapshot::new(running, connected)
    }

    /// Ask the client directly. Callers must have seen the daemon running.
    async fn client_reports_connected(&self) -> bool {
        if self.config.probe.connectivity == Connectivity::Json {
            let (_, json) = self.execute(&self.cli(&["status", "--json"])).await;
            if let Some(state) = status::backend_state(&json) {
                return state == "Running";
            }
            tracing::debug!("status --json unparseable, falling back to text heuristic");
        }

        let text = self.fetch_status().await;
        status::looks_connected(
            &text,
            &self.config.probe.address_prefix,
            &self.config.probe.logged_out_marker,
        )
    }

    /// Raw status text: stdout, stderr on failure, or the error message.
    pub async fn fetch_status(&self) -> String {
        self.execute(&self.cli(&["status"])).await.1
    }

    pub async fn fetch_devices(&self) -> DeviceTable {
        DeviceTable::parse(&self.fetch_status().await)
    }

    pub async fn start(&self) -> Outcome {
        let name = self.daemon_name().to_string();

        if self.service_managed {
            self.log(format!("Starting {} via systemd...", name));
        } else {
            self.log(format!("Starting {} daemon...", name));
        }

        if self.probe_running().await {
            self.log(format!("{} is already running", name));
            return Outcome::AlreadyRunning;
        }

        if self.service_managed {
            let (success, output) = self.execute(&self.systemctl("start")).await;
            return self.report_delegated(
                success,
                output,
                format!("{} started successfully", name),
                Outcome::Started,
            );
        }

        let spawn = self.escalate(
            Invocation::new(&name).args(self.config.daemon.args.iter().cloned()),
        );
        if let Err(e) = self.runner.spawn_detached(&spawn).await {
            self.log(format!("Failed to start {}: {}", name, e));
            return Outcome::Failed;
        }

        if self.wait_for(true, self.config.timing.start_timeout()).await {
            self.log(format!("{} started successfully", name));
            Outcome::Started
        } else {
            self.log(format!("Failed to start {}", name));
            Outcome::Failed
        }
    }

    pub async fn stop(&self) -> Outcome {
        let name = self.daemon_name().to_string();

        if !self.probe_running().await {
            self.log(format!("{} is not running", name));
            return Outcome::NotRunning;
        }

        if self.service_managed {
            self.log(format!("Stopping {} via systemd...", name));
            let (success, output) = self.execute(&self.systemctl("stop")).await;
            return self.report_delegated(
                success,
                output,
                format!("{} stopped successfully", name),
                Outcome::Stopped,
            );
        }

        self.log(format!("Stopping {} daemon...", name));
        let (_, term_output) = self.execute(&self.pkill("-TERM")).await;
        tracing::debug!(output = %term_output.trim(), "Sent SIGTERM");

        let mut stopped = self.wait_for(false, self.config.timing.stop_grace()).await;
        if !stopped {
            self.log(format!("Force stopping {}...", name));
            let (_, kill_output) = self.execute(&self.pkill("-KILL")).await;
            tracing::debug!(output = %kill_output.trim(), "Sent SIGKILL");
            stopped = self.wait_for(false, self.config.timing.kill_grace()).await;
        }

        if stopped {
            self.log(format!("{} stopped successfully", name));
            Outcome::Stopped
        } else {
            self.log(format!("Failed to stop {}", name));
            Outcome::Failed
        }
    }

    /// Stop if running, start otherwise.
    pub async fn toggle(&self) -> Outcome {
        if self.probe_running().await {
            self.stop().await
        } else {
            self.start().await
        }
    }

    pub async fn connect_network(&self) -> Outcome {
        self.log("Connecting to the mesh network...");
        let (success, output) = self.execute(&self.cli(&["up"])).await;
        self.report_network(
            success,
            output,
            "Connect",
            "Connected to the mesh network",
            Outcome::Connected,
        )
    }

    pub async fn disconnect_network(&self) -> Outcome {
        self.log("Disconnecting from the mesh network...");
        let (success, output) = self.execute(&self.cli(&["down"])).await;
        self.report_network(
            success,
            output,
            "Disconnect",
            "Disconnected from the mesh network",
            Outcome::Disconnected,
        )
    }

    fn report_delegated(
        &self,
        success: bool,
        output: String,
        done: String,
        outcome: Outcome,
    ) -> Outcome {
        let output = output.trim();
        if output.is_empty() {
            if success {
                self.log(done);
                return outcome;
            }
            self.log("Service manager reported failure");
            return Outcome::Failed;
        }

        self.log(format!("Service manager output: {}", output));
        if success {
            Outcome::Delegated {
                output: output.to_string(),
            }
        } else {
            Outcome::Failed
        }
    }

    fn report_network(
        &self,
        success: bool,
        output: String,
        label: &str,
        done: &str,
        outcome: Outcome,
    ) -> Outcome {
        let output = output.trim();
        if output.is_empty() {
            self.log(done);
        } else {
            self.log(format!("{} output: {}", label, output));
        }
        if success {
            outcome
        } else {
            Outcome::Failed
        }
    }

    /// Poll the process table until it matches `want_running` or the timeout passes.
    /// Always probes at least once.
    async fn wait_for(&self, want_running: bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.probe_running().await == want_running {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let interval = self.config.timing.probe_interval();
            tokio::time::sleep(interval.min(deadline - now)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutput;
    use crate::testing::{direct_config, systemd_config, FakeDaemon, MemorySink};
    use std::sync::atomic::Ordering;

    fn supervisor(config: Config, daemon: &Arc<FakeDaemon>, sink: &Arc<MemorySink>) -> Supervisor {
        Supervisor::new(config, daemon.clone(), sink.clone())
    }

    #[tokio::test]
    async fn test_probe_running_reflects_process_table() {
        let daemon = Arc::new(FakeDaemon::new(true));
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert!(sup.probe_running().await);
        daemon.running.store(false, Ordering::SeqCst);
        assert!(!sup.probe_running().await);
        assert_eq!(daemon.calls()[0], "pgrep -x tailscaled");
    }

    #[tokio::test]
    async fn test_probe_running_lookup_failure_is_false() {
        struct Broken;
        #[async_trait::async_trait]
        impl CommandRunner for Broken {
            async fn run(&self, invocation: &Invocation) -> crate::Result<CommandOutput> {
                Err(crate::SupervisorError::Spawn {
                    program: invocation.program.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                })
            }
            async fn spawn_detached(&self, _invocation: &Invocation) -> crate::Result<()> {
                Ok(())
            }
        }

        let sink = Arc::new(MemorySink::default());
        let sup = Supervisor::new(direct_config(), Arc::new(Broken), sink.clone());
        assert!(!sup.probe_running().await);
        assert!(sup.fetch_status().await.contains("failed to run sudo"));
    }

    #[tokio::test]
    async fn test_start_spawns_and_logs_success_once() {
        let daemon = Arc::new(FakeDaemon::new(false));
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert_eq!(sup.start().await, Outcome::Started);
        assert!(sup.probe_running().await);
        assert_eq!(sink.count_containing("started successfully"), 1);
        assert_eq!(sink.count_containing("Failed"), 0);
        assert_eq!(daemon.count_calls("sudo tailscaled"), 1);
    }

    #[tokio::test]
    async fn test_start_failure_logs_failed() {
        let daemon = Arc::new(FakeDaemon::new(false));
        daemon.spawn_works.store(false, Ordering::SeqCst);
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert_eq!(sup.start().await, Outcome::Failed);
        assert!(!sup.probe_running().await);
        assert_eq!(sink.count_containing("Failed to start tailscaled"), 1);
        assert_eq!(sink.count_containing("started successfully"), 0);
    }

    #[tokio::test]
    async fn test_start_spawn_error_is_reported() {
        let daemon = Arc::new(FakeDaemon::new(false));
        daemon.spawn_errors.store(true, Ordering::SeqCst);
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert_eq!(sup.start().await, Outcome::Failed);
        assert_eq!(sink.count_containing("Failed to start tailscaled"), 1);
    }

    #[tokio::test]
    async fn test_start_twice_is_idempotent() {
        let daemon = Arc::new(FakeDaemon::new(false));
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert_eq!(sup.start().await, Outcome::Started);
        assert_eq!(sup.start().await, Outcome::AlreadyRunning);
        assert_eq!(sink.count_containing("already running"), 1);
        assert_eq!(daemon.count_calls("sudo tailscaled"), 1);
    }

    #[tokio::test]
    async fn test_start_respects_daemon_args_and_no_escalation() {
        let daemon = Arc::new(FakeDaemon::new(false));
        let sink = Arc::new(MemorySink::default());
        let mut config = direct_config();
        config.daemon.escalation = String::new();
        config.daemon.args = vec!["--tun=userspace-networking".to_string()];
        let sup = supervisor(config, &daemon, &sink);

        sup.start().await;
        assert!(daemon
            .calls()
            .contains(&"tailscaled --tun=userspace-networking".to_string()));
    }

    #[tokio::test]
    async fn test_stop_when_not_running_does_not_signal() {
        let daemon = Arc::new(FakeDaemon::new(false));
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert_eq!(sup.stop().await, Outcome::NotRunning);
        assert_eq!(sink.lines(), vec!["tailscaled is not running".to_string()]);
        assert_eq!(daemon.count_calls("pkill"), 0);
        assert_eq!(daemon.count_calls("systemctl"), 0);
    }

    #[tokio::test]
    async fn test_stop_graceful() {
        let daemon = Arc::new(FakeDaemon::new(true));
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert_eq!(sup.stop().await, Outcome::Stopped);
        assert_eq!(daemon.count_calls("pkill -TERM -x tailscaled"), 1);
        assert_eq!(daemon.count_calls("pkill -KILL"), 0);
        assert_eq!(sink.count_containing("stopped successfully"), 1);
    }

    #[tokio::test]
    async fn test_stop_escalates_to_kill() {
        let daemon = Arc::new(FakeDaemon::new(true));
        daemon.term_works.store(false, Ordering::SeqCst);
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert_eq!(sup.stop().await, Outcome::Stopped);
        assert_eq!(daemon.count_calls("pkill -KILL -x tailscaled"), 1);
        assert_eq!(sink.count_containing("Force stopping tailscaled"), 1);
        assert!(!daemon.is_running());
    }

    #[tokio::test]
    async fn test_systemd_start_and_stop() {
        let daemon = Arc::new(FakeDaemon::new(false));
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(systemd_config(), &daemon, &sink);

        assert_eq!(sup.start().await, Outcome::Started);
        assert_eq!(daemon.count_calls("sudo systemctl start tailscaled"), 1);
        assert_eq!(sink.count_containing("Starting tailscaled via systemd"), 1);

        assert_eq!(sup.stop().await, Outcome::Stopped);
        assert_eq!(daemon.count_calls("sudo systemctl stop tailscaled"), 1);
        assert_eq!(daemon.count_calls("pkill"), 0);
    }

    #[tokio::test]
    async fn test_systemd_output_is_reported() {
        let daemon = Arc::new(FakeDaemon::new(false));
        *daemon.systemctl_output.lock().unwrap() =
            CommandOutput::failed("Failed to start tailscaled.service: Unit not found.\n");
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(systemd_config(), &daemon, &sink);

        assert_eq!(sup.start().await, Outcome::Failed);
        assert_eq!(
            sink.lines().last().unwrap(),
            "Service manager output: Failed to start tailscaled.service: Unit not found."
        );
    }

    #[tokio::test]
    async fn test_connect_and_disconnect_messages() {
        let daemon = Arc::new(FakeDaemon::new(true));
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert_eq!(sup.connect_network().await, Outcome::Connected);
        assert_eq!(sink.count_containing("Connected to the mesh network"), 1);

        *daemon.up_output.lock().unwrap() = CommandOutput::ok(
            "\nTo authenticate, visit:\n\n\thttps://login.tailscale.com/a/abc123\n\n",
        );
        assert_eq!(sup.disconnect_network().await, Outcome::Disconnected);
        assert_eq!(
            sink.lines().last().unwrap(),
            "Disconnect output: To authenticate, visit:\n\n\thttps://login.tailscale.com/a/abc123"
        );
        assert_eq!(daemon.count_calls("sudo tailscale up"), 1);
        assert_eq!(daemon.count_calls("sudo tailscale down"), 1);
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let daemon = Arc::new(FakeDaemon::new(false));
        *daemon.up_output.lock().unwrap() =
            CommandOutput::failed("failed to connect to local tailscaled\n");
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert_eq!(sup.connect_network().await, Outcome::Failed);
        assert_eq!(
            sink.lines().last().unwrap(),
            "Connect output: failed to connect to local tailscaled"
        );
    }

    #[tokio::test]
    async fn test_fetch_status_passes_through() {
        let daemon = Arc::new(FakeDaemon::new(true));
        *daemon.status_text.lock().unwrap() =
            CommandOutput::ok("100.64.0.1 host-a alice linux -\n");
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert_eq!(sup.fetch_status().await, "100.64.0.1 host-a alice linux -\n");
        assert_eq!(sup.fetch_devices().await.len(), 1);

        *daemon.status_text.lock().unwrap() = CommandOutput::failed("Logged out.\n");
        assert_eq!(sup.fetch_status().await, "Logged out.\n");
        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn test_probe_connected_prefers_json() {
        let daemon = Arc::new(FakeDaemon::new(true));
        *daemon.status_json.lock().unwrap() = CommandOutput::ok(r#"{"BackendState":"Running"}"#);
        // Text output alone would say disconnected
        *daemon.status_text.lock().unwrap() = CommandOutput::ok("Logged out.");
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert!(sup.probe_connected().await);

        *daemon.status_json.lock().unwrap() = CommandOutput::ok(r#"{"BackendState":"Stopped"}"#);
        assert!(!sup.probe_connected().await);
        assert_eq!(daemon.count_calls("tailscale status --json"), 2);
        assert!(!daemon.calls().contains(&"sudo tailscale status".to_string()));
    }

    #[tokio::test]
    async fn test_probe_connected_falls_back_to_text() {
        let daemon = Arc::new(FakeDaemon::new(true));
        *daemon.status_json.lock().unwrap() = CommandOutput::failed("unknown flag: --json");
        *daemon.status_text.lock().unwrap() =
            CommandOutput::ok("100.64.0.1 host-a alice linux -\n");
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert!(sup.probe_connected().await);

        *daemon.status_text.lock().unwrap() = CommandOutput::ok("Logged out.\n");
        assert!(!sup.probe_connected().await);
    }

    #[tokio::test]
    async fn test_text_mode_skips_json() {
        let daemon = Arc::new(FakeDaemon::new(true));
        *daemon.status_text.lock().unwrap() =
            CommandOutput::ok("100.64.0.1 host-a alice linux -\n");
        let sink = Arc::new(MemorySink::default());
        let mut config = direct_config();
        config.probe.connectivity = Connectivity::Text;
        let sup = supervisor(config, &daemon, &sink);

        assert!(sup.probe_connected().await);
        assert_eq!(daemon.count_calls("--json"), 0);
    }

    #[tokio::test]
    async fn test_snapshot_skips_connectivity_when_stopped() {
        let daemon = Arc::new(FakeDaemon::new(false));
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        let snapshot = sup.snapshot().await;
        assert_eq!(snapshot.connection, crate::ConnectionState::DaemonOffline);
        assert_eq!(daemon.calls(), vec!["pgrep -x tailscaled".to_string()]);
    }

    #[tokio::test]
    async fn test_start_logs_intent_before_already_running() {
        let daemon = Arc::new(FakeDaemon::new(true));
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert_eq!(sup.start().await, Outcome::AlreadyRunning);
        assert_eq!(
            sink.lines(),
            vec![
                "Starting tailscaled daemon...".to_string(),
                "tailscaled is already running".to_string(),
            ]
        );
        assert_eq!(daemon.count_calls("sudo tailscaled"), 0);
    }

    #[tokio::test]
    async fn test_probe_connected_false_when_stopped() {
        let daemon = Arc::new(FakeDaemon::new(false));
        // A failing client whose error text happens to contain a mesh address
        *daemon.status_json.lock().unwrap() =
            CommandOutput::failed("dial 100.100.100.100: connection refused");
        *daemon.status_text.lock().unwrap() =
            CommandOutput::failed("dial 100.100.100.100: connection refused");
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert!(!sup.probe_connected().await);
        assert_eq!(daemon.calls(), vec!["pgrep -x tailscaled".to_string()]);
    }

    #[tokio::test]
    async fn test_stop_failure_logs_failed() {
        let daemon = Arc::new(FakeDaemon::new(true));
        daemon.term_works.store(false, Ordering::SeqCst);
        daemon.kill_works.store(false, Ordering::SeqCst);
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert_eq!(sup.stop().await, Outcome::Failed);
        assert_eq!(sink.count_containing("Failed to stop tailscaled"), 1);
        assert_eq!(sink.count_containing("Force stopping tailscaled"), 1);
        assert_eq!(sink.count_containing("stopped successfully"), 0);
        assert_eq!(daemon.count_calls("pkill -KILL -x tailscaled"), 1);
        assert!(daemon.is_running());
    }

    #[tokio::test]
    async fn test_toggle_flips_state() {
        let daemon = Arc::new(FakeDaemon::new(false));
        let sink = Arc::new(MemorySink::default());
        let sup = supervisor(direct_config(), &daemon, &sink);

        assert_eq!(sup.toggle().await, Outcome::Started);
        assert_eq!(sup.toggle().await, Outcome::Stopped);
        assert!(!daemon.is_running());
    }
}
