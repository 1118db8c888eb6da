// ABOUTME: Timestamped activity lines reported by the supervisor.
// ABOUTME: Sinks forward them to the TUI over a channel or print them for one-shot commands.

use chrono::{DateTime, Local};
use std::fmt;
use std::io::Write;
use tokio::sync::mpsc;

/// One human-readable line of supervisor activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl Activity {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

pub trait ActivitySink: Send + Sync {
    fn record(&self, activity: Activity);
}

impl ActivitySink for mpsc::UnboundedSender<Activity> {
    fn record(&self, activity: Activity) {
        // Receiver gone means the UI is shutting down
        let _ = self.send(activity);
    }
}

/// Prints each line to stdout as it happens.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ActivitySink for StdoutSink {
    fn record(&self, activity: Activity) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", activity);
    }
}
