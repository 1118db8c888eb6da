// ABOUTME: Central application state and event handling
// ABOUTME: Mutations happen in handle_* methods; external work is returned as jobs for the worker

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;
use tailpanel_core::{Activity, DeviceTable, Job, StatusSnapshot, WorkerEvent};

const MAX_ACTIVITY: usize = 1000;

/// Actions the event loop must carry out (returned from handle_key)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Leave immediately without waiting for the worker
    Quit,
    /// Queue jobs on the supervisor worker, in order
    Submit(Vec<Job>),
}

pub struct App {
    pub daemon_name: String,

    // Latest refresh result; None until the first one lands
    pub snapshot: Option<StatusSnapshot>,

    // Activity log
    pub activity: Vec<Activity>,
    pub scroll_offset: usize,

    // Devices overlay; devices is None while loading
    pub show_devices: bool,
    pub devices: Option<DeviceTable>,

    // Worker bookkeeping
    pub pending_jobs: usize,
    refreshes_in_flight: usize,

    // Shutdown
    pub stop_on_exit: bool,
    pub quitting: bool,

    pub throbber_frame: usize,
    pub start_time: Instant,
}

impl App {
    pub fn new(daemon_name: impl Into<String>, stop_on_exit: bool) -> Self {
        Self {
            daemon_name: daemon_name.into(),
            snapshot: None,
            activity: vec![Activity::now("tailpanel started")],
            scroll_offset: 0,
            show_devices: false,
            devices: None,
            pending_jobs: 0,
            refreshes_in_flight: 0,
            stop_on_exit,
            quitting: false,
            throbber_frame: 0,
            start_time: Instant::now(),
        }
    }

    /// Advance throbber animation
    pub fn tick(&mut self) {
        self.throbber_frame = (self.throbber_frame + 1) % 8;
    }

    pub fn throbber_char(&self) -> char {
        const THROBBER: [char; 8] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧'];
        THROBBER[self.throbber_frame]
    }

    pub fn is_busy(&self) -> bool {
        self.pending_jobs > 0
    }

    pub fn refresh_in_flight(&self) -> bool {
        self.refreshes_in_flight > 0
    }

    /// Record that a job was queued on the worker.
    pub fn note_submitted(&mut self, job: Job) {
        self.pending_jobs += 1;
        if job == Job::Refresh {
            self.refreshes_in_flight += 1;
        }
    }

    /// Timer-driven refresh; skipped while one is still queued or running.
    pub fn on_refresh_tick(&mut self) -> Option<Job> {
        if self.quitting || self.refresh_in_flight() {
            return None;
        }
        Some(Job::Refresh)
    }

    pub fn push_activity(&mut self, activity: Activity) {
        self.activity.push(activity);
        if self.activity.len() > MAX_ACTIVITY {
            self.activity.remove(0);
        }
        // Keep a scrolled-back view anchored on the same lines
        if self.scroll_offset > 0 {
            self.scroll_offset = (self.scroll_offset + 1).min(self.activity.len().saturating_sub(1));
        }
    }

    /// Apply a worker event. Returns true once the worker has shut down.
    pub fn handle_worker_event(&mut self, event: WorkerEvent) -> bool {
        match event {
            WorkerEvent::Snapshot(snapshot) => {
                self.snapshot = Some(snapshot);
            }
            WorkerEvent::Devices(table) => {
                self.devices = Some(table);
            }
            WorkerEvent::Outcome { job, outcome } => {
                tracing::debug!(?job, ?outcome, "Job outcome");
            }
            WorkerEvent::Finished(job) => {
                self.pending_jobs = self.pending_jobs.saturating_sub(1);
                match job {
                    Job::Refresh => {
                        self.refreshes_in_flight = self.refreshes_in_flight.saturating_sub(1);
                    }
                    Job::Shutdown { .. } => return true,
                    _ => {}
                }
            }
        }
        false
    }

    /// Handle a key event, returning an action if needed
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            // A second Ctrl+C while the daemon is being stopped abandons the wait
            if self.quitting {
                return Some(Action::Quit);
            }
            return self.begin_quit();
        }

        if self.quitting {
            return None;
        }

        if self.show_devices {
            return self.handle_devices_key(key);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.begin_quit(),
            KeyCode::Char('s') => Some(Action::Submit(vec![Job::Toggle, Job::Refresh])),
            KeyCode::Char('c') => Some(Action::Submit(vec![Job::Connect, Job::Refresh])),
            KeyCode::Char('d') => Some(Action::Submit(vec![Job::Disconnect, Job::Refresh])),
            KeyCode::Char('r') => Some(Action::Submit(vec![Job::Refresh])),
            KeyCode::Char('v') => {
                self.show_devices = true;
                self.devices = None;
                Some(Action::Submit(vec![Job::FetchDevices]))
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_by(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
                None
            }
            KeyCode::PageUp => {
                self.scroll_by(10);
                None
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
                None
            }
            KeyCode::Home => {
                self.scroll_offset = self.activity.len().saturating_sub(1);
                None
            }
            KeyCode::End => {
                self.scroll_offset = 0;
                None
            }
            _ => None,
        }
    }

    fn handle_devices_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('v') => {
                self.show_devices = false;
                None
            }
            KeyCode::Char('r') => {
                self.devices = None;
                Some(Action::Submit(vec![Job::FetchDevices]))
            }
            _ => None,
        }
    }

    fn scroll_by(&mut self, lines: usize) {
        let max = self.activity.len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + lines).min(max);
    }

    fn begin_quit(&mut self) -> Option<Action> {
        self.quitting = true;
        self.show_devices = false;
        self.push_activity(Activity::now("Shutting down tailpanel..."));
        Some(Action::Submit(vec![Job::Shutdown {
            stop_daemon: self.stop_on_exit,
        }]))
    }
}
