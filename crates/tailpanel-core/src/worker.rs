// ABOUTME: Single-worker job queue that owns the Supervisor.
// ABOUTME: Jobs run strictly one at a time, so a refresh can never overlap a user action.

use crate::status::{DeviceTable, StatusSnapshot};
use crate::supervisor::{Outcome, Supervisor};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A unit of supervisor work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Start,
    Stop,
    /// Stop if running, start otherwise
    Toggle,
    Connect,
    Disconnect,
    /// Re-read both probes
    Refresh,
    FetchDevices,
    /// Optionally stop the daemon, then end the worker
    Shutdown { stop_daemon: bool },
}

/// Results flowing back from the worker, always ending with `Finished` per job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Outcome { job: Job, outcome: Outcome },
    Snapshot(StatusSnapshot),
    Devices(DeviceTable),
    Finished(Job),
}

/// Sending side of the job queue.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::UnboundedSender<Job>,
}

impl WorkerHandle {
    /// Spawn the worker task. The event receiver closes when the worker ends.
    pub fn spawn(
        supervisor: Supervisor,
    ) -> (Self, mpsc::UnboundedReceiver<WorkerEvent>, JoinHandle<()>) {
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(supervisor, job_rx, event_tx));
        (Self { tx: job_tx }, event_rx, task)
    }

    /// Queue a job. Returns false once the worker has shut down.
    pub fn submit(&self, job: Job) -> bool {
        self.tx.send(job).is_ok()
    }
}

async fn run(
    supervisor: Supervisor,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    events: mpsc::UnboundedSender<WorkerEvent>,
) {
    while let Some(job) = jobs.recv().await {
        tracing::debug!(?job, "Running job");

        match job {
            Job::Refresh => {
                let snapshot = supervisor.snapshot().await;
                let _ = events.send(WorkerEvent::Snapshot(snapshot));
            }
            Job::FetchDevices => {
                let devices = supervisor.fetch_devices().await;
                let _ = events.send(WorkerEvent::Devices(devices));
            }
            Job::Shutdown { stop_daemon } => {
                if stop_daemon {
                    let outcome = supervisor.stop().await;
                    let _ = events.send(WorkerEvent::Outcome { job, outcome });
                }
                let _ = events.send(WorkerEvent::Finished(job));
                break;
            }
            Job::Start | Job::Stop | Job::Toggle | Job::Connect | Job::Disconnect => {
                let outcome = match job {
                    Job::Start => supervisor.start().await,
                    Job::Stop => supervisor.stop().await,
                    Job::Toggle => supervisor.toggle().await,
                    Job::Connect => supervisor.connect_network().await,
                    _ => supervisor.disconnect_network().await,
                };
                let _ = events.send(WorkerEvent::Outcome { job, outcome });
            }
        }

        let _ = events.send(WorkerEvent::Finished(job));
    }

    tracing::debug!("Supervisor worker stopped");
}
