// ABOUTME: tailpanel-core library: supervises an installed mesh VPN daemon through shell commands
// ABOUTME: Re-exports the supervisor, status model, config and worker queue used by the front-ends

pub mod activity;
pub mod config;
pub mod error;
pub mod runner;
pub mod service;
pub mod status;
pub mod supervisor;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use activity::{Activity, ActivitySink, StdoutSink};
pub use config::Config;
pub use error::{Result, SupervisorError};
pub use runner::{
    non_interactive_escalation, CommandOutput, CommandRunner, Invocation, SystemRunner,
};
pub use service::ServiceManager;
pub use status::{ConnectionState, DaemonState, DeviceRecord, DeviceTable, StatusSnapshot};
pub use supervisor::{Outcome, Supervisor};
pub use worker::{Job, WorkerEvent, WorkerHandle};
