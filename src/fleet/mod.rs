//! Worker fleet orchestration: readiness polling, worker handles, the
//! controller state machine and result merging.
mod controller;
mod handle;
mod merge;
mod poller;
mod process;
mod settings;

#[cfg(test)]
mod tests;

pub use controller::{FleetController, FleetState};
pub use handle::{FleetJob, WorkerHandle, WorkerState};
pub use merge::{FleetResult, merge_results};
pub use poller::{PollElapsed, ReadinessPoller};
pub use process::{ANNOUNCE_PREFIX, ProcessWorker, WorkerLaunch, announce_line};
pub use settings::FleetTimeouts;
