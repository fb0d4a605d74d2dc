use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::engine::{ExecutionConfig, ProcessResult};
use crate::error::{AppError, AppResult, FleetError};
use crate::http::WorkItem;

/// Lifecycle of one worker: `Starting -> Ready -> Running -> Stopping -> Dead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Starting,
    Ready,
    Running,
    Stopping,
    Dead,
}

impl WorkerState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            WorkerState::Starting => "starting",
            WorkerState::Ready => "ready",
            WorkerState::Running => "running",
            WorkerState::Stopping => "stopping",
            WorkerState::Dead => "dead",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What every worker in the fleet runs: the same items, the same shape.
#[derive(Debug, Clone)]
pub struct FleetJob {
    pub items: Arc<[WorkItem]>,
    pub config: ExecutionConfig,
}

impl FleetJob {
    #[must_use]
    pub fn new(items: Vec<WorkItem>, config: ExecutionConfig) -> Self {
        Self {
            items: items.into(),
            config,
        }
    }
}

/// One member of the fleet, driven through start, run and stop.
#[async_trait]
pub trait WorkerHandle: Send + Sync {
    fn label(&self) -> &str;

    fn state(&self) -> WorkerState;

    /// Brings the worker to `Ready`.
    async fn start(&mut self) -> AppResult<()>;

    /// Runs the job once and returns the worker's result.
    async fn run(&mut self, job: &FleetJob) -> AppResult<ProcessResult>;

    /// Shuts the worker down; it ends `Dead`.
    async fn stop(&mut self) -> AppResult<()>;
}

/// Error for a handle asked to act from the wrong lifecycle state.
pub(crate) fn invalid_state(
    worker: &str,
    state: WorkerState,
    expected: &'static str,
) -> AppError {
    AppError::fleet(FleetError::InvalidHandleState {
        worker: worker.to_owned(),
        state: state.as_str(),
        expected,
    })
}
