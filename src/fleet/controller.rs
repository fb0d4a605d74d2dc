use std::fmt;

use futures_util::future::join_all;
use tracing::{error, info};

use crate::engine::ProcessResult;
use crate::error::{AppError, AppResult, FleetError, FleetPhase};

use super::handle::{FleetJob, WorkerHandle};
use super::merge::{FleetResult, merge_results};

/// `Idle -> Starting -> Running -> Stopping -> Done`, or `Failed` from any
/// active phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetState {
    Idle,
    Starting,
    Running,
    Stopping,
    Done,
    Failed,
}

impl FleetState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FleetState::Idle => "idle",
            FleetState::Starting => "starting",
            FleetState::Running => "running",
            FleetState::Stopping => "stopping",
            FleetState::Done => "done",
            FleetState::Failed => "failed",
        }
    }
}

impl fmt::Display for FleetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives a fixed set of workers through exactly one run.
pub struct FleetController {
    handles: Vec<Box<dyn WorkerHandle>>,
    state: FleetState,
}

impl FleetController {
    #[must_use]
    pub fn new(handles: Vec<Box<dyn WorkerHandle>>) -> Self {
        Self {
            handles,
            state: FleetState::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> FleetState {
        self.state
    }

    /// Starts every worker, runs the job on all of them, stops them and
    /// merges their results. Each phase waits for every worker before the
    /// next one begins.
    ///
    /// # Errors
    ///
    /// Returns the first worker failure of the failing phase, tagged with
    /// the phase and worker label, and leaves the controller `Failed`. A
    /// controller that already ran, or has no workers, is rejected.
    pub async fn run(&mut self, job: &FleetJob) -> AppResult<FleetResult> {
        if self.state != FleetState::Idle {
            return Err(AppError::fleet(FleetError::ControllerReused {
                state: self.state.as_str(),
            }));
        }
        if self.handles.is_empty() {
            self.state = FleetState::Failed;
            return Err(AppError::fleet(FleetError::EmptyFleet));
        }

        let outcome = self.drive(job).await;
        if let Err(err) = &outcome {
            error!("Fleet run failed: {}", err);
            self.transition(FleetState::Failed);
        }
        outcome
    }

    async fn drive(&mut self, job: &FleetJob) -> AppResult<FleetResult> {
        self.transition(FleetState::Starting);
        let outcomes = join_all(self.handles.iter_mut().map(|handle| async move {
            let outcome = handle.start().await;
            (handle.label().to_owned(), outcome)
        }))
        .await;
        collect_phase(FleetPhase::Start, outcomes)?;

        self.transition(FleetState::Running);
        let outcomes = join_all(self.handles.iter_mut().map(|handle| async move {
            let outcome = handle.run(job).await;
            (handle.label().to_owned(), outcome)
        }))
        .await;
        let results: Vec<ProcessResult> = collect_phase(FleetPhase::Run, outcomes)?;

        self.transition(FleetState::Stopping);
        let outcomes = join_all(self.handles.iter_mut().map(|handle| async move {
            let outcome = handle.stop().await;
            (handle.label().to_owned(), outcome)
        }))
        .await;
        collect_phase(FleetPhase::Stop, outcomes)?;

        let merged = merge_results(&results)?;
        self.transition(FleetState::Done);
        Ok(merged)
    }

    fn transition(&mut self, next: FleetState) {
        info!("Fleet {} -> {}", self.state, next);
        self.state = next;
    }
}

fn collect_phase<T>(phase: FleetPhase, outcomes: Vec<(String, AppResult<T>)>) -> AppResult<Vec<T>> {
    let mut values = Vec::with_capacity(outcomes.len());
    for (worker, outcome) in outcomes {
        match outcome {
            Ok(value) => values.push(value),
            Err(err) => {
                return Err(AppError::fleet(FleetError::PhaseFailed {
                    phase,
                    worker,
                    source: Box::new(err),
                }));
            }
        }
    }
    Ok(values)
}
