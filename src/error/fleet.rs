use std::fmt;
use std::time::Duration;

use thiserror::Error;

use super::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetPhase {
    Start,
    Run,
    Stop,
}

impl fmt::Display for FleetPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FleetPhase::Start => "start",
            FleetPhase::Run => "run",
            FleetPhase::Stop => "stop",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("Timed out after {timeout:?} waiting for worker to become {stage}.")]
    ReadinessTimeout {
        stage: &'static str,
        timeout: Duration,
    },
    #[error("Timed out after {timeout:?} waiting for worker to acknowledge kill.")]
    ShutdownTimeout { timeout: Duration },
    #[error("Failed to spawn worker process: {source}")]
    SpawnFailed {
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to locate the worker executable: {source}")]
    ExecutableNotFound {
        #[source]
        source: std::io::Error,
    },
    #[error("Worker did not announce its listen address within {timeout:?}.")]
    AnnounceMissing { timeout: Duration },
    #[error("Worker announced an invalid address '{line}'.")]
    AnnounceInvalid { line: String },
    #[error("Worker {worker} is {state}, expected {expected}.")]
    InvalidHandleState {
        worker: String,
        state: &'static str,
        expected: &'static str,
    },
    #[error("Fleet {phase} phase failed on {worker}: {source}")]
    PhaseFailed {
        phase: FleetPhase,
        worker: String,
        #[source]
        source: Box<AppError>,
    },
    #[error("Fleet controller already used (state {state}).")]
    ControllerReused { state: &'static str },
    #[error("Fleet needs at least one worker.")]
    EmptyFleet,
    #[error("No process results to merge.")]
    NoResults,
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
