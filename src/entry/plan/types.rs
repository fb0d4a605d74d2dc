use std::path::PathBuf;

use crate::args::OutputFormat;
use crate::engine::ExecutionConfig;
use crate::fleet::{FleetTimeouts, WorkerLaunch};
use crate::http::TransportSettings;
use crate::system::summary_output::SummaryContext;

pub(in crate::entry) struct WorkerPlan {
    pub(super) host: String,
    pub(super) port: u16,
    pub(super) transport: TransportSettings,
}

pub(in crate::entry) struct ControllerPlan {
    pub(super) urls: PathBuf,
    pub(super) processes: usize,
    pub(super) config: ExecutionConfig,
    pub(super) launch: WorkerLaunch,
    pub(super) timeouts: FleetTimeouts,
    pub(super) output: OutputFormat,
    pub(super) context: SummaryContext,
    pub(super) history: Option<PathBuf>,
}

pub(in crate::entry) enum RunPlan {
    Worker(WorkerPlan),
    Controller(Box<ControllerPlan>),
}
