use std::path::PathBuf;

use crate::args::{DEFAULT_USER_AGENT, VolleyArgs};
use crate::engine::ExecutionConfig;
use crate::error::{AppError, AppResult, ValidationError};
use crate::fleet::WorkerLaunch;
use crate::http::TransportSettings;
use crate::rpc::wire_worker_count;
use crate::system::summary_output::SummaryContext;

use super::types::{ControllerPlan, RunPlan, WorkerPlan};

pub(in crate::entry) fn build_plan(args: VolleyArgs) -> AppResult<RunPlan> {
    if args.server {
        return Ok(RunPlan::Worker(WorkerPlan {
            transport: transport_settings(&args),
            host: args.server_host,
            port: args.server_port,
        }));
    }

    let Some(urls) = args.urls.as_deref() else {
        return Err(AppError::validation(ValidationError::MissingUrlFile));
    };
    // Workers receive the count as i32; fail before spawning anything.
    wire_worker_count(args.worker_count)?;
    let launch = WorkerLaunch::current(&args)?;
    Ok(RunPlan::Controller(Box::new(ControllerPlan {
        urls: PathBuf::from(urls),
        processes: args.processes.get(),
        config: ExecutionConfig {
            worker_count: args.worker_count,
            iterations: args.iterations,
            randomize_order: args.random,
        },
        launch,
        timeouts: args.fleet_timeouts,
        output: args.output,
        context: SummaryContext {
            worker_count: args.worker_count.get(),
            random: args.random,
        },
        history: (!args.no_history).then(|| PathBuf::from(&args.history)),
    })))
}

fn transport_settings(args: &VolleyArgs) -> TransportSettings {
    TransportSettings {
        request_timeout: args.request_timeout,
        connect_timeout: args.connect_timeout,
        user_agent: DEFAULT_USER_AGENT.to_owned(),
    }
}
