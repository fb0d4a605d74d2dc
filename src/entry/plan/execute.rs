use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use crate::engine::{ExecutionEngine, SystemTimer};
use crate::error::AppResult;
use crate::fleet::{FleetController, FleetJob, ProcessWorker, WorkerHandle, announce_line};
use crate::http::{ReqwestTransport, load_work_items};
use crate::rpc::WorkerServer;
use crate::system::history::append_history;
use crate::system::shutdown_handlers::setup_signal_shutdown_handler;
use crate::system::summary_output::render_summary;

use super::types::{ControllerPlan, RunPlan, WorkerPlan};

pub(in crate::entry) async fn execute_plan(plan: RunPlan) -> AppResult<()> {
    match plan {
        RunPlan::Worker(plan) => run_worker(plan).await,
        RunPlan::Controller(plan) => run_controller(*plan).await,
    }
}

async fn run_worker(plan: WorkerPlan) -> AppResult<()> {
    let transport = ReqwestTransport::new(&plan.transport)?;
    let engine = ExecutionEngine::new(Arc::new(transport), Arc::new(SystemTimer));
    let server = WorkerServer::bind(&plan.host, plan.port, engine).await?;
    announce(server.local_addr())?;

    let signal_handle = setup_signal_shutdown_handler(&server.shutdown_handle());
    server.serve().await;
    signal_handle.abort();
    Ok(())
}

fn announce(addr: SocketAddr) -> AppResult<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", announce_line(addr))?;
    stdout.flush()?;
    Ok(())
}

async fn run_controller(plan: ControllerPlan) -> AppResult<()> {
    let items = load_work_items(&plan.urls)?;
    info!(
        "Loaded {} work items from {}",
        items.len(),
        plan.urls.display()
    );

    let handles: Vec<Box<dyn WorkerHandle>> = (0..plan.processes)
        .map(|index| {
            Box::new(ProcessWorker::new(
                format!("worker-{}", index),
                plan.launch.clone(),
                plan.timeouts,
            )) as Box<dyn WorkerHandle>
        })
        .collect();
    info!("Starting {} worker processes", handles.len());

    let mut controller = FleetController::new(handles);
    let job = FleetJob::new(items, plan.config);
    let result = controller.run(&job).await?;

    let rendered = render_summary(&result, plan.context, plan.output)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    drop(stdout);

    if let Some(path) = plan.history.as_deref() {
        // A lost history row never fails a finished run.
        if let Err(err) = append_history(path, &result, plan.context).await {
            warn!("Run history not recorded: {}", err);
        }
    }
    Ok(())
}
