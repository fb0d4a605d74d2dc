use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;

use super::handle::invalid_state;
use super::process::worker_arguments;
use super::*;
use crate::args::{PositiveUsize, VolleyArgs};
use crate::engine::test_support::{ScriptedTransport, work_items};
use crate::engine::{ExecutionConfig, ExecutionEngine, FixedTimer, ProcessResult};
use crate::error::{AppError, AppResult, FleetError, FleetPhase, RpcError};

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::fleet(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

fn run_paused_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .map_err(|err| AppError::fleet(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

#[expect(clippy::float_arithmetic, reason = "Tolerance check on reported floats.")]
fn approx_eq(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

type Journal = Arc<Mutex<Vec<String>>>;

/// In-process worker running the engine against a scripted transport.
struct FakeHandle {
    label: String,
    state: WorkerState,
    engine: ExecutionEngine,
    fail_on: Option<FleetPhase>,
    journal: Journal,
}

impl FakeHandle {
    fn boxed(index: usize, fail_on: Option<FleetPhase>, journal: &Journal) -> Box<dyn WorkerHandle> {
        Box::new(Self {
            label: format!("worker-{}", index),
            state: WorkerState::Starting,
            engine: ExecutionEngine::new(
                Arc::new(ScriptedTransport::ok()),
                Arc::new(FixedTimer(Duration::from_millis(2))),
            ),
            fail_on,
            journal: Arc::clone(journal),
        })
    }

    fn record(&self, phase: &str) {
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(format!("{}:{}", phase, self.label));
        }
    }
}

#[async_trait]
impl WorkerHandle for FakeHandle {
    fn label(&self) -> &str {
        &self.label
    }

    fn state(&self) -> WorkerState {
        self.state
    }

    async fn start(&mut self) -> AppResult<()> {
        self.record("start");
        if self.fail_on == Some(FleetPhase::Start) {
            self.state = WorkerState::Dead;
            return Err(AppError::fleet(FleetError::ReadinessTimeout {
                stage: "healthy",
                timeout: Duration::from_secs(1),
            }));
        }
        self.state = WorkerState::Ready;
        Ok(())
    }

    async fn run(&mut self, job: &FleetJob) -> AppResult<ProcessResult> {
        self.record("run");
        if self.state != WorkerState::Ready {
            return Err(invalid_state(&self.label, self.state, "ready"));
        }
        if self.fail_on == Some(FleetPhase::Run) {
            self.state = WorkerState::Dead;
            return Err(AppError::rpc(RpcError::Unavailable { context: "run" }));
        }
        self.state = WorkerState::Running;
        self.engine.execute(job.items.to_vec(), job.config).await
    }

    async fn stop(&mut self) -> AppResult<()> {
        self.record("stop");
        if self.fail_on == Some(FleetPhase::Stop) {
            self.state = WorkerState::Dead;
            return Err(AppError::fleet(FleetError::ShutdownTimeout {
                timeout: Duration::from_secs(1),
            }));
        }
        self.state = WorkerState::Dead;
        Ok(())
    }
}

fn fleet(count: usize, failing: Option<(usize, FleetPhase)>, journal: &Journal) -> FleetController {
    let handles = (0..count)
        .map(|index| {
            let fail_on = failing
                .filter(|(failing_index, _)| *failing_index == index)
                .map(|(_, phase)| phase);
            FakeHandle::boxed(index, fail_on, journal)
        })
        .collect();
    FleetController::new(handles)
}

fn job(lines: usize, workers: usize, iterations: i32) -> AppResult<FleetJob> {
    Ok(FleetJob::new(
        work_items(lines)?,
        ExecutionConfig {
            worker_count: PositiveUsize::try_from(workers)?,
            iterations,
            randomize_order: false,
        },
    ))
}

fn journal_entries(journal: &Journal) -> Vec<String> {
    journal
        .lock()
        .map(|entries| entries.clone())
        .unwrap_or_default()
}

fn phase_positions(entries: &[String], phase: &str) -> Vec<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.starts_with(phase))
        .map(|(position, _)| position)
        .collect()
}

#[test]
fn controller_runs_phases_in_order_and_merges() -> AppResult<()> {
    run_async_test(async {
        let journal = Journal::default();
        let mut controller = fleet(3, None, &journal);
        let result = controller.run(&job(2, 2, 3)?).await?;
        if controller.state() != FleetState::Done {
            return Err(AppError::fleet(format!(
                "Unexpected state: {}",
                controller.state()
            )));
        }
        if result.processes != 3 || result.transactions != 18 {
            return Err(AppError::fleet(format!(
                "Unexpected totals: {} processes, {} transactions",
                result.processes, result.transactions
            )));
        }
        let entries = journal_entries(&journal);
        let starts = phase_positions(&entries, "start:");
        let runs = phase_positions(&entries, "run:");
        let stops = phase_positions(&entries, "stop:");
        if starts.len() != 3 || runs.len() != 3 || stops.len() != 3 {
            return Err(AppError::fleet(format!("Unexpected journal: {:?}", entries)));
        }
        let ordered = starts.iter().max() < runs.iter().min()
            && runs.iter().max() < stops.iter().min();
        if !ordered {
            return Err(AppError::fleet(format!("Phases overlapped: {:?}", entries)));
        }
        Ok(())
    })
}

#[test]
fn phase_failures_abort_the_fleet() -> AppResult<()> {
    run_async_test(async {
        let cases = [
            (FleetPhase::Start, "run:"),
            (FleetPhase::Run, "stop:"),
            (FleetPhase::Stop, "never"),
        ];
        for (failing_phase, skipped_phase) in cases {
            let journal = Journal::default();
            let mut controller = fleet(3, Some((1, failing_phase)), &journal);
            match controller.run(&job(1, 1, 1)?).await {
                Err(AppError::Fleet(FleetError::PhaseFailed { phase, worker, .. }))
                    if phase == failing_phase && worker == "worker-1" => {}
                Err(err) => {
                    return Err(AppError::fleet(format!("Unexpected error: {}", err)));
                }
                Ok(_) => {
                    return Err(AppError::fleet(format!(
                        "Expected {} failure to abort the run",
                        failing_phase
                    )));
                }
            }
            if controller.state() != FleetState::Failed {
                return Err(AppError::fleet(format!(
                    "Unexpected state after {} failure: {}",
                    failing_phase,
                    controller.state()
                )));
            }
            let entries = journal_entries(&journal);
            if !phase_positions(&entries, skipped_phase).is_empty() {
                return Err(AppError::fleet(format!(
                    "Fleet continued after {} failure: {:?}",
                    failing_phase, entries
                )));
            }
        }
        Ok(())
    })
}

#[test]
fn controller_runs_only_once() -> AppResult<()> {
    run_async_test(async {
        let journal = Journal::default();
        let mut controller = fleet(1, None, &journal);
        let fleet_job = job(1, 1, 1)?;
        controller.run(&fleet_job).await?;
        match controller.run(&fleet_job).await {
            Err(AppError::Fleet(FleetError::ControllerReused { state: "done" })) => Ok(()),
            Err(err) => Err(AppError::fleet(format!("Unexpected error: {}", err))),
            Ok(_) => Err(AppError::fleet("Expected reuse to be rejected")),
        }
    })
}

#[test]
fn empty_fleet_is_rejected() -> AppResult<()> {
    run_async_test(async {
        let mut controller = FleetController::new(Vec::new());
        match controller.run(&job(1, 1, 1)?).await {
            Err(AppError::Fleet(FleetError::EmptyFleet)) => {}
            Err(err) => return Err(AppError::fleet(format!("Unexpected error: {}", err))),
            Ok(_) => return Err(AppError::fleet("Expected empty fleet to fail")),
        }
        if controller.state() != FleetState::Failed {
            return Err(AppError::fleet("Expected failed state"));
        }
        Ok(())
    })
}

fn process_result(
    transactions: u64,
    failures: u64,
    shortest_ms: Option<u64>,
    longest_ms: u64,
    rate: f64,
) -> ProcessResult {
    let successes = transactions.saturating_sub(failures);
    ProcessResult {
        transactions,
        successful_transactions: successes,
        failed_transactions: failures,
        total_bytes_sent: transactions.saturating_mul(96),
        total_bytes_received: transactions.saturating_mul(38),
        average_response_time: Duration::from_millis(longest_ms.saturating_sub(1)),
        longest_transaction: Duration::from_millis(longest_ms),
        shortest_transaction: shortest_ms.map(Duration::from_millis),
        transaction_rate: rate,
        data_send_rate: rate,
        data_receive_rate: rate,
        concurrency_rate: rate,
        availability: crate::engine::availability(successes, failures, transactions),
        elapsed_time: Duration::from_millis(longest_ms.saturating_mul(10)),
    }
}

#[test]
fn merge_sums_counters() -> AppResult<()> {
    let results = [
        process_result(2, 0, Some(3), 10, 1.0),
        process_result(3, 1, Some(4), 20, 2.0),
        process_result(5, 0, Some(5), 30, 3.0),
    ];
    let merged = merge_results(&results)?;
    if merged.transactions != 10 || merged.failed_transactions != 1 {
        return Err(AppError::fleet(format!(
            "Unexpected counters: {}/{}",
            merged.transactions, merged.failed_transactions
        )));
    }
    if merged.successful_transactions != 9 || merged.total_bytes_sent != 960 {
        return Err(AppError::fleet(format!(
            "Unexpected sums: {}/{}",
            merged.successful_transactions, merged.total_bytes_sent
        )));
    }
    if merged.longest_transaction != Duration::from_millis(30)
        || merged.shortest_transaction != Some(Duration::from_millis(3))
        || merged.elapsed_time != Duration::from_millis(300)
    {
        return Err(AppError::fleet(format!("Unexpected extrema: {:?}", merged)));
    }
    if merged.average_response_time != Duration::from_millis(19) {
        return Err(AppError::fleet(format!(
            "Unexpected average: {:?}",
            merged.average_response_time
        )));
    }
    if !approx_eq(merged.transaction_rate, 2.0) {
        return Err(AppError::fleet(format!(
            "Unexpected rate: {}",
            merged.transaction_rate
        )));
    }
    Ok(())
}

#[test]
fn merge_is_order_independent() -> AppResult<()> {
    let first = process_result(7, 2, Some(1), 11, 0.1);
    let second = process_result(13, 0, None, 0, 0.7);
    let third = process_result(4, 4, Some(9), 42, 1.0 / 3.0);
    let orders = [
        [&first, &second, &third],
        [&first, &third, &second],
        [&second, &first, &third],
        [&second, &third, &first],
        [&third, &first, &second],
        [&third, &second, &first],
    ];
    let baseline = merge_results(&[first.clone(), second.clone(), third.clone()])?;
    for order in orders {
        let permuted: Vec<ProcessResult> = order.into_iter().cloned().collect();
        let merged = merge_results(&permuted)?;
        if merged != baseline {
            return Err(AppError::fleet(format!(
                "Merge depends on order: {:?} vs {:?}",
                merged, baseline
            )));
        }
    }
    Ok(())
}

#[test]
fn merge_shortest_ignores_idle_processes() -> AppResult<()> {
    let merged = merge_results(&[
        process_result(0, 0, None, 0, 0.0),
        process_result(3, 0, Some(8), 12, 1.0),
    ])?;
    if merged.shortest_transaction != Some(Duration::from_millis(8)) {
        return Err(AppError::fleet(format!(
            "Unexpected shortest: {:?}",
            merged.shortest_transaction
        )));
    }
    let idle = merge_results(&[process_result(0, 0, None, 0, 0.0)])?;
    if idle.shortest_transaction.is_some() {
        return Err(AppError::fleet("Expected no shortest transaction"));
    }
    if !approx_eq(idle.availability, 1.0) {
        return Err(AppError::fleet("Expected idle fleet to be fully available"));
    }
    Ok(())
}

#[test]
fn merge_of_nothing_fails() -> AppResult<()> {
    match merge_results(&[]) {
        Err(FleetError::NoResults) => Ok(()),
        Err(err) => Err(AppError::fleet(format!("Unexpected error: {}", err))),
        Ok(_) => Err(AppError::fleet("Expected empty merge to fail")),
    }
}

#[test]
fn poller_accepts_only_before_timeout() -> AppResult<()> {
    run_paused_test(async {
        let poller = ReadinessPoller::new(Duration::from_millis(100), Duration::from_millis(10));
        let cases: [(u32, bool); 5] = [(0, true), (1, true), (9, true), (10, false), (25, false)];
        for (retries, expect_ready) in cases {
            let mut calls: u32 = 0;
            let outcome = poller
                .wait_until(|| {
                    calls = calls.saturating_add(1);
                    let ready = calls > retries;
                    async move { ready }
                })
                .await;
            match (outcome, expect_ready) {
                (Ok(attempts), true) if attempts == retries.saturating_add(1) => {}
                (Err(elapsed), false) if elapsed.timeout == poller.timeout => {}
                (unexpected, _) => {
                    return Err(AppError::fleet(format!(
                        "Ready after {} retries: unexpected outcome {:?}",
                        retries, unexpected
                    )));
                }
            }
        }
        Ok(())
    })
}

#[test]
fn poller_waits_one_backoff_between_attempts() -> AppResult<()> {
    run_paused_test(async {
        let poller = ReadinessPoller::new(Duration::from_secs(1), Duration::from_millis(250));
        let started = tokio::time::Instant::now();
        let outcome = poller.wait_until(|| async { false }).await;
        let waited = started.elapsed();
        match outcome {
            Err(elapsed) if elapsed.attempts == 4 => {}
            Err(elapsed) => {
                return Err(AppError::fleet(format!(
                    "Unexpected attempts: {}",
                    elapsed.attempts
                )));
            }
            Ok(_) => return Err(AppError::fleet("Expected poller to time out")),
        }
        if waited != Duration::from_secs(1) {
            return Err(AppError::fleet(format!("Unexpected wait: {:?}", waited)));
        }
        Ok(())
    })
}

#[test]
fn worker_arguments_forward_execution_options() -> AppResult<()> {
    let args = VolleyArgs::try_parse_from([
        "volley",
        "--request-timeout",
        "2s",
        "--connect-timeout",
        "150ms",
        "--server-host",
        "0.0.0.0",
        "-v",
    ])?;
    let forwarded = worker_arguments(&args);
    let expected = [
        "--server",
        "--server-host",
        "0.0.0.0",
        "--server-port",
        "0",
        "--request-timeout",
        "2000ms",
        "--connect-timeout",
        "150ms",
        "--verbose",
    ];
    if forwarded.get(..expected.len()) != Some(&expected.map(str::to_owned)[..]) {
        return Err(AppError::fleet(format!(
            "Unexpected worker arguments: {:?}",
            forwarded
        )));
    }
    let reparsed = VolleyArgs::try_parse_from(
        std::iter::once("volley".to_owned()).chain(forwarded.iter().cloned()),
    )?;
    if !reparsed.server || reparsed.request_timeout != Duration::from_secs(2) {
        return Err(AppError::fleet("Worker arguments did not parse back"));
    }
    Ok(())
}

#[test]
fn announce_line_carries_address() -> AppResult<()> {
    let addr: std::net::SocketAddr = "127.0.0.1:40123"
        .parse()
        .map_err(|_err| AppError::fleet("Invalid test address"))?;
    let line = announce_line(addr);
    let parsed = line
        .strip_prefix(ANNOUNCE_PREFIX)
        .and_then(|rest| rest.parse::<std::net::SocketAddr>().ok());
    if parsed != Some(addr) {
        return Err(AppError::fleet(format!("Unexpected announcement: {}", line)));
    }
    Ok(())
}

#[test]
fn fleet_timeouts_default_to_documented_bounds() -> AppResult<()> {
    let timeouts = FleetTimeouts::default();
    if timeouts.announce != Duration::from_secs(10)
        || timeouts.connect != ReadinessPoller::new(Duration::from_secs(1), Duration::from_millis(10))
        || timeouts.ready != ReadinessPoller::new(Duration::from_secs(10), Duration::from_millis(250))
        || timeouts.stop != ReadinessPoller::new(Duration::from_secs(10), Duration::from_millis(250))
    {
        return Err(AppError::fleet(format!("Unexpected defaults: {:?}", timeouts)));
    }
    Ok(())
}

#[test]
fn poller_bounds_a_check_that_never_resolves() -> AppResult<()> {
    run_paused_test(async {
        let poller = ReadinessPoller::new(Duration::from_secs(1), Duration::from_millis(100));
        let started = tokio::time::Instant::now();
        let outcome = tokio::time::timeout(
            Duration::from_secs(60),
            poller.wait_until(std::future::pending::<bool>),
        )
        .await
        .map_err(|_elapsed| AppError::fleet("Poller ignored its timeout for a stuck check"))?;
        match outcome {
            Err(elapsed) if elapsed.attempts == 1 && elapsed.timeout == poller.timeout => {}
            Err(elapsed) => {
                return Err(AppError::fleet(format!(
                    "Unexpected poll outcome: {:?}",
                    elapsed
                )));
            }
            Ok(attempts) => {
                return Err(AppError::fleet(format!(
                    "Stuck check reported ready after {} attempts",
                    attempts
                )));
            }
        }
        if started.elapsed() != Duration::from_secs(1) {
            return Err(AppError::fleet(format!(
                "Unexpected wait: {:?}",
                started.elapsed()
            )));
        }
        Ok(())
    })
}
