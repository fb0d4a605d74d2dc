use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::task::JoinSet;
use tracing::{debug, trace};

use crate::error::{AppError, AppResult, ValidationError};
use crate::http::{Transport, WorkItem};
use crate::metrics::{StatsAggregate, TransactionOutcome, TransactionSample};

use super::{ExecutionConfig, ProcessResult, Timer};

/// Runs virtual users against a transport and reports one [`ProcessResult`].
#[derive(Clone)]
pub struct ExecutionEngine {
    transport: Arc<dyn Transport>,
    timer: Arc<dyn Timer>,
}

impl ExecutionEngine {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, timer: Arc<dyn Timer>) -> Self {
        Self { transport, timer }
    }

    /// Runs `worker_count` virtual users to completion.
    ///
    /// Failed transactions are counted, never returned as errors.
    ///
    /// # Errors
    ///
    /// Returns an error when `items` is empty, the statistics cannot be
    /// updated, or a virtual user task panics.
    pub async fn execute(
        &self,
        mut items: Vec<WorkItem>,
        config: ExecutionConfig,
    ) -> AppResult<ProcessResult> {
        if items.is_empty() {
            return Err(AppError::validation(ValidationError::EmptyWorkItems));
        }
        if config.randomize_order {
            items.shuffle(&mut rand::thread_rng());
        }

        let executions = config.executions_per_user(items.len());
        let items: Arc<[WorkItem]> = items.into();
        let stats = Arc::new(StatsAggregate::new()?);
        debug!(
            "Starting {} virtual users x {} executions over {} work items",
            config.worker_count.get(),
            executions,
            items.len()
        );

        let started = self.timer.start();
        let mut users = JoinSet::new();
        for _ in 0..config.worker_count.get() {
            users.spawn(run_virtual_user(
                Arc::clone(&items),
                executions,
                Arc::clone(&self.transport),
                Arc::clone(&self.timer),
                Arc::clone(&stats),
            ));
        }
        // Dropping the set on error aborts the remaining users.
        while let Some(joined) = users.join_next().await {
            joined??;
        }
        let elapsed = self.timer.stop(started);

        let snapshot = stats.snapshot(elapsed)?;
        Ok(ProcessResult::from_snapshot(snapshot, elapsed))
    }
}

async fn run_virtual_user(
    items: Arc<[WorkItem]>,
    executions: usize,
    transport: Arc<dyn Transport>,
    timer: Arc<dyn Timer>,
    stats: Arc<StatsAggregate>,
) -> AppResult<()> {
    for index in 0..executions {
        let Some(item) = index.checked_rem(items.len()).and_then(|slot| items.get(slot)) else {
            continue;
        };

        stats.begin()?;
        let started = timer.start();
        let outcome = transport.execute(item).await;
        let response_time = timer.stop(started);

        let sample = match outcome {
            Ok(response) => TransactionSample {
                outcome: if response.is_failure() {
                    TransactionOutcome::Failure
                } else {
                    TransactionOutcome::Success
                },
                bytes_sent: response.bytes_sent,
                bytes_received: response.bytes_received,
                response_time,
            },
            Err(err) => {
                trace!("Transaction against {} failed: {}", item.url(), err);
                TransactionSample {
                    outcome: TransactionOutcome::Failure,
                    bytes_sent: 0,
                    bytes_received: 0,
                    response_time,
                }
            }
        };
        stats.complete(&sample)?;
    }
    Ok(())
}
