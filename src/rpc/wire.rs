use std::time::Duration;

use crate::args::PositiveUsize;
use crate::engine::{ExecutionConfig, ProcessResult};
use crate::error::ValidationError;
use crate::http::WorkItem;

use super::protocol::{RunRequest, WireProcessResult};

/// Virtual-user count as carried on the wire.
///
/// # Errors
///
/// Returns an error when the count does not fit the wire's `i32`.
pub fn wire_worker_count(worker_count: PositiveUsize) -> Result<i32, ValidationError> {
    i32::try_from(worker_count.get()).map_err(|_err| ValidationError::ValueTooLarge {
        max: i32::MAX.unsigned_abs().into(),
    })
}

/// Builds the Run request a worker process needs to replay `items`.
///
/// # Errors
///
/// Returns an error when the worker count does not fit the wire format.
pub fn run_request(
    items: &[WorkItem],
    config: &ExecutionConfig,
) -> Result<RunRequest, ValidationError> {
    Ok(RunRequest {
        iterations: config.iterations,
        lines: items.iter().map(|item| item.line().to_owned()).collect(),
        random: config.randomize_order,
        worker_count: wire_worker_count(config.worker_count)?,
    })
}

impl RunRequest {
    /// Execution shape carried by the request.
    ///
    /// # Errors
    ///
    /// Returns an error when `worker_count` is below 1.
    pub fn execution_config(&self) -> Result<ExecutionConfig, ValidationError> {
        let workers = usize::try_from(self.worker_count)
            .map_err(|_err| ValidationError::ValueTooSmall { min: 1 })?;
        Ok(ExecutionConfig {
            worker_count: PositiveUsize::try_from(workers)?,
            iterations: self.iterations,
            randomize_order: self.random,
        })
    }
}

fn duration_to_ns(value: Duration) -> u64 {
    u64::try_from(value.as_nanos()).unwrap_or(u64::MAX)
}

impl From<&ProcessResult> for WireProcessResult {
    fn from(result: &ProcessResult) -> Self {
        Self {
            transactions: result.transactions,
            successful_transactions: result.successful_transactions,
            failed_transactions: result.failed_transactions,
            total_bytes_sent: result.total_bytes_sent,
            total_bytes_received: result.total_bytes_received,
            average_response_time_ns: duration_to_ns(result.average_response_time),
            longest_transaction_ns: duration_to_ns(result.longest_transaction),
            shortest_transaction_ns: result.shortest_transaction.map(duration_to_ns),
            transaction_rate: result.transaction_rate,
            data_send_rate: result.data_send_rate,
            data_receive_rate: result.data_receive_rate,
            concurrency_rate: result.concurrency_rate,
            availability: result.availability,
            elapsed_time_ns: duration_to_ns(result.elapsed_time),
        }
    }
}

impl From<WireProcessResult> for ProcessResult {
    fn from(wire: WireProcessResult) -> Self {
        Self {
            transactions: wire.transactions,
            successful_transactions: wire.successful_transactions,
            failed_transactions: wire.failed_transactions,
            total_bytes_sent: wire.total_bytes_sent,
            total_bytes_received: wire.total_bytes_received,
            average_response_time: Duration::from_nanos(wire.average_response_time_ns),
            longest_transaction: Duration::from_nanos(wire.longest_transaction_ns),
            shortest_transaction: wire.shortest_transaction_ns.map(Duration::from_nanos),
            transaction_rate: wire.transaction_rate,
            data_send_rate: wire.data_send_rate,
            data_receive_rate: wire.data_receive_rate,
            concurrency_rate: wire.concurrency_rate,
            availability: wire.availability,
            elapsed_time: Duration::from_nanos(wire.elapsed_time_ns),
        }
    }
}
