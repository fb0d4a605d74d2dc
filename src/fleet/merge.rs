use std::time::Duration;

use crate::engine::ProcessResult;
use crate::error::FleetError;

/// Statistics for the whole fleet, merged from one result per process.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetResult {
    pub processes: usize,
    pub transactions: u64,
    pub successful_transactions: u64,
    pub failed_transactions: u64,
    pub total_bytes_sent: u64,
    pub total_bytes_received: u64,
    pub average_response_time: Duration,
    pub longest_transaction: Duration,
    pub shortest_transaction: Option<Duration>,
    pub transaction_rate: f64,
    pub data_send_rate: f64,
    pub data_receive_rate: f64,
    pub concurrency_rate: f64,
    pub availability: f64,
    pub elapsed_time: Duration,
}

/// Merges per-process results.
///
/// Counters are summed, rates and ratios averaged, the longest transaction
/// and elapsed time take the maximum and the shortest transaction the
/// minimum over processes that completed any transaction. The result does
/// not depend on the order of `results`.
///
/// # Errors
///
/// Returns [`FleetError::NoResults`] for an empty slice.
pub fn merge_results(results: &[ProcessResult]) -> Result<FleetResult, FleetError> {
    if results.is_empty() {
        return Err(FleetError::NoResults);
    }
    Ok(FleetResult {
        processes: results.len(),
        transactions: sum(results, |result| result.transactions),
        successful_transactions: sum(results, |result| result.successful_transactions),
        failed_transactions: sum(results, |result| result.failed_transactions),
        total_bytes_sent: sum(results, |result| result.total_bytes_sent),
        total_bytes_received: sum(results, |result| result.total_bytes_received),
        average_response_time: mean_duration(results, |result| result.average_response_time),
        longest_transaction: results
            .iter()
            .map(|result| result.longest_transaction)
            .max()
            .unwrap_or_default(),
        shortest_transaction: results
            .iter()
            .filter_map(|result| result.shortest_transaction)
            .min(),
        transaction_rate: mean(results, |result| result.transaction_rate),
        data_send_rate: mean(results, |result| result.data_send_rate),
        data_receive_rate: mean(results, |result| result.data_receive_rate),
        concurrency_rate: mean(results, |result| result.concurrency_rate),
        availability: mean(results, |result| result.availability),
        elapsed_time: results
            .iter()
            .map(|result| result.elapsed_time)
            .max()
            .unwrap_or_default(),
    })
}

fn sum<F>(results: &[ProcessResult], field: F) -> u64
where
    F: Fn(&ProcessResult) -> u64,
{
    results.iter().map(field).fold(0, u64::saturating_add)
}

// Values are summed in sorted order so the float result is order-independent.
#[expect(clippy::float_arithmetic, reason = "Averaging rates across processes.")]
fn mean<F>(results: &[ProcessResult], field: F) -> f64
where
    F: Fn(&ProcessResult) -> f64,
{
    let mut values: Vec<f64> = results.iter().map(field).collect();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let count = values.len() as f64;
    values.iter().sum::<f64>() / count
}

fn mean_duration<F>(results: &[ProcessResult], field: F) -> Duration
where
    F: Fn(&ProcessResult) -> Duration,
{
    let total = results
        .iter()
        .map(|result| field(result).as_nanos())
        .fold(0_u128, u128::saturating_add);
    let count = u128::try_from(results.len()).unwrap_or(u128::MAX);
    let nanos = total.checked_div(count).unwrap_or(0);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
