use std::time::Duration;

use crate::metrics::StatsSnapshot;

/// Outcome of one process run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessResult {
    pub transactions: u64,
    pub successful_transactions: u64,
    pub failed_transactions: u64,
    pub total_bytes_sent: u64,
    pub total_bytes_received: u64,
    pub average_response_time: Duration,
    pub longest_transaction: Duration,
    /// `None` when the process completed no transaction.
    pub shortest_transaction: Option<Duration>,
    pub transaction_rate: f64,
    pub data_send_rate: f64,
    pub data_receive_rate: f64,
    pub concurrency_rate: f64,
    pub availability: f64,
    pub elapsed_time: Duration,
}

impl ProcessResult {
    #[must_use]
    pub fn from_snapshot(snapshot: StatsSnapshot, elapsed_time: Duration) -> Self {
        Self {
            transactions: snapshot.transactions,
            successful_transactions: snapshot.successes,
            failed_transactions: snapshot.failures,
            total_bytes_sent: snapshot.bytes_sent,
            total_bytes_received: snapshot.bytes_received,
            average_response_time: snapshot.average_response_time,
            longest_transaction: snapshot.longest_transaction,
            shortest_transaction: snapshot.shortest_transaction,
            transaction_rate: snapshot.transaction_rate,
            data_send_rate: snapshot.data_send_rate,
            data_receive_rate: snapshot.data_receive_rate,
            concurrency_rate: snapshot.concurrency_mean,
            availability: availability(
                snapshot.successes,
                snapshot.failures,
                snapshot.transactions,
            ),
            elapsed_time,
        }
    }
}

/// Fraction of transactions that did not fail.
///
/// A run without failures is fully available, including a run with no
/// transactions at all.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "Availability is reported as a ratio."
)]
pub fn availability(successes: u64, failures: u64, transactions: u64) -> f64 {
    if failures == 0 || transactions == 0 {
        return 1.0;
    }
    to_f64(successes) / to_f64(transactions)
}

const fn to_f64(value: u64) -> f64 {
    value as f64
}
