use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::error::MetricsError;

use super::{RateMeter, SampleHistogram};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    Success,
    Failure,
}

/// What one completed execution contributes to the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSample {
    pub outcome: TransactionOutcome,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub response_time: Duration,
}

/// Counter and histogram values read out of a [`StatsAggregate`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub transactions: u64,
    pub successes: u64,
    pub failures: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub average_response_time: Duration,
    pub longest_transaction: Duration,
    pub shortest_transaction: Option<Duration>,
    pub concurrency_mean: f64,
    pub transaction_rate: f64,
    pub data_send_rate: f64,
    pub data_receive_rate: f64,
}

#[derive(Debug)]
struct StatsState {
    transactions: u64,
    successes: u64,
    failures: u64,
    bytes_sent: u64,
    bytes_received: u64,
    in_flight: u64,
    response_times_ns: SampleHistogram,
    concurrency: SampleHistogram,
    transaction_meter: RateMeter,
    send_meter: RateMeter,
    receive_meter: RateMeter,
}

/// Shared statistics for one process run.
///
/// Every mutation happens under one lock. Callers hold it only for the
/// bookkeeping around a request, never across the request itself.
#[derive(Debug)]
pub struct StatsAggregate {
    state: Mutex<StatsState>,
}

impl StatsAggregate {
    /// Create an empty aggregate.
    ///
    /// # Errors
    ///
    /// Returns an error if the histograms cannot be created.
    pub fn new() -> Result<Self, MetricsError> {
        Ok(Self {
            state: Mutex::new(StatsState {
                transactions: 0,
                successes: 0,
                failures: 0,
                bytes_sent: 0,
                bytes_received: 0,
                in_flight: 0,
                response_times_ns: SampleHistogram::new()?,
                concurrency: SampleHistogram::new()?,
                transaction_meter: RateMeter::new(),
                send_meter: RateMeter::new(),
                receive_meter: RateMeter::new(),
            }),
        })
    }

    /// Marks a virtual user as having a request in flight.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned or the sample cannot be recorded.
    pub fn begin(&self) -> Result<(), MetricsError> {
        let mut state = self.lock()?;
        state.in_flight = state.in_flight.saturating_add(1);
        let level = state.in_flight;
        state.concurrency.record(level)
    }

    /// Folds one completed execution into the counters, histograms and meters.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned or a sample cannot be recorded.
    pub fn complete(&self, sample: &TransactionSample) -> Result<(), MetricsError> {
        let mut state = self.lock()?;
        state.in_flight = state.in_flight.saturating_sub(1);
        let level = state.in_flight;
        state.concurrency.record(level)?;

        state.transactions = state.transactions.saturating_add(1);
        match sample.outcome {
            TransactionOutcome::Success => state.successes = state.successes.saturating_add(1),
            TransactionOutcome::Failure => state.failures = state.failures.saturating_add(1),
        }
        state.bytes_sent = state.bytes_sent.saturating_add(sample.bytes_sent);
        state.bytes_received = state.bytes_received.saturating_add(sample.bytes_received);

        let nanos = u64::try_from(sample.response_time.as_nanos()).unwrap_or(u64::MAX);
        state.response_times_ns.record(nanos)?;

        state.transaction_meter.mark(1);
        state.send_meter.mark(sample.bytes_sent);
        state.receive_meter.mark(sample.bytes_received);
        Ok(())
    }

    /// Current requests in flight.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn in_flight(&self) -> Result<u64, MetricsError> {
        Ok(self.lock()?.in_flight)
    }

    /// Reads the current values; rates are computed over `elapsed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn snapshot(&self, elapsed: Duration) -> Result<StatsSnapshot, MetricsError> {
        let state = self.lock()?;
        Ok(StatsSnapshot {
            transactions: state.transactions,
            successes: state.successes,
            failures: state.failures,
            bytes_sent: state.bytes_sent,
            bytes_received: state.bytes_received,
            average_response_time: nanos_to_duration(state.response_times_ns.mean()),
            longest_transaction: Duration::from_nanos(state.response_times_ns.max()),
            shortest_transaction: state.response_times_ns.min().map(Duration::from_nanos),
            concurrency_mean: state.concurrency.mean(),
            transaction_rate: state.transaction_meter.mean_rate(elapsed),
            data_send_rate: state.send_meter.mean_rate(elapsed),
            data_receive_rate: state.receive_meter.mean_rate(elapsed),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, StatsState>, MetricsError> {
        self.state.lock().map_err(|_poisoned| MetricsError::LockPoisoned)
    }
}

fn nanos_to_duration(nanos: f64) -> Duration {
    if !nanos.is_finite() || nanos <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(nanos.round() as u64)
}
