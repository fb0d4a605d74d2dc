//! Live statistics for one process run.
mod histogram;
mod meter;
mod stats;


pub use histogram::SampleHistogram;
pub use meter::RateMeter;
pub use stats::{StatsAggregate, StatsSnapshot, TransactionOutcome, TransactionSample};
