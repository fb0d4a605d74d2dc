use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to create histogram: {source}")]
    HistogramCreate {
        #[source]
        source: hdrhistogram::CreationError,
    },
    #[error("Failed to record {value} into histogram: {source}")]
    HistogramRecord {
        value: u64,
        #[source]
        source: hdrhistogram::RecordError,
    },
    #[error("Statistics lock poisoned.")]
    LockPoisoned,
    #[error("Failed to append run history to '{path}': {source}")]
    HistoryWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
