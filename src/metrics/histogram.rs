use hdrhistogram::Histogram;

use crate::error::MetricsError;

/// Significant figures kept by the underlying HDR histogram.
const SIGNIFICANT_FIGURES: u8 = 3;

/// Bounded-memory value distribution exposing mean, min and max.
///
/// Values are bucketed with three significant figures, so the reported
/// statistics are approximations within 0.1% of the recorded values.
#[derive(Debug)]
pub struct SampleHistogram {
    hist: Histogram<u64>,
}

impl SampleHistogram {
    /// Create an empty histogram.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> Result<Self, MetricsError> {
        let hist = Histogram::<u64>::new(SIGNIFICANT_FIGURES)
            .map_err(|err| MetricsError::HistogramCreate { source: err })?;
        Ok(Self { hist })
    }

    /// Record one observation.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be recorded.
    pub fn record(&mut self, value: u64) -> Result<(), MetricsError> {
        self.hist
            .record(value)
            .map_err(|err| MetricsError::HistogramRecord { value, source: err })
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.hist.len()
    }

    /// Mean of all observations, `0.0` when empty.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.count() == 0 {
            return 0.0;
        }
        self.hist.mean()
    }

    /// Smallest observation, `None` when nothing was recorded.
    #[must_use]
    pub fn min(&self) -> Option<u64> {
        if self.count() == 0 {
            return None;
        }
        Some(self.hist.min())
    }

    #[must_use]
    pub fn max(&self) -> u64 {
        if self.count() == 0 {
            return 0;
        }
        self.hist.max()
    }
}
