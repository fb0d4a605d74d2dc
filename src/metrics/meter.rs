use std::time::Duration;

/// Counts marked events and reports their mean rate over a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RateMeter {
    count: u64,
}

impl RateMeter {
    #[must_use]
    pub const fn new() -> Self {
        Self { count: 0 }
    }

    pub const fn mark(&mut self, events: u64) {
        self.count = self.count.saturating_add(events);
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Events per second across `elapsed`; `0.0` for an empty window.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "Rates are reported as floating point events per second."
    )]
    pub fn mean_rate(&self, elapsed: Duration) -> f64 {
        let seconds = elapsed.as_secs_f64();
        if seconds <= 0.0 {
            return 0.0;
        }
        self.count as f64 / seconds
    }
}
