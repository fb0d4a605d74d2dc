use std::time::{Duration, Instant};

/// Measures request and run durations.
pub trait Timer: Send + Sync {
    fn start(&self) -> Instant;

    fn stop(&self, started: Instant) -> Duration;
}

/// Wall-clock timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimer;

impl Timer for SystemTimer {
    fn start(&self) -> Instant {
        Instant::now()
    }

    fn stop(&self, started: Instant) -> Duration {
        started.elapsed()
    }
}

/// Reports the same duration for every measurement.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedTimer(pub(crate) Duration);

#[cfg(test)]
impl Timer for FixedTimer {
    fn start(&self) -> Instant {
        Instant::now()
    }

    fn stop(&self, _started: Instant) -> Duration {
        self.0
    }
}
