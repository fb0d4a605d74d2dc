use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep, timeout};

/// Fixed-interval polling bounded by a total timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPoller {
    pub timeout: Duration,
    pub backoff: Duration,
}

/// The check never succeeded before the poller's timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollElapsed {
    pub timeout: Duration,
    pub attempts: u32,
}

impl ReadinessPoller {
    #[must_use]
    pub const fn new(timeout: Duration, backoff: Duration) -> Self {
        Self { timeout, backoff }
    }

    /// Calls `check` every `backoff` until it returns `true`.
    ///
    /// The timeout is checked before each attempt, so a check that succeeds
    /// on its k-th retry is accepted only while `k * backoff < timeout`.
    /// Each attempt is bounded by the time left; a check still pending at
    /// the deadline counts as failed. Returns the number of attempts made.
    ///
    /// # Errors
    ///
    /// Returns [`PollElapsed`] once the timeout has passed.
    pub async fn wait_until<F, Fut>(&self, mut check: F) -> Result<u32, PollElapsed>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let started = Instant::now();
        let mut attempts: u32 = 0;
        loop {
            let remaining = self.timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(PollElapsed {
                    timeout: self.timeout,
                    attempts,
                });
            }
            attempts = attempts.saturating_add(1);
            match timeout(remaining, check()).await {
                Ok(true) => return Ok(attempts),
                Ok(false) => {}
                Err(_elapsed) => continue,
            }
            sleep(self.backoff).await;
        }
    }
}
