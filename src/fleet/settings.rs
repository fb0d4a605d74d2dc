use std::time::Duration;

use super::ReadinessPoller;

/// Bounds for every wait a process-backed worker performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetTimeouts {
    /// Wait for the worker's `listening on` line.
    pub announce: Duration,
    /// Wait for the RPC port to accept connections.
    pub connect: ReadinessPoller,
    /// Wait for a healthy Ping.
    pub ready: ReadinessPoller,
    /// Wait for Kill to be acknowledged or the peer to go away.
    pub stop: ReadinessPoller,
}

impl Default for FleetTimeouts {
    fn default() -> Self {
        Self {
            announce: Duration::from_secs(10),
            connect: ReadinessPoller::new(Duration::from_secs(1), Duration::from_millis(10)),
            ready: ReadinessPoller::new(Duration::from_secs(10), Duration::from_millis(250)),
            stop: ReadinessPoller::new(Duration::from_secs(10), Duration::from_millis(250)),
        }
    }
}
