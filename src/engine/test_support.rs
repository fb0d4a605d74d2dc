use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppResult, HttpError};
use crate::http::{Transport, TransportResponse, WorkItem};

/// Sizes reported for every scripted exchange.
pub(crate) const SCRIPTED_BYTES_SENT: u64 = 96;
pub(crate) const SCRIPTED_BYTES_RECEIVED: u64 = 38;

/// Transport double answering with a status script, cycled by call order.
pub(crate) struct ScriptedTransport {
    statuses: Vec<u16>,
    fail_transport: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn ok() -> Self {
        Self::with_statuses(vec![200])
    }

    pub(crate) const fn with_statuses(statuses: Vec<u16>) -> Self {
        Self {
            statuses,
            fail_transport: false,
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail_transport: true,
            ..Self::ok()
        }
    }

    pub(crate) fn delayed(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::ok()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn seen(&self) -> Vec<String> {
        self.seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, item: &WorkItem) -> Result<TransportResponse, HttpError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(item.url().to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_transport {
            return Err(HttpError::from("scripted transport failure"));
        }
        let status = call
            .checked_rem(self.statuses.len())
            .and_then(|slot| self.statuses.get(slot))
            .copied()
            .unwrap_or(200);
        Ok(TransportResponse {
            status,
            bytes_sent: SCRIPTED_BYTES_SENT,
            bytes_received: SCRIPTED_BYTES_RECEIVED,
        })
    }
}

pub(crate) fn work_items(count: usize) -> AppResult<Vec<WorkItem>> {
    let lines: Vec<String> = (0..count)
        .map(|index| format!("http://localhost/item-{}", index))
        .collect();
    Ok(crate::http::parse_work_items(&lines)?)
}
