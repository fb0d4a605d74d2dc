use async_trait::async_trait;

use crate::error::HttpError;

use super::WorkItem;

/// Status and wire sizes observed for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl TransportResponse {
    /// First status code treated as a failed transaction.
    pub const FAILURE_STATUS: u16 = 400;

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.status >= Self::FAILURE_STATUS
    }
}

/// Issues one HTTP request for a work item.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes the request.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be sent or its response read.
    async fn execute(&self, item: &WorkItem) -> Result<TransportResponse, HttpError>;
}
