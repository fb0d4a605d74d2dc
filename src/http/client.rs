use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;

use crate::args::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT};
use crate::error::HttpError;

use super::size::{request_size, response_head_size};
use super::{Transport, TransportResponse, WorkItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

/// [`Transport`] backed by one shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    user_agent: String,
}

impl ReqwestTransport {
    /// Builds the shared client.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be constructed.
    pub fn new(settings: &TransportSettings) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|err| HttpError::BuildClientFailed { source: err })?;
        Ok(Self {
            client,
            user_agent: settings.user_agent.clone(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, item: &WorkItem) -> Result<TransportResponse, HttpError> {
        let mut builder = self
            .client
            .request(item.verb().to_method(), item.url().clone());
        for (name, value) in item.headers() {
            builder = builder.header(name.clone(), value.clone());
        }
        let request = builder
            .build()
            .map_err(|err| HttpError::BuildRequestFailed { source: err })?;

        let mut response = self
            .client
            .execute(request)
            .await
            .map_err(|err| HttpError::RequestFailed { source: err })?;
        let status = response.status();
        let mut bytes_received = response_head_size(status, response.headers());

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| HttpError::ReadBodyFailed { source: err })?
        {
            let chunk_len = u64::try_from(chunk.len()).unwrap_or(u64::MAX);
            bytes_received = bytes_received.saturating_add(chunk_len);
        }

        trace!("{} {} -> {}", item.verb(), item.url(), status.as_u16());
        Ok(TransportResponse {
            status: status.as_u16(),
            bytes_sent: request_size(item, &self.user_agent),
            bytes_received,
        })
    }
}
