use thiserror::Error;

use super::{ConfigError, FleetError, HttpError, MetricsError, RpcError, ValidationError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("Join error: {source}")]
    Join {
        #[from]
        source: tokio::task::JoinError,
    },
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
    #[error("Fleet error: {0}")]
    Fleet(#[from] FleetError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation<E>(error: E) -> Self
    where
        E: Into<ValidationError>,
    {
        error.into().into()
    }

    pub fn config<E>(error: E) -> Self
    where
        E: Into<ConfigError>,
    {
        error.into().into()
    }

    pub fn http<E>(error: E) -> Self
    where
        E: Into<HttpError>,
    {
        error.into().into()
    }

    pub fn metrics<E>(error: E) -> Self
    where
        E: Into<MetricsError>,
    {
        error.into().into()
    }

    pub fn rpc<E>(error: E) -> Self
    where
        E: Into<RpcError>,
    {
        error.into().into()
    }

    pub fn fleet<E>(error: E) -> Self
    where
        E: Into<FleetError>,
    {
        error.into().into()
    }

    /// True when the error means the remote peer has gone away.
    #[must_use]
    pub const fn is_peer_unavailable(&self) -> bool {
        matches!(self, AppError::Rpc(RpcError::Unavailable { .. }))
    }
}
