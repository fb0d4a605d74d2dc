mod app;
mod config;
mod fleet;
mod http;
mod metrics;
mod rpc;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use fleet::{FleetError, FleetPhase};
pub use http::HttpError;
pub use metrics::MetricsError;
pub use rpc::RpcError;
pub use validation::ValidationError;
