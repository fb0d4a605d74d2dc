use std::time::Duration;

use serde::Deserialize;

use crate::args::OutputFormat;
use crate::error::ValidationError;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub urls: Option<String>,
    pub random: Option<bool>,
    pub worker_count: Option<usize>,
    pub iterations: Option<i32>,
    pub processes: Option<usize>,
    pub output: Option<OutputFormat>,
    pub verbose: Option<bool>,
    pub no_color: Option<bool>,
    pub request_timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub history: Option<String>,
    pub no_history: Option<bool>,
    pub fleet: Option<FleetConfig>,
}

/// Overrides for the worker lifecycle polling bounds.
#[derive(Debug, Default, Deserialize)]
pub struct FleetConfig {
    pub announce_timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub connect_backoff: Option<DurationValue>,
    pub ready_timeout: Option<DurationValue>,
    pub ready_backoff: Option<DurationValue>,
    pub stop_timeout: Option<DurationValue>,
    pub stop_backoff: Option<DurationValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(0) => Err(ValidationError::DurationZero),
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }
}
