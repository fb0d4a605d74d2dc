use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::args::{PositiveUsize, VolleyArgs, parse_header};
use crate::config::types::ConfigFile;
use crate::config::{apply_config, parse_duration_value};
use crate::error::{AppError, AppResult, ConfigError};
use crate::http::{WorkItem, parse_work_items};
use crate::rpc::{WireMessage, read_message};

thread_local! {
    static BASE_MATCHES: ArgMatches = VolleyArgs::command().get_matches_from(["volley"]);
}

/// Parses a header string in `Key: Value` format.
///
/// # Errors
///
/// Returns an error when the header is malformed.
pub fn parse_header_input(input: &str) -> AppResult<(String, String)> {
    parse_header(input).map_err(AppError::from)
}

/// Parses a duration value from config.
///
/// # Errors
///
/// Returns an error when the duration is invalid.
pub fn parse_duration_value_input(input: &str) -> AppResult<Duration> {
    parse_duration_value(input).map_err(AppError::from)
}

/// Parses a positive usize string value.
///
/// # Errors
///
/// Returns an error when the value is invalid or zero.
pub fn parse_positive_usize_input(input: &str) -> AppResult<usize> {
    let value: PositiveUsize = input.parse()?;
    Ok(value.get())
}

/// Parses the contents of a URL file.
///
/// # Errors
///
/// Returns the first invalid line.
pub fn parse_work_items_input(input: &str) -> AppResult<Vec<WorkItem>> {
    parse_work_items(input.lines()).map_err(AppError::from)
}

/// Reads one framed RPC message from raw bytes.
///
/// # Errors
///
/// Returns an error when the frame is empty, oversized or not a known message.
pub fn read_wire_message_input(input: &[u8]) -> AppResult<WireMessage> {
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let mut reader = input;
    runtime.block_on(read_message(&mut reader))
}

/// Parses TOML config and applies it to defaults.
///
/// # Errors
///
/// Returns an error when parsing or validation fails.
pub fn apply_config_from_toml(input: &str) -> AppResult<()> {
    let config: ConfigFile = toml::from_str(input).map_err(|err| {
        AppError::config(ConfigError::ParseToml {
            path: PathBuf::from("<fuzz>"),
            source: err,
        })
    })?;
    apply_config_to_defaults(&config)
}

/// Parses JSON config and applies it to defaults.
///
/// # Errors
///
/// Returns an error when parsing or validation fails.
pub fn apply_config_from_json(input: &[u8]) -> AppResult<()> {
    let config: ConfigFile = serde_json::from_slice(input)?;
    apply_config_to_defaults(&config)
}

fn apply_config_to_defaults(config: &ConfigFile) -> AppResult<()> {
    BASE_MATCHES.with(|matches| {
        let mut args = VolleyArgs::from_arg_matches(matches)?;
        apply_config(&mut args, matches, config)
    })
}
