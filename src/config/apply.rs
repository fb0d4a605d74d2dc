use std::time::Duration;

use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{PositiveUsize, VolleyArgs};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::{ConfigFile, DurationValue, FleetConfig};

/// Applies configuration values to CLI arguments. Values given on the
/// command line win over the file.
///
/// # Errors
///
/// Returns an error when config values are invalid.
pub fn apply_config(
    args: &mut VolleyArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "urls")
        && let Some(urls) = config.urls.clone()
    {
        args.urls = Some(urls);
    }

    if !is_cli(matches, "random")
        && let Some(random) = config.random
    {
        args.random = random;
    }

    if !is_cli(matches, "worker_count")
        && let Some(worker_count) = config.worker_count
    {
        args.worker_count = ensure_positive_usize(worker_count, "worker_count")?;
    }

    if !is_cli(matches, "iterations")
        && let Some(iterations) = config.iterations
    {
        args.iterations = iterations;
    }

    if !is_cli(matches, "processes")
        && let Some(processes) = config.processes
    {
        args.processes = ensure_positive_usize(processes, "processes")?;
    }

    if !is_cli(matches, "output")
        && let Some(output) = config.output
    {
        args.output = output;
    }

    if !is_cli(matches, "verbose")
        && let Some(verbose) = config.verbose
    {
        args.verbose = verbose;
    }

    if !is_cli(matches, "no_color")
        && let Some(no_color) = config.no_color
    {
        args.no_color = no_color;
    }

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.request_timeout.as_ref()
    {
        args.request_timeout = to_duration(timeout, "request_timeout")?;
    }

    if !is_cli(matches, "connect_timeout")
        && let Some(timeout) = config.connect_timeout.as_ref()
    {
        args.connect_timeout = to_duration(timeout, "connect_timeout")?;
    }

    if !is_cli(matches, "history")
        && let Some(history) = config.history.clone()
    {
        args.history = history;
    }

    if !is_cli(matches, "no_history")
        && let Some(no_history) = config.no_history
    {
        args.no_history = no_history;
    }

    if let Some(fleet) = config.fleet.as_ref() {
        apply_fleet_config(args, fleet)?;
    }

    Ok(())
}

fn apply_fleet_config(args: &mut VolleyArgs, fleet: &FleetConfig) -> AppResult<()> {
    let timeouts = &mut args.fleet_timeouts;
    override_duration(
        &mut timeouts.announce,
        fleet.announce_timeout.as_ref(),
        "fleet.announce_timeout",
    )?;
    override_duration(
        &mut timeouts.connect.timeout,
        fleet.connect_timeout.as_ref(),
        "fleet.connect_timeout",
    )?;
    override_duration(
        &mut timeouts.connect.backoff,
        fleet.connect_backoff.as_ref(),
        "fleet.connect_backoff",
    )?;
    override_duration(
        &mut timeouts.ready.timeout,
        fleet.ready_timeout.as_ref(),
        "fleet.ready_timeout",
    )?;
    override_duration(
        &mut timeouts.ready.backoff,
        fleet.ready_backoff.as_ref(),
        "fleet.ready_backoff",
    )?;
    override_duration(
        &mut timeouts.stop.timeout,
        fleet.stop_timeout.as_ref(),
        "fleet.stop_timeout",
    )?;
    override_duration(
        &mut timeouts.stop.backoff,
        fleet.stop_backoff.as_ref(),
        "fleet.stop_backoff",
    )
}

fn override_duration(
    target: &mut Duration,
    value: Option<&DurationValue>,
    field: &'static str,
) -> AppResult<()> {
    if let Some(value) = value {
        *target = to_duration(value, field)?;
    }
    Ok(())
}

fn to_duration(value: &DurationValue, field: &'static str) -> AppResult<Duration> {
    value
        .to_duration()
        .map_err(|err| AppError::config(ConfigError::InvalidDuration { field, source: err }))
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn ensure_positive_usize(value: usize, field: &str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}
