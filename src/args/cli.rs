use clap::Parser;
use std::time::Duration;

use crate::fleet::FleetTimeouts;

use super::defaults::{DEFAULT_SERVER_HOST, default_history_path};
use super::parsers::{parse_bool_env, parse_duration_arg, parse_positive_usize};
use super::types::{OutputFormat, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Distributed HTTP load generator: replays a URL file from a fleet of worker processes and merges their statistics."
)]
pub struct VolleyArgs {
    /// File with one work item per line: [-X VERB] [-H 'Name: value']... URL
    #[arg(long = "urls", short = 'u', help_heading = "Workload")]
    pub urls: Option<String>,

    /// Shuffle the work items once before the run starts
    #[arg(long = "random", short = 'r', help_heading = "Workload")]
    pub random: bool,

    /// Concurrent virtual users per worker process
    #[arg(
        long = "worker-count",
        short = 'c',
        default_value = "1",
        value_parser = parse_positive_usize,
        help_heading = "Workload"
    )]
    pub worker_count: PositiveUsize,

    /// Executions per virtual user (0 or less runs one pass over the work items)
    #[arg(
        long = "number-iterations",
        short = 'n',
        default_value_t = 0,
        allow_negative_numbers = true,
        help_heading = "Workload"
    )]
    pub iterations: i32,

    /// Number of worker processes to spawn
    #[arg(
        long = "processes",
        short = 'p',
        default_value = "1",
        value_parser = parse_positive_usize,
        help_heading = "Workload"
    )]
    pub processes: PositiveUsize,

    /// Summary format written to stdout
    #[arg(long = "output", short = 'o', value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(long = "request-timeout", default_value = "30s", value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// TCP connect timeout for load requests (supports ms/s/m/h)
    #[arg(long = "connect-timeout", default_value = "10s", value_parser = parse_duration_arg)]
    pub connect_timeout: Duration,

    /// CSV file every controller run appends its summary row to
    #[arg(long = "history", default_value_t = default_history_path())]
    pub history: String,

    /// Do not record this run in the history file
    #[arg(long = "no-history")]
    pub no_history: bool,

    /// Run as a worker process serving Run/Ping/Kill
    #[arg(long = "server", help_heading = "Worker")]
    pub server: bool,

    /// Address the worker binds to
    #[arg(long = "server-host", default_value = DEFAULT_SERVER_HOST, help_heading = "Worker")]
    pub server_host: String,

    /// Port the worker binds to (0 picks a free port and announces it)
    #[arg(long = "server-port", default_value_t = 0, help_heading = "Worker")]
    pub server_port: u16,

    /// Enable verbose logging (sets log level to debug unless overridden by VOLLEY_LOG/RUST_LOG)
    #[arg(long, short = 'v', help_heading = "Common Options")]
    pub verbose: bool,

    /// Path to config file (TOML/JSON). Defaults to ./volley.toml or ./volley.json if present.
    #[arg(long, help_heading = "Common Options")]
    pub config: Option<String>,

    /// Disable color output
    #[arg(
        long = "no-color",
        env = "NO_COLOR",
        value_parser = parse_bool_env,
        help_heading = "Common Options"
    )]
    pub no_color: bool,

    #[arg(skip)]
    pub fleet_timeouts: FleetTimeouts,
}
