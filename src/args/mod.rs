//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::VolleyArgs;
pub use types::{OutputFormat, PositiveUsize};

pub(crate) use defaults::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SERVER_HOST, DEFAULT_USER_AGENT,
    HISTORY_FILE_NAME, default_history_path,
};
pub(crate) use parsers::parse_header;
