use std::path::PathBuf;
use std::time::Duration;

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("volley/", env!("CARGO_PKG_VERSION"));

pub(crate) const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// File each controller run appends its CSV summary row to.
pub(crate) const HISTORY_FILE_NAME: &str = ".volley.results";

pub(crate) fn default_history_path() -> String {
    user_home_dir()
        .map_or_else(
            || PathBuf::from(HISTORY_FILE_NAME),
            |home| home.join(HISTORY_FILE_NAME),
        )
        .to_string_lossy()
        .into_owned()
}

fn user_home_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        if let Some(value) = std::env::var_os("USERPROFILE") {
            return Some(PathBuf::from(value));
        }
        let drive = std::env::var_os("HOMEDRIVE");
        let path = std::env::var_os("HOMEPATH");
        if let (Some(drive), Some(path)) = (drive, path) {
            let mut full = PathBuf::from(drive);
            full.push(path);
            return Some(full);
        }
    }

    std::env::var_os("HOME").map(PathBuf::from)
}
