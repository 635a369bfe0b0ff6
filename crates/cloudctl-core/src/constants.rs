//! Constants and default values for cloudctl

use std::path::PathBuf;

/// Default cloudctl home directory name
pub const CLOUDCTL_DIR: &str = ".cloudctl";

/// Default config file names to search for in the home directory (in priority order)
pub const CONFIG_FILES: &[&str] = &["config.toml", "config.yaml", "config.yml", "config.json"];

/// Default Cloud API base URL
pub const DEFAULT_API_URL: &str = "https://cloud.acquia.com/api";

/// Default timeout for a single Cloud API request in seconds
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Default bound on opening the logstream socket in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default silence (no frame at all) after which a stream counts as disconnected
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

/// Default delay before the first reconnect attempt in milliseconds
pub const DEFAULT_RECONNECT_INITIAL_DELAY_MS: u64 = 1000;

/// Default cap on the delay between reconnect attempts in milliseconds
pub const DEFAULT_RECONNECT_MAX_DELAY_MS: u64 = 30_000;

/// Default backoff multiplier between reconnect attempts
pub const DEFAULT_RECONNECT_MULTIPLIER: f64 = 2.0;

/// Default number of reconnect attempts per disconnect
pub const DEFAULT_RECONNECT_MAX_ATTEMPTS: u32 = 5;

/// File extension of downloaded log archives
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// Get the cloudctl home directory
pub fn cloudctl_home() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(CLOUDCTL_DIR))
        .unwrap_or_else(|| PathBuf::from(CLOUDCTL_DIR))
}

/// Get the default config file path
pub fn config_path() -> PathBuf {
    cloudctl_home().join(CONFIG_FILES[0])
}

/// File name of a log archive for an environment, e.g. `prod-apache-access.tar.gz`
pub fn archive_file_name(environment_name: &str, log_type: &str) -> String {
    format!("{}-{}{}", environment_name, log_type, ARCHIVE_EXTENSION)
}
