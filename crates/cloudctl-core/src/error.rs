//! Error types for cloudctl

use std::path::PathBuf;

/// cloudctl error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Remote API error: {message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    #[error("Environment '{environment}' not found for application {application}")]
    EnvironmentNotFound {
        application: String,
        environment: String,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid log type: {0}")]
    InvalidLogType(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Result type alias for cloudctl
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure class, used to report errors distinctly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The Cloud API call failed or answered with an error status
    Remote,
    /// The log stream could not be established or was lost for good
    Connection,
    /// Local filesystem failure
    Io,
    /// Bad input or configuration
    Usage,
}

impl Error {
    pub fn remote<S: Into<String>>(msg: S) -> Self {
        Error::Remote {
            status: None,
            message: msg.into(),
        }
    }

    pub fn remote_status<S: Into<String>>(status: u16, msg: S) -> Self {
        Error::Remote {
            status: Some(status),
            message: msg.into(),
        }
    }

    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Error::Connection(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::ConfigError(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Remote { .. } | Error::EnvironmentNotFound { .. } | Error::JsonError(_) => {
                ErrorKind::Remote
            }
            Error::Connection(_) | Error::Timeout(_) => ErrorKind::Connection,
            Error::IoError(_) => ErrorKind::Io,
            Error::InvalidLogType(_)
            | Error::ConfigError(_)
            | Error::ConfigNotFound(_)
            | Error::TomlError(_)
            | Error::YamlError(_) => ErrorKind::Usage,
        }
    }
}
