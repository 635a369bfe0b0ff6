//! Core types for cloudctl

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Regex pattern for valid log type identifiers: only alphanumeric, underscore, and hyphen
static LOG_TYPE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_-]+$").expect("Invalid log type regex")
});

/// Validate a log type identifier. These end up in archive file names, so
/// anything that could walk out of the target directory is rejected.
pub fn validate_log_type(log_type: &str) -> bool {
    !log_type.is_empty() && LOG_TYPE_REGEX.is_match(log_type)
}

/// Like [`validate_log_type`], as a `Result`
pub fn ensure_log_type(log_type: &str) -> Result<()> {
    if validate_log_type(log_type) {
        Ok(())
    } else {
        Err(Error::InvalidLogType(format!(
            "'{}': only alphanumeric characters, underscores, and hyphens are allowed",
            log_type
        )))
    }
}

/// A deployed instance of an application (e.g. "dev", "prod")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Unique environment id
    pub id: String,
    /// Human readable label, e.g. "Production"
    pub label: String,
    /// Machine name, e.g. "prod"
    pub name: String,
}

impl Environment {
    pub fn new(id: impl Into<String>, label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            name: name.into(),
        }
    }

    /// Whether a user supplied environment argument refers to this environment
    pub fn matches(&self, selector: &str) -> bool {
        self.name == selector || self.id == selector
    }
}

/// One-shot endpoint and credentials for a live log tail.
///
/// Not `Clone`: a set of parameters belongs to exactly one stream session.
#[derive(Deserialize)]
pub struct StreamConnectionParams {
    url: String,
    params: Map<String, Value>,
}

impl StreamConnectionParams {
    pub fn new(url: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            url: url.into(),
            params,
        }
    }

    /// WebSocket endpoint of the logstream service
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The authentication frame sent right after the socket opens
    pub fn auth_frame(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.params)?)
    }
}

impl std::fmt::Debug for StreamConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConnectionParams")
            .field("url", &self.url)
            .field("params", &format_args!("<{} redacted>", self.params.len()))
            .finish()
    }
}

/// A log type available on an environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogTypeDescriptor {
    #[serde(rename = "type")]
    pub log_type: String,
    pub label: String,
    pub available: bool,
}

impl LogTypeDescriptor {
    pub fn new(log_type: impl Into<String>, label: impl Into<String>, available: bool) -> Self {
        Self {
            log_type: log_type.into(),
            label: label.into(),
            available,
        }
    }
}

/// A single line received from the log stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub server: String,
    pub log_type: String,
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

impl LogLine {
    pub fn new(
        server: impl Into<String>,
        log_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            log_type: log_type.into(),
            timestamp: Utc::now(),
            text: text.into(),
        }
    }

    /// Set the timestamp from unix seconds; out of range values keep the current one
    pub fn with_unix_time(mut self, secs: i64) -> Self {
        if let Some(ts) = Utc.timestamp_opt(secs, 0).single() {
            self.timestamp = ts;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_log_type_valid() {
        assert!(validate_log_type("apache-access"));
        assert!(validate_log_type("php_error"));
        assert!(validate_log_type("drupal-watchdog"));
        assert!(validate_log_type("mysql-slow2"));
    }

    #[test]
    fn test_validate_log_type_invalid() {
        assert!(!validate_log_type(""));
        assert!(!validate_log_type("../etc/passwd"));
        assert!(!validate_log_type("apache/access"));
        assert!(!validate_log_type("apache access"));
        assert!(matches!(
            ensure_log_type("a.b"),
            Err(Error::InvalidLogType(_))
        ));
    }

    #[test]
    fn test_environment_matches() {
        let env = Environment::new("24-a47ac10b", "Production", "prod");
        assert!(env.matches("prod"));
        assert!(env.matches("24-a47ac10b"));
        assert!(!env.matches("Production"));
        assert!(!env.matches("dev"));
    }

    #[test]
    fn test_stream_params_deserialize_and_auth_frame() {
        let params: StreamConnectionParams = serde_json::from_value(json!({
            "url": "wss://logstream.example.com/ah_websocket/logstream/v1",
            "params": {
                "cmd": "stream-environment",
                "site": "clouduidev:qa4",
                "t": 1516051001,
                "hmac": "secret"
            }
        }))
        .unwrap();

        assert_eq!(
            params.url(),
            "wss://logstream.example.com/ah_websocket/logstream/v1"
        );
        let frame: Value = serde_json::from_str(&params.auth_frame().unwrap()).unwrap();
        assert_eq!(frame["cmd"], "stream-environment");
        assert_eq!(frame["hmac"], "secret");
    }

    #[test]
    fn test_stream_params_debug_redacts_credentials() {
        let mut map = Map::new();
        map.insert("hmac".to_string(), json!("secret"));
        let params = StreamConnectionParams::new("wss://example.com", map);

        let debug = format!("{:?}", params);
        assert!(debug.contains("wss://example.com"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_log_type_descriptor_json() {
        let descriptor = LogTypeDescriptor::new("apache-access", "Apache access", true);
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["type"], "apache-access");
        assert_eq!(value["available"], true);
    }

    #[test]
    fn test_log_line_unix_time() {
        let line = LogLine::new("web-1", "apache-request", "GET /").with_unix_time(1571911272);
        assert_eq!(line.timestamp.timestamp(), 1571911272);
        assert_eq!(line.server, "web-1");
    }
}
