//! Server and log type filters for the live stream

use cloudctl_core::LogLine;
use std::collections::BTreeSet;

/// Which lines a stream session shows. An empty set on an axis lets everything through
/// on that axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    log_types: BTreeSet<String>,
    servers: BTreeSet<String>,
}

impl LogFilter {
    pub fn new<T, S>(log_types: T, servers: S) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            log_types: normalize(log_types),
            servers: normalize(servers),
        }
    }

    /// A filter that lets every line through
    pub fn all() -> Self {
        Self::default()
    }

    pub fn log_types(&self) -> &BTreeSet<String> {
        &self.log_types
    }

    pub fn servers(&self) -> &BTreeSet<String> {
        &self.servers
    }

    pub fn is_empty(&self) -> bool {
        self.log_types.is_empty() && self.servers.is_empty()
    }

    pub fn allows_log_type(&self, log_type: &str) -> bool {
        self.log_types.is_empty() || self.log_types.contains(log_type)
    }

    pub fn allows_server(&self, server: &str) -> bool {
        self.servers.is_empty() || self.servers.contains(server)
    }

    /// Whether a (log type, server) source passes both axes
    pub fn allows(&self, log_type: &str, server: &str) -> bool {
        self.allows_log_type(log_type) && self.allows_server(server)
    }

    pub fn matches(&self, line: &LogLine) -> bool {
        self.allows(&line.log_type, &line.server)
    }
}

fn normalize<I>(values: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    values
        .into_iter()
        .map(Into::into)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
