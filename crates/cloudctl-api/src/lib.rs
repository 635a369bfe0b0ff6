//! cloudctl Cloud API client
//!
//! The log commands only need a handful of endpoints:
//! - environment lookup for an application
//! - log type listing, snapshot creation and archive download
//! - one-time logstream connection parameters

mod http;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use http::HttpCloudApi;

use async_trait::async_trait;
use bytes::Bytes;
use cloudctl_core::{Environment, Error, LogTypeDescriptor, Result, StreamConnectionParams};

/// Calls the log commands make against the platform
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// All environments of an application
    async fn environments(&self, application: &str) -> Result<Vec<Environment>>;

    /// Log types of an environment, in server order
    async fn log_types(&self, environment_id: &str) -> Result<Vec<LogTypeDescriptor>>;

    /// Ask the platform to start building a snapshot. Returns once the request
    /// is accepted, not when the snapshot is ready.
    async fn create_snapshot(&self, environment_id: &str, log_type: &str) -> Result<()>;

    /// Full archive payload of a log type
    async fn download_archive(&self, environment_id: &str, log_type: &str) -> Result<Bytes>;

    /// Fresh, single-use logstream connection parameters
    async fn stream_params(&self, environment_id: &str) -> Result<StreamConnectionParams>;

    /// Resolve an environment of an application by name or id
    async fn environment(&self, application: &str, environment: &str) -> Result<Environment> {
        self.environments(application)
            .await?
            .into_iter()
            .find(|env| env.matches(environment))
            .ok_or_else(|| Error::EnvironmentNotFound {
                application: application.to_string(),
                environment: environment.to_string(),
            })
    }
}
