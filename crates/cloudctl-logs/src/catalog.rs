//! Log type listing

use cloudctl_api::CloudApi;
use cloudctl_core::{Environment, LogTypeDescriptor, Result};
use tracing::debug;

/// Lists the log types of an environment. Never cached.
pub struct LogCatalog<'a> {
    api: &'a dyn CloudApi,
}

impl<'a> LogCatalog<'a> {
    pub fn new(api: &'a dyn CloudApi) -> Self {
        Self { api }
    }

    /// All log types in server order
    pub async fn list(&self, environment: &Environment) -> Result<Vec<LogTypeDescriptor>> {
        let log_types = self.api.log_types(&environment.id).await?;
        debug!(
            "{} log types for environment {}",
            log_types.len(),
            environment.name
        );
        Ok(log_types)
    }
}
