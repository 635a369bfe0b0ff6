//! Log snapshot requests

use cloudctl_api::CloudApi;
use cloudctl_core::{ensure_log_type, Environment, Result};
use tracing::info;

/// Asks the platform to build a log snapshot without waiting for it
pub struct LogSnapshotter<'a> {
    api: &'a dyn CloudApi,
}

impl<'a> LogSnapshotter<'a> {
    pub fn new(api: &'a dyn CloudApi) -> Self {
        Self { api }
    }

    /// The confirmation message shown for a snapshot request
    pub fn message(environment: &Environment, log_type: &str) -> String {
        format!(
            "Creating snapshot for {} in {} environment",
            log_type, environment.label
        )
    }

    /// Request a snapshot. `announce` receives the confirmation message before the
    /// request is sent, so it is shown even when the request then fails.
    pub async fn create<F>(&self, environment: &Environment, log_type: &str, announce: F) -> Result<()>
    where
        F: FnOnce(&str),
    {
        ensure_log_type(log_type)?;
        announce(&Self::message(environment, log_type));
        self.api.create_snapshot(&environment.id, log_type).await?;
        info!("Snapshot of {} requested on {}", log_type, environment.name);
        Ok(())
    }
}
