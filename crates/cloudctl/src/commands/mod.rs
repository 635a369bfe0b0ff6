//! Command implementations

pub mod log_download;
pub mod log_list;
pub mod log_snapshot;
pub mod log_stream;

use anyhow::Result;
use cloudctl_api::{CloudApi, HttpCloudApi};
use cloudctl_core::{CliConfig, Environment};
use tracing::debug;

use crate::cli::EnvArgs;

/// Build the Cloud API client from configuration
pub fn api_client(config: &CliConfig) -> Result<HttpCloudApi> {
    debug!("Using Cloud API at {}", config.api.base_url);
    Ok(HttpCloudApi::new(&config.api)?)
}

/// Resolve the `<uuid> <environment>` pair every log command takes
pub async fn resolve_environment(api: &dyn CloudApi, args: &EnvArgs) -> Result<Environment> {
    let environment = api
        .environment(&args.uuid.to_string(), &args.environment)
        .await?;
    debug!(
        "Resolved environment {} to {} ({})",
        args.environment, environment.id, environment.label
    );
    Ok(environment)
}
