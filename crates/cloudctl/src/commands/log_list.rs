//! log:list command implementation

use anyhow::Result;
use cloudctl_core::CliConfig;
use cloudctl_logs::LogCatalog;

use crate::cli::EnvArgs;
use crate::output::print_log_types;

pub async fn execute(args: EnvArgs, config: &CliConfig) -> Result<()> {
    let api = super::api_client(config)?;
    let environment = super::resolve_environment(&api, &args).await?;

    let log_types = LogCatalog::new(&api).list(&environment).await?;
    print_log_types(&log_types);
    Ok(())
}
