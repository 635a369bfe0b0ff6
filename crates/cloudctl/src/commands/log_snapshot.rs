//! log:snapshot command implementation

use anyhow::Result;
use cloudctl_core::CliConfig;
use cloudctl_logs::LogSnapshotter;

use crate::cli::SnapshotArgs;
use crate::output::print_info;

pub async fn execute(args: SnapshotArgs, config: &CliConfig) -> Result<()> {
    let api = super::api_client(config)?;
    let environment = super::resolve_environment(&api, &args.env).await?;

    // The message goes out before the platform has confirmed anything
    LogSnapshotter::new(&api)
        .create(&environment, &args.log_type, print_info)
        .await?;
    Ok(())
}
