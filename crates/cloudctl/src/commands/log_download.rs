//! log:download command implementation

use anyhow::{bail, Result};
use cloudctl_core::CliConfig;
use cloudctl_logs::LogArchiveFetcher;
use serde::Serialize;
use tracing::warn;

use crate::cli::DownloadArgs;
use crate::output::print_success_json;

#[derive(Serialize)]
struct Downloaded {
    path: String,
}

pub async fn execute(args: DownloadArgs, config: &CliConfig) -> Result<()> {
    let api = super::api_client(config)?;
    let environment = super::resolve_environment(&api, &args.env).await?;

    let result = LogArchiveFetcher::new(&api)
        .download(&environment, &args.log_type, args.path.as_deref())
        .await;

    match result {
        Ok(path) => {
            let path = path.display().to_string();
            print_success_json(
                &format!("Log downloaded to {}", path),
                Some(Downloaded { path }),
            );
            Ok(())
        }
        Err(e) => {
            warn!("Download of {} failed: {}", args.log_type, e);
            bail!("Unable to download log. {}", e)
        }
    }
}
