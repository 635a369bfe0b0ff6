//! cloudctl CLI - logs for cloud application environments

use anyhow::Result;
use clap::Parser;
use cloudctl_core::CliConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::*;

/// Load the config file and apply command line overrides
fn load_config(cli: &Cli) -> Result<CliConfig> {
    let mut config = CliConfig::resolve(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.api.token = Some(token.clone());
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set JSON output mode if requested
    output::set_json_mode(cli.json);

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let default_filter = format!(
        "cloudctl={0},cloudctl_core={0},cloudctl_api={0},cloudctl_logs={0}",
        log_level
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let result = match load_config(&cli) {
        Ok(config) => match cli.command {
            Commands::LogList(args) => log_list::execute(args, &config).await,
            Commands::LogStream(args) => log_stream::execute(args, &config).await,
            Commands::LogSnapshot(args) => log_snapshot::execute(args, &config).await,
            Commands::LogDownload(args) => log_download::execute(args, &config).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        output::print_error_json(&e.to_string());
        std::process::exit(1);
    }

    Ok(())
}
