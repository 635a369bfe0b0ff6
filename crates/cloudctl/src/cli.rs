//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use cloudctl_core::validate_log_type;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "cloudctl")]
#[command(version, about = "Command line client for cloud application logs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: ~/.cloudctl/config.toml)
    #[arg(long, global = true, env = "CLOUDCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cloud API base URL
    #[arg(long, global = true, env = "CLOUDCTL_API_URL")]
    pub api_url: Option<String>,

    /// Cloud API bearer token
    #[arg(long, global = true, env = "CLOUDCTL_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available logs for an environment
    #[command(name = "log:list")]
    LogList(EnvArgs),

    /// Stream logs from an environment until interrupted
    #[command(name = "log:stream")]
    LogStream(StreamArgs),

    /// Create a log snapshot
    #[command(name = "log:snapshot")]
    LogSnapshot(SnapshotArgs),

    /// Download a log archive
    #[command(name = "log:download")]
    LogDownload(DownloadArgs),
}

#[derive(Args, Debug)]
pub struct EnvArgs {
    /// Application UUID
    pub uuid: Uuid,

    /// Environment name or id
    pub environment: String,
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Colour-code lines by log type and server
    #[arg(short = 'c', long)]
    pub colourise: bool,

    /// Only show these log types (comma-separated or repeated)
    #[arg(short = 't', long = "logtypes", value_delimiter = ',')]
    pub log_types: Vec<String>,

    /// Only show these servers (comma-separated or repeated)
    #[arg(short = 's', long, value_delimiter = ',')]
    pub servers: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Log type, e.g. apache-access
    #[arg(value_parser = parse_log_type)]
    pub log_type: String,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Log type, e.g. apache-access
    #[arg(value_parser = parse_log_type)]
    pub log_type: String,

    /// Where to save the archive. An existing directory receives
    /// `<env>-<type>.tar.gz`; any other value is used as a prefix of that file
    /// name. A temp file when omitted
    pub path: Option<PathBuf>,
}

/// Accept log type identifiers that are safe to use in file names
fn parse_log_type(s: &str) -> Result<String, String> {
    if validate_log_type(s) {
        Ok(s.to_string())
    } else {
        Err(format!(
            "invalid log type '{}': only alphanumeric characters, underscores, and hyphens are allowed",
            s
        ))
    }
}
