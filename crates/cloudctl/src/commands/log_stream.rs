//! log:stream command implementation

use anyhow::Result;
use cloudctl_api::CloudApi;
use cloudctl_core::CliConfig;
use cloudctl_logs::{LineRenderer, LogFilter, LogStreamSession, LogstreamTransport};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::StreamArgs;
use crate::output::{print_notice, stdout_is_tty};

pub async fn execute(args: StreamArgs, config: &CliConfig) -> Result<()> {
    let api = super::api_client(config)?;
    let environment = super::resolve_environment(&api, &args.env).await?;

    let filter = LogFilter::new(args.log_types, args.servers);
    let params = api.stream_params(&environment.id).await?;
    debug!("Stream parameters: {:?}", params);

    if args.colourise {
        // Asked for explicitly, so keep colours even when piped
        colored::control::set_override(true);
        if !stdout_is_tty() {
            debug!("stdout is not a terminal, writing colour codes anyway");
        }
    }

    let transport = LogstreamTransport::new(params, filter.clone(), &config.stream);
    let renderer = LineRenderer::new(std::io::stdout(), args.colourise);
    let mut session = LogStreamSession::new(Box::new(transport), filter, renderer, &config.stream);

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    print_notice(&format!(
        "Streaming logs from {} ({}), press Ctrl-C to stop",
        environment.label, environment.name
    ));
    let summary = session.run(cancel).await?;
    info!(
        "{} lines shown, {} filtered out",
        summary.rendered, summary.filtered
    );
    Ok(())
}

/// Cancel the session on Ctrl-C or SIGTERM
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            debug!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                debug!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => debug!("Received Ctrl-C"),
        _ = terminate => debug!("Received SIGTERM"),
    }
    cancel.cancel();
}
