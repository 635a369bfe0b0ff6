//! Streaming transport abstraction
//!
//! A transport opens connections; a connection yields events until it drops.
//! Retrying after a drop belongs to the transport, the session only sees
//! whether a new connection came back.

mod logstream;
mod reconnect;

pub use logstream::{LogstreamConnection, LogstreamTransport};
pub use reconnect::ReconnectPolicy;

use async_trait::async_trait;
use cloudctl_core::{Error, LogLine, Result};
use tracing::{debug, warn};

/// What a live connection produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A log line
    Line(LogLine),
    /// Keepalive or control traffic with no line
    Heartbeat,
    /// The connection is gone, with the reason
    Disconnected(String),
}

/// One open connection to the log stream
#[async_trait]
pub trait LogConnection: Send {
    /// Wait for the next event. Must be safe to drop mid-await.
    async fn next_event(&mut self) -> TransportEvent;

    /// Release the connection
    async fn close(&mut self);
}

/// Opens log stream connections and owns the retry policy
#[async_trait]
pub trait LogTransport: Send {
    /// Open a connection
    async fn connect(&mut self) -> Result<Box<dyn LogConnection>>;

    fn reconnect_policy(&self) -> &ReconnectPolicy;

    /// Open a new connection after a drop, backing off between attempts
    async fn reconnect(&mut self) -> Result<Box<dyn LogConnection>> {
        let policy = self.reconnect_policy().clone();
        let mut attempt = 0;
        let mut last_error = String::from("no attempts allowed");

        while policy.should_retry(attempt) {
            attempt += 1;
            let delay = policy.delay_for_attempt(attempt);
            debug!("Reconnect attempt {} in {:?}", attempt, delay);
            tokio::time::sleep(delay).await;

            match self.connect().await {
                Ok(connection) => return Ok(connection),
                Err(e) => {
                    warn!("Reconnect attempt {} failed: {}", attempt, e);
                    last_error = e.to_string();
                }
            }
        }

        Err(Error::connection(format!(
            "reconnect failed after {} attempts: {}",
            attempt, last_error
        )))
    }
}
