//! Live log stream session
//!
//! ```text
//! Disconnected -> Connecting -> Streaming <-> Reconnecting
//!                     |             |              |
//!                     +-------------+--------------+--> Closed
//! ```
//!
//! Cancellation is observed at every await point: connecting, waiting for the
//! next event and reconnecting.

use cloudctl_core::{Error, ErrorKind, Result, StreamConfig};
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::filter::LogFilter;
use crate::render::LineRenderer;
use crate::transport::{LogConnection, LogTransport, TransportEvent};

/// Lifecycle of a stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Streaming,
    Reconnecting,
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Streaming => "streaming",
            SessionState::Reconnecting => "reconnecting",
            SessionState::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

/// Counters of a finished (or running) session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub rendered: u64,
    pub filtered: u64,
    pub heartbeats: u64,
    pub reconnects: u32,
}

/// Why the streaming loop stopped
enum Outcome {
    Cancelled,
    Failed(Error),
}

/// Owns one live log tail from first connect until cancel or failure
pub struct LogStreamSession<W: Write + Send> {
    transport: Box<dyn LogTransport>,
    filter: LogFilter,
    renderer: LineRenderer<W>,
    idle_timeout: Duration,
    state_tx: watch::Sender<SessionState>,
    history: Vec<SessionState>,
    summary: SessionSummary,
}

impl<W: Write + Send> LogStreamSession<W> {
    pub fn new(
        transport: Box<dyn LogTransport>,
        filter: LogFilter,
        renderer: LineRenderer<W>,
        config: &StreamConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Disconnected);
        Self {
            transport,
            filter,
            renderer,
            idle_timeout: config.idle_timeout(),
            state_tx,
            history: vec![SessionState::Disconnected],
            summary: SessionSummary::default(),
        }
    }

    /// Silence after which the connection counts as lost
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Follow state changes from another task
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Every state the session has been in, in order
    pub fn transitions(&self) -> &[SessionState] {
        &self.history
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    pub fn filter(&self) -> &LogFilter {
        &self.filter
    }

    pub fn into_renderer(self) -> LineRenderer<W> {
        self.renderer
    }

    fn transition(&mut self, next: SessionState) {
        let previous = self.state_tx.send_replace(next);
        debug!("Stream session {} -> {}", previous, next);
        self.history.push(next);
    }

    /// Run until `cancel` fires or the connection is lost for good.
    ///
    /// Cancellation returns `Ok`. A failed first connect is not retried: the
    /// connection parameters may already be spent.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<SessionSummary> {
        if self.state() != SessionState::Disconnected {
            return Err(Error::connection(format!(
                "stream session already {}; start a new session with fresh parameters",
                self.state()
            )));
        }

        self.transition(SessionState::Connecting);
        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.transport.connect() => Some(result),
        };

        let connection = match connected {
            None => {
                info!("Stream cancelled while connecting");
                self.transition(SessionState::Closed);
                return Ok(self.summary);
            }
            Some(Err(e)) => {
                self.transition(SessionState::Closed);
                return Err(match e.kind() {
                    ErrorKind::Connection => e,
                    _ => Error::connection(e.to_string()),
                });
            }
            Some(Ok(connection)) => connection,
        };

        self.transition(SessionState::Streaming);
        let outcome = self.stream(connection, &cancel).await;
        self.transition(SessionState::Closed);

        match outcome {
            Outcome::Cancelled => {
                info!(
                    "Stream closed: {} lines rendered, {} filtered, {} reconnects",
                    self.summary.rendered, self.summary.filtered, self.summary.reconnects
                );
                Ok(self.summary)
            }
            Outcome::Failed(e) => Err(e),
        }
    }

    async fn stream(
        &mut self,
        mut connection: Box<dyn LogConnection>,
        cancel: &CancellationToken,
    ) -> Outcome {
        let idle_timeout = self.idle_timeout;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                event = timeout(idle_timeout, connection.next_event()) => Some(event),
            };

            let event = match next {
                None => {
                    connection.close().await;
                    return Outcome::Cancelled;
                }
                Some(Err(_)) => {
                    TransportEvent::Disconnected(format!("no traffic for {:?}", idle_timeout))
                }
                Some(Ok(event)) => event,
            };

            match event {
                TransportEvent::Line(line) => {
                    if !self.filter.matches(&line) {
                        self.summary.filtered += 1;
                        continue;
                    }
                    if let Err(e) = self.renderer.render(&line) {
                        connection.close().await;
                        return match e {
                            Error::IoError(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                                debug!("Output closed, stopping stream");
                                Outcome::Cancelled
                            }
                            e => Outcome::Failed(e),
                        };
                    }
                    self.summary.rendered += 1;
                }
                TransportEvent::Heartbeat => {
                    self.summary.heartbeats += 1;
                }
                TransportEvent::Disconnected(reason) => {
                    warn!("Log stream disconnected: {}", reason);
                    connection.close().await;
                    self.transition(SessionState::Reconnecting);

                    let reconnected = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        result = self.transport.reconnect() => Some(result),
                    };

                    connection = match reconnected {
                        None => return Outcome::Cancelled,
                        Some(Err(e)) => return Outcome::Failed(e),
                        Some(Ok(connection)) => connection,
                    };
                    self.summary.reconnects += 1;
                    info!("Log stream reconnected");
                    self.transition(SessionState::Streaming);
                }
            }
        }
    }
}
