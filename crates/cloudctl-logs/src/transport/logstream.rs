//! WebSocket logstream transport
//!
//! Protocol (JSON text frames):
//! - client → server: the stream params object as the first frame, then
//!   `{"cmd":"enable","type":T,"server":S}` for every source it wants
//! - server → client: `available` announces a source, `line` carries a log
//!   line, everything else is control traffic

use async_trait::async_trait;
use cloudctl_core::{Error, LogLine, Result, StreamConfig, StreamConnectionParams};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use super::{LogConnection, LogTransport, ReconnectPolicy, TransportEvent};
use crate::filter::LogFilter;

/// Bound on the closing handshake
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
enum ServerMessage {
    Available {
        #[serde(rename = "type")]
        log_type: String,
        server: String,
    },
    Line {
        log_type: String,
        server: String,
        text: String,
        #[serde(default)]
        unix_time: Option<i64>,
    },
    Connected,
    Success,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize)]
struct EnableCommand<'a> {
    cmd: &'static str,
    #[serde(rename = "type")]
    log_type: &'a str,
    server: &'a str,
}

impl<'a> EnableCommand<'a> {
    fn new(log_type: &'a str, server: &'a str) -> Self {
        Self {
            cmd: "enable",
            log_type,
            server,
        }
    }
}

/// Log stream over the platform's WebSocket service
pub struct LogstreamTransport {
    params: StreamConnectionParams,
    filter: LogFilter,
    connect_timeout: Duration,
    policy: ReconnectPolicy,
}

impl LogstreamTransport {
    pub fn new(params: StreamConnectionParams, filter: LogFilter, config: &StreamConfig) -> Self {
        Self {
            params,
            filter,
            connect_timeout: config.connect_timeout(),
            policy: ReconnectPolicy::from(&config.reconnect),
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl LogTransport for LogstreamTransport {
    async fn connect(&mut self) -> Result<Box<dyn LogConnection>> {
        let url = self.params.url();
        if !url.starts_with("ws://") && !url.starts_with("wss://") {
            return Err(Error::connection(format!(
                "invalid logstream URL: {}, must start with ws:// or wss://",
                url
            )));
        }

        debug!("Connecting to logstream at {}", url);
        let (mut ws, _response) = timeout(self.connect_timeout, connect_async(url))
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "connecting to {} took longer than {:?}",
                    url, self.connect_timeout
                ))
            })?
            .map_err(|e| Error::connection(format!("failed to connect to {}: {}", url, e)))?;

        let auth = self.params.auth_frame()?;
        ws.send(Message::Text(auth))
            .await
            .map_err(|e| Error::connection(format!("failed to authenticate: {}", e)))?;

        info!("Connected to logstream");
        Ok(Box::new(LogstreamConnection {
            ws,
            filter: self.filter.clone(),
        }))
    }

    fn reconnect_policy(&self) -> &ReconnectPolicy {
        &self.policy
    }
}

/// An open logstream socket
pub struct LogstreamConnection {
    ws: WsStream,
    filter: LogFilter,
}

impl LogstreamConnection {
    async fn handle_text(&mut self, text: &str) -> TransportEvent {
        let message = match serde_json::from_str::<ServerMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Ignoring malformed logstream frame: {}", e);
                return TransportEvent::Heartbeat;
            }
        };

        match message {
            ServerMessage::Line {
                log_type,
                server,
                text,
                unix_time,
            } => {
                let line = LogLine::new(server, log_type, text);
                TransportEvent::Line(match unix_time {
                    Some(secs) => line.with_unix_time(secs),
                    None => line,
                })
            }
            ServerMessage::Available { log_type, server } => {
                if !self.filter.allows(&log_type, &server) {
                    trace!("Skipping source {} on {}", log_type, server);
                    return TransportEvent::Heartbeat;
                }
                debug!("Enabling source {} on {}", log_type, server);
                let enable = match serde_json::to_string(&EnableCommand::new(&log_type, &server)) {
                    Ok(enable) => enable,
                    Err(e) => return TransportEvent::Disconnected(e.to_string()),
                };
                match self.ws.send(Message::Text(enable)).await {
                    Ok(()) => TransportEvent::Heartbeat,
                    Err(e) => TransportEvent::Disconnected(format!("send failed: {}", e)),
                }
            }
            ServerMessage::Error => {
                warn!("Logstream reported an error: {}", text);
                TransportEvent::Heartbeat
            }
            ServerMessage::Connected | ServerMessage::Success | ServerMessage::Unknown => {
                trace!("Control frame: {}", text);
                TransportEvent::Heartbeat
            }
        }
    }
}

#[async_trait]
impl LogConnection for LogstreamConnection {
    async fn next_event(&mut self) -> TransportEvent {
        loop {
            let message = match self.ws.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => return TransportEvent::Disconnected(format!("read failed: {}", e)),
                None => return TransportEvent::Disconnected("stream ended".to_string()),
            };

            return match message {
                Message::Text(text) => self.handle_text(&text).await,
                Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {
                    TransportEvent::Heartbeat
                }
                Message::Close(frame) => TransportEvent::Disconnected(match frame {
                    Some(frame) => format!("closed by server: {}", frame.reason),
                    None => "closed by server".to_string(),
                }),
                Message::Frame(_) => continue,
            };
        }
    }

    async fn close(&mut self) {
        match timeout(CLOSE_TIMEOUT, self.ws.close(None)).await {
            Ok(Ok(())) => debug!("Logstream closed"),
            Ok(Err(e)) => debug!("Logstream close: {}", e),
            Err(_) => debug!("Logstream close timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cloudctl_core::ErrorKind;
    use serde_json::{json, Map, Value};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio_tungstenite::accept_async;

    fn params(url: String) -> StreamConnectionParams {
        let mut map = Map::new();
        map.insert("cmd".into(), json!("stream-environment"));
        map.insert("environment".into(), json!("24-a47ac10b"));
        map.insert("hmac".into(), json!("abc"));
        StreamConnectionParams::new(url, map)
    }

    fn text(value: Value) -> Message {
        Message::Text(value.to_string())
    }

    #[tokio::test]
    async fn test_stream_protocol() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();

            if let Some(Ok(Message::Text(auth))) = ws.next().await {
                tx.send(auth).unwrap();
            }
            ws.send(text(json!({"cmd": "connected"}))).await.unwrap();
            ws.send(text(json!({"cmd": "available", "type": "apache-request", "server": "web-1"})))
                .await
                .unwrap();
            ws.send(text(json!({"cmd": "available", "type": "php-error", "server": "web-1"})))
                .await
                .unwrap();
            ws.send(text(json!({
                "cmd": "line",
                "log_type": "php-error",
                "server": "web-1",
                "text": "PHP Fatal error",
                "unix_time": 1516051001
            })))
            .await
            .unwrap();

            if let Some(Ok(Message::Text(enable))) = ws.next().await {
                tx.send(enable).unwrap();
            }
            let _ = ws.close(None).await;
        });

        let filter = LogFilter::new(["php-error"], Vec::<String>::new());
        let mut transport = LogstreamTransport::new(
            params(format!("ws://{}", addr)),
            filter,
            &StreamConfig::default(),
        );
        let mut conn = transport.connect().await.unwrap();

        let auth: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(auth["cmd"], "stream-environment");
        assert_eq!(auth["hmac"], "abc");

        assert_eq!(conn.next_event().await, TransportEvent::Heartbeat); // connected
        assert_eq!(conn.next_event().await, TransportEvent::Heartbeat); // filtered source
        assert_eq!(conn.next_event().await, TransportEvent::Heartbeat); // enabled source

        match conn.next_event().await {
            TransportEvent::Line(line) => {
                assert_eq!(line.server, "web-1");
                assert_eq!(line.log_type, "php-error");
                assert_eq!(line.text, "PHP Fatal error");
                assert_eq!(line.timestamp, Utc.timestamp_opt(1516051001, 0).unwrap());
            }
            other => panic!("expected a line, got {:?}", other),
        }

        let enable: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(
            enable,
            json!({"cmd": "enable", "type": "php-error", "server": "web-1"})
        );

        assert!(matches!(
            conn.next_event().await,
            TransportEvent::Disconnected(_)
        ));
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_frames_are_heartbeats() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let _ = ws.next().await;
            ws.send(text(json!({"cmd": "list-available", "items": []})))
                .await
                .unwrap();
            ws.send(Message::Text("not json".to_string())).await.unwrap();
            ws.send(text(json!({"cmd": "error", "code": 401}))).await.unwrap();
            drop(ws);
        });

        let mut transport = LogstreamTransport::new(
            params(format!("ws://{}", addr)),
            LogFilter::all(),
            &StreamConfig::default(),
        );
        let mut conn = transport.connect().await.unwrap();

        assert_eq!(conn.next_event().await, TransportEvent::Heartbeat);
        assert_eq!(conn.next_event().await, TransportEvent::Heartbeat);
        assert_eq!(conn.next_event().await, TransportEvent::Heartbeat);
        assert!(matches!(
            conn.next_event().await,
            TransportEvent::Disconnected(_)
        ));
        conn.close().await;
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut transport = LogstreamTransport::new(
            params(format!("ws://{}", addr)),
            LogFilter::all(),
            &StreamConfig::default(),
        );
        let err = transport.connect().await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[tokio::test]
    async fn test_connect_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept the socket but never answer the handshake
        let _hold = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(stream);
        });

        let mut transport = LogstreamTransport::new(
            params(format!("ws://{}", addr)),
            LogFilter::all(),
            &StreamConfig::default(),
        )
        .with_connect_timeout(Duration::from_millis(200));

        let err = transport.connect().await.err().unwrap();
        assert!(matches!(err, Error::Timeout(_)));
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[tokio::test]
    async fn test_rejects_non_websocket_url() {
        let mut transport = LogstreamTransport::new(
            params("https://logstream.example.com".to_string()),
            LogFilter::all(),
            &StreamConfig::default(),
        );
        let err = transport.connect().await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[tokio::test]
    async fn test_reconnect_gives_up_after_policy_attempts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut transport = LogstreamTransport::new(
            params(format!("ws://{}", addr)),
            LogFilter::all(),
            &StreamConfig::default(),
        )
        .with_policy(ReconnectPolicy::immediate(2));

        let err = transport.reconnect().await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("after 2 attempts"));
    }
}
