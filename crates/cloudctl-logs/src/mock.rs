//! Mock implementations for testing

use async_trait::async_trait;
use cloudctl_core::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::transport::{LogConnection, LogTransport, ReconnectPolicy, TransportEvent};

/// What the next call to `connect` does
#[derive(Debug, Clone)]
pub enum MockConnect {
    /// Open a connection that yields these events, then waits forever
    Script(Vec<TransportEvent>),
    /// Fail with a connection error
    Fail(String),
    /// Never finish connecting
    Hang,
}

/// Counters shared between a mock transport and its connections
#[derive(Debug, Clone, Default)]
pub struct TransportStats {
    attempts: Arc<AtomicUsize>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl TransportStats {
    /// Calls to `connect`, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Connections opened and not yet closed
    pub fn open(&self) -> usize {
        self.opened() - self.closed()
    }
}

/// A transport that plays back scripted connections
pub struct MockTransport {
    script: VecDeque<MockConnect>,
    policy: ReconnectPolicy,
    stats: TransportStats,
}

impl MockTransport {
    /// Each `connect` consumes the next entry; an exhausted script fails
    pub fn new(script: Vec<MockConnect>) -> Self {
        Self {
            script: script.into(),
            policy: ReconnectPolicy::immediate(1),
            stats: TransportStats::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn stats(&self) -> TransportStats {
        self.stats.clone()
    }
}

#[async_trait]
impl LogTransport for MockTransport {
    async fn connect(&mut self) -> Result<Box<dyn LogConnection>> {
        self.stats.attempts.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front() {
            Some(MockConnect::Script(events)) => {
                self.stats.opened.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(MockConnection {
                    events: events.into(),
                    stats: self.stats.clone(),
                    closed: false,
                }))
            }
            Some(MockConnect::Fail(message)) => Err(Error::connection(message)),
            Some(MockConnect::Hang) => std::future::pending().await,
            None => Err(Error::connection("no more scripted connections")),
        }
    }

    fn reconnect_policy(&self) -> &ReconnectPolicy {
        &self.policy
    }
}

/// A scripted connection
pub struct MockConnection {
    events: VecDeque<TransportEvent>,
    stats: TransportStats,
    closed: bool,
}

#[async_trait]
impl LogConnection for MockConnection {
    async fn next_event(&mut self) -> TransportEvent {
        match self.events.pop_front() {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.stats.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// An output sink that can be inspected while a session writes to it
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).to_string()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
