//! Mock implementations for testing

use crate::CloudApi;
use async_trait::async_trait;
use bytes::Bytes;
use cloudctl_core::{Environment, Error, LogTypeDescriptor, Result, StreamConnectionParams};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// An in-memory Cloud API that records every call
#[derive(Default)]
pub struct MockCloudApi {
    environments: HashMap<String, Vec<Environment>>,
    log_types: Vec<LogTypeDescriptor>,
    archive: Option<Bytes>,
    stream_url: String,
    stream_params: Map<String, Value>,
    /// Snapshot requests as (environment id, log type)
    snapshots: Mutex<Vec<(String, String)>>,
    call_count: AtomicUsize,
    /// Whether to simulate failures
    should_fail: bool,
}

impl MockCloudApi {
    /// Create a new mock API
    pub fn new() -> Self {
        Self {
            stream_url: "ws://127.0.0.1:9/logstream".to_string(),
            ..Default::default()
        }
    }

    /// Create a mock API where every call fails with a remote error
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new()
        }
    }

    pub fn with_environment(mut self, application: &str, environment: Environment) -> Self {
        self.environments
            .entry(application.to_string())
            .or_default()
            .push(environment);
        self
    }

    pub fn with_log_types(mut self, log_types: Vec<LogTypeDescriptor>) -> Self {
        self.log_types = log_types;
        self
    }

    pub fn with_archive(mut self, archive: impl Into<Bytes>) -> Self {
        self.archive = Some(archive.into());
        self
    }

    pub fn with_stream(mut self, url: impl Into<String>, params: Map<String, Value>) -> Self {
        self.stream_url = url.into();
        self.stream_params = params;
        self
    }

    /// Get the number of API calls made
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get all snapshot requests
    pub async fn snapshots(&self) -> Vec<(String, String)> {
        self.snapshots.lock().await.clone()
    }

    fn record(&self) -> Result<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(Error::remote_status(503, "Mock failure"));
        }
        Ok(())
    }

    fn known_log_type(&self, log_type: &str) -> Result<()> {
        if self.log_types.iter().any(|t| t.log_type == log_type) {
            Ok(())
        } else {
            Err(Error::remote_status(
                404,
                format!("Unknown log type: {}", log_type),
            ))
        }
    }
}

#[async_trait]
impl CloudApi for MockCloudApi {
    async fn environments(&self, application: &str) -> Result<Vec<Environment>> {
        self.record()?;
        self.environments
            .get(application)
            .cloned()
            .ok_or_else(|| Error::remote_status(404, format!("No application {}", application)))
    }

    async fn log_types(&self, _environment_id: &str) -> Result<Vec<LogTypeDescriptor>> {
        self.record()?;
        Ok(self.log_types.clone())
    }

    async fn create_snapshot(&self, environment_id: &str, log_type: &str) -> Result<()> {
        self.record()?;
        self.known_log_type(log_type)?;
        self.snapshots
            .lock()
            .await
            .push((environment_id.to_string(), log_type.to_string()));
        Ok(())
    }

    async fn download_archive(&self, _environment_id: &str, log_type: &str) -> Result<Bytes> {
        self.record()?;
        self.known_log_type(log_type)?;
        self.archive
            .clone()
            .ok_or_else(|| Error::remote_status(404, "No archive available"))
    }

    async fn stream_params(&self, _environment_id: &str) -> Result<StreamConnectionParams> {
        self.record()?;
        Ok(StreamConnectionParams::new(
            self.stream_url.clone(),
            self.stream_params.clone(),
        ))
    }
}
