//! HTTP implementation of the Cloud API

use async_trait::async_trait;
use bytes::Bytes;
use cloudctl_core::{
    ApiConfig, Environment, Error, LogTypeDescriptor, Result, StreamConnectionParams,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::CloudApi;

/// HAL collection envelope: `{"_embedded": {"items": [...]}}`
#[derive(Debug, Deserialize)]
struct Collection<T> {
    #[serde(rename = "_embedded")]
    embedded: Embedded<T>,
}

#[derive(Debug, Deserialize)]
struct Embedded<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct LogTypeItem {
    #[serde(rename = "type")]
    log_type: String,
    label: String,
    #[serde(default)]
    flags: LogFlags,
}

#[derive(Debug, Default, Deserialize)]
struct LogFlags {
    #[serde(default)]
    available: bool,
}

impl From<LogTypeItem> for LogTypeDescriptor {
    fn from(item: LogTypeItem) -> Self {
        LogTypeDescriptor::new(item.log_type, item.label, item.flags.available)
    }
}

#[derive(Debug, Deserialize)]
struct LogstreamEnvelope {
    logstream: StreamConnectionParams,
}

/// Error body returned by the API on non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Cloud API client over HTTPS
pub struct HttpCloudApi {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpCloudApi {
    /// Create a client from configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("cloudctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(
            config.base_url.clone(),
            config.token.clone(),
            client,
        ))
    }

    /// Create with a custom HTTP client (useful for testing)
    pub fn with_client(base_url: String, token: Option<String>, client: reqwest::Client) -> Self {
        Self {
            base_url,
            token,
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and turn transport failures and error statuses into `Error::Remote`
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::remote(format!("request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or_else(|| format!("HTTP {}", status));

        warn!("Cloud API returned {}: {}", status, message);
        Err(Error::remote_status(status.as_u16(), message))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!("GET {}", path);
        let response = self.send(self.request(Method::GET, path)).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::remote(format!("invalid response from {}: {}", path, e)))
    }
}

#[async_trait]
impl CloudApi for HttpCloudApi {
    async fn environments(&self, application: &str) -> Result<Vec<Environment>> {
        let collection: Collection<Environment> = self
            .get_json(&format!("applications/{}/environments", application))
            .await?;
        Ok(collection.embedded.items)
    }

    async fn log_types(&self, environment_id: &str) -> Result<Vec<LogTypeDescriptor>> {
        let collection: Collection<LogTypeItem> = self
            .get_json(&format!("environments/{}/logs", environment_id))
            .await?;
        Ok(collection
            .embedded
            .items
            .into_iter()
            .map(LogTypeDescriptor::from)
            .collect())
    }

    async fn create_snapshot(&self, environment_id: &str, log_type: &str) -> Result<()> {
        let path = format!("environments/{}/logs/{}", environment_id, log_type);
        debug!("POST {}", path);
        self.send(self.request(Method::POST, &path)).await?;
        info!("Snapshot requested for {} on {}", log_type, environment_id);
        Ok(())
    }

    async fn download_archive(&self, environment_id: &str, log_type: &str) -> Result<Bytes> {
        let path = format!("environments/{}/logs/{}/download", environment_id, log_type);
        debug!("GET {} (archive)", path);
        let response = self.send(self.request(Method::GET, &path)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::remote(format!("archive download interrupted: {}", e)))?;
        debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes)
    }

    async fn stream_params(&self, environment_id: &str) -> Result<StreamConnectionParams> {
        let envelope: LogstreamEnvelope = self
            .get_json(&format!("environments/{}/logstream", environment_id))
            .await?;
        Ok(envelope.logstream)
    }
}
