//! Transport seam between the exporter and the network.
//!
//! [`MetricsSink`] accepts encoded batches; [`HttpSink`] ships them to
//! SignalFx ingest, [`MemorySink`] keeps them in memory for tests and dry
//! runs. Each batch is sent once; nothing here retries.

use crate::core::{ExporterError, Result};
use crate::export::translate::encode_batch;
use crate::metrics::MetricBatch;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use url::Url;

/// Header carrying the SignalFx access token.
pub const TOKEN_HEADER: &str = "X-SF-Token";

/// Destination for metric batches.
///
/// Implementations must tolerate concurrent `send` calls.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Deliver one batch
    async fn send(&self, batch: &MetricBatch) -> Result<()>;

    /// Release transport resources. Called once by the owning exporter.
    async fn shutdown(&self) -> Result<()>;
}

/// Build request headers: JSON content type, then the token if set, then
/// user overrides. Names match case-insensitively, so a user header wins
/// over a default with the same name.
pub fn build_headers(access_token: &str, extra: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if !access_token.is_empty() {
        let value = HeaderValue::from_str(access_token)
            .map_err(|e| ExporterError::config(format!("Invalid access token: {}", e)))?;
        headers.insert(HeaderName::from_static("x-sf-token"), value);
    }

    for (key, value) in extra {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ExporterError::config(format!("Invalid header name {:?}: {}", key, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ExporterError::config(format!("Invalid value for header {:?}: {}", key, e)))?;
        headers.insert(name, value);
    }

    Ok(headers)
}

/// Sink that POSTs SignalFx JSON to an ingest endpoint
pub struct HttpSink {
    url: Url,
    timeout: Duration,
    /// Dropped on shutdown, which closes pooled connections
    client: Mutex<Option<reqwest::Client>>,
}

impl HttpSink {
    /// Create a sink. A zero `timeout` disables the per-request timeout.
    pub fn new(url: Url, headers: HeaderMap, timeout: Duration) -> Result<Self> {
        let mut builder = reqwest::Client::builder().default_headers(headers);
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ExporterError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url,
            timeout,
            client: Mutex::new(Some(client)),
        })
    }

    /// Ingest endpoint this sink posts to
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn map_send_error(&self, err: reqwest::Error) -> ExporterError {
        if err.is_timeout() {
            ExporterError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            ExporterError::network(err.to_string())
        }
    }
}

#[async_trait]
impl MetricsSink for HttpSink {
    async fn send(&self, batch: &MetricBatch) -> Result<()> {
        // Clone the handle so the lock is not held across the request.
        let client = self.client.lock().clone().ok_or(ExporterError::ExporterShutdown)?;
        let body = encode_batch(batch)?;

        let response = client
            .post(self.url.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status.is_success() {
            tracing::trace!(url = %self.url, points = batch.len(), "Batch accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ExporterError::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn shutdown(&self) -> Result<()> {
        self.client.lock().take();
        Ok(())
    }
}

/// Sink that records every batch in memory
#[derive(Default)]
pub struct MemorySink {
    batches: Mutex<Vec<MetricBatch>>,
    shut_down: AtomicBool,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches received so far
    pub fn batches(&self) -> Vec<MetricBatch> {
        self.batches.lock().clone()
    }

    /// Total datapoints received so far
    pub fn datapoint_count(&self) -> usize {
        self.batches.lock().iter().map(MetricBatch::len).sum()
    }

    /// Whether `shutdown` has been called
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}

#[async_trait]
impl MetricsSink for MemorySink {
    async fn send(&self, batch: &MetricBatch) -> Result<()> {
        if self.is_shut_down() {
            return Err(ExporterError::ExporterShutdown);
        }
        self.batches.lock().push(batch.clone());
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.shut_down.store(true, Ordering::Release);
        Ok(())
    }
}
