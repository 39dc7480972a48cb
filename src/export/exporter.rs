//! Runtime metrics exporter bound to one validated configuration.

use crate::core::{Config, ExporterError, Result};
use crate::export::sink::MetricsSink;
use crate::metrics::MetricBatch;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::Instrument;
use url::Url;

/// Exporter lifecycle.
///
/// `Constructed` is only observable inside the factory; a returned exporter
/// is already `Active`. `Shutdown` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExporterState {
    /// Built, not yet handed out
    Constructed = 0,
    /// Accepting pushes
    Active = 1,
    /// Resources released
    Shutdown = 2,
}

impl ExporterState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ExporterState::Constructed,
            1 => ExporterState::Active,
            _ => ExporterState::Shutdown,
        }
    }
}

/// Push counters for one exporter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExporterStats {
    /// Batches the sink accepted
    pub batches_sent: u64,
    /// Datapoints in accepted batches
    pub datapoints_sent: u64,
    /// Batches the sink rejected
    pub batches_failed: u64,
}

/// Sends metric batches to SignalFx.
///
/// Push may be called concurrently from several tasks. Calling `push` after
/// [`shutdown`](Self::shutdown) fails with [`ExporterError::ExporterShutdown`]
/// and never reaches the sink.
pub struct MetricsExporter {
    config: Config,
    ingest_url: Url,
    sink: Arc<dyn MetricsSink>,
    logger: tracing::Span,
    state: AtomicU8,
    batches_sent: AtomicU64,
    datapoints_sent: AtomicU64,
    batches_failed: AtomicU64,
}

impl MetricsExporter {
    /// Bind a validated config to a sink. Only the factory calls this.
    pub(crate) fn new(
        config: Config,
        ingest_url: Url,
        sink: Arc<dyn MetricsSink>,
        logger: tracing::Span,
    ) -> Self {
        let exporter = Self {
            config,
            ingest_url,
            sink,
            logger,
            state: AtomicU8::new(ExporterState::Constructed as u8),
            batches_sent: AtomicU64::new(0),
            datapoints_sent: AtomicU64::new(0),
            batches_failed: AtomicU64::new(0),
        };
        exporter
            .state
            .store(ExporterState::Active as u8, Ordering::Release);
        exporter
    }

    /// Current lifecycle state
    pub fn state(&self) -> ExporterState {
        ExporterState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Configuration this exporter was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolved ingest endpoint
    pub fn ingest_url(&self) -> &Url {
        &self.ingest_url
    }

    /// Snapshot of push counters
    pub fn stats(&self) -> ExporterStats {
        ExporterStats {
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            datapoints_sent: self.datapoints_sent.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
        }
    }

    /// Send one batch. An empty batch succeeds without contacting the sink.
    pub async fn push(&self, batch: &MetricBatch) -> Result<()> {
        if self.state() == ExporterState::Shutdown {
            return Err(ExporterError::ExporterShutdown);
        }
        if batch.is_empty() {
            return Ok(());
        }

        let result = self
            .sink
            .send(batch)
            .instrument(self.logger.clone())
            .await;

        match &result {
            Ok(()) => {
                self.batches_sent.fetch_add(1, Ordering::Relaxed);
                self.datapoints_sent
                    .fetch_add(batch.len() as u64, Ordering::Relaxed);
            },
            Err(e) => {
                self.batches_failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    parent: &self.logger,
                    exporter = %self.config.settings.name,
                    category = e.category(),
                    points = batch.len(),
                    "Failed to push metrics: {}",
                    e
                );
            },
        }

        result
    }

    /// Stop the exporter and release its transport.
    ///
    /// Only the first call does any work; later calls return `Ok(())`.
    pub async fn shutdown(&self) -> Result<()> {
        let previous = self.state.swap(ExporterState::Shutdown as u8, Ordering::AcqRel);
        if ExporterState::from_u8(previous) == ExporterState::Shutdown {
            return Ok(());
        }

        self.sink.shutdown().instrument(self.logger.clone()).await?;

        let stats = self.stats();
        tracing::info!(
            parent: &self.logger,
            exporter = %self.config.settings.name,
            batches_sent = stats.batches_sent,
            batches_failed = stats.batches_failed,
            "SignalFx exporter shut down"
        );
        Ok(())
    }
}

impl std::fmt::Debug for MetricsExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsExporter")
            .field("name", &self.config.settings.name)
            .field("ingest_url", &self.ingest_url.as_str())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
