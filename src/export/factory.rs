//! Exporter factory: the surface a pipeline host calls.

use crate::core::{Config, ExporterError, Result, TYPE_STR};
use crate::export::exporter::MetricsExporter;
use crate::export::sink::{build_headers, HttpSink, MetricsSink};
use std::sync::Arc;
use url::Url;

/// Capabilities a pipeline host expects from an exporter plugin.
pub trait ExporterFactory {
    /// Trace exporter produced by this factory
    type TraceExporter;

    /// Identifier used to route configuration blocks to this factory
    fn type_str(&self) -> &'static str;

    /// Defaults for a fresh configuration block
    fn create_default_config(&self) -> Config;

    /// Validate `config` and build a metrics exporter from it
    fn create_metrics_exporter(
        &self,
        logger: &tracing::Span,
        config: &Config,
    ) -> Result<MetricsExporter>;

    /// Build a trace exporter
    fn create_trace_exporter(
        &self,
        logger: &tracing::Span,
        config: &Config,
    ) -> Result<Self::TraceExporter>;
}

/// Uninhabited: SignalFx ingest takes metrics only, so no trace exporter
/// value can exist.
#[derive(Debug)]
pub enum NoTraceExporter {}

/// Factory for SignalFx metrics exporters
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalFxFactory;

impl SignalFxFactory {
    /// Validate `config` and bind it to a caller-supplied sink.
    pub fn create_metrics_exporter_with_sink(
        &self,
        logger: &tracing::Span,
        config: &Config,
        sink: Arc<dyn MetricsSink>,
    ) -> Result<MetricsExporter> {
        let ingest_url = Self::prepare(config)?;
        Ok(Self::bind(logger, config, ingest_url, sink))
    }

    fn prepare(config: &Config) -> Result<Url> {
        config.validate()?;
        config.ingest_url()
    }

    fn bind(
        logger: &tracing::Span,
        config: &Config,
        ingest_url: Url,
        sink: Arc<dyn MetricsSink>,
    ) -> MetricsExporter {
        tracing::debug!(
            parent: logger,
            exporter = %config.settings.name,
            realm = %config.realm,
            url = %ingest_url,
            "Created SignalFx metrics exporter"
        );
        MetricsExporter::new(config.clone(), ingest_url, sink, logger.clone())
    }
}

impl ExporterFactory for SignalFxFactory {
    type TraceExporter = NoTraceExporter;

    fn type_str(&self) -> &'static str {
        TYPE_STR
    }

    fn create_default_config(&self) -> Config {
        Config::default()
    }

    fn create_metrics_exporter(
        &self,
        logger: &tracing::Span,
        config: &Config,
    ) -> Result<MetricsExporter> {
        let ingest_url = Self::prepare(config)?;

        let headers = build_headers(&config.access_token, &config.headers)?;
        // Validation guarantees a non-negative timeout.
        let timeout = config
            .timeout
            .to_std()
            .map_err(|_| ExporterError::InvalidTimeout)?;
        let sink = HttpSink::new(ingest_url.clone(), headers, timeout)?;

        Ok(Self::bind(logger, config, ingest_url, Arc::new(sink)))
    }

    fn create_trace_exporter(
        &self,
        _logger: &tracing::Span,
        _config: &Config,
    ) -> Result<NoTraceExporter> {
        Err(ExporterError::UnsupportedSignal)
    }
}
