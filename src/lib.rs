//! SignalFx metrics exporter for collector pipelines.
//!
//! A pipeline host discovers [`SignalFxFactory`] by its type string
//! (`"signalfx"`), asks it for a default configuration, and builds a
//! [`MetricsExporter`] from a filled-in one. Configuration is validated
//! before any network resource is created. Trace export is refused: the
//! backend takes metrics only.
//!
//! # Architecture
//!
//! - `core`: configuration, validation, errors
//! - `metrics`: datapoint model
//! - `export`: factory, exporter lifecycle, sinks, SignalFx encoding
//! - `cli`: the `sfx-export` command
//!
//! # Example
//!
//! ```no_run
//! use signalfx_exporter::{ConfigBuilder, Datapoint, ExporterFactory, MetricBatch, SignalFxFactory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = SignalFxFactory;
//!     let config = ConfigBuilder::from_config(factory.create_default_config())
//!         .access_token("my-token")
//!         .realm("us1")
//!         .build()?;
//!
//!     let exporter = factory.create_metrics_exporter(&tracing::Span::current(), &config)?;
//!     let batch: MetricBatch = vec![Datapoint::gauge("queue.depth", 12_i64)].into();
//!     exporter.push(&batch).await?;
//!     exporter.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod core;
pub mod export;
pub mod metrics;

// Re-export core types for convenience
pub use crate::core::{Config, ConfigBuilder, ErrorKind, ExporterError, Result};
pub use crate::export::{ExporterFactory, MetricsExporter, MetricsSink, SignalFxFactory};
pub use crate::metrics::{Datapoint, MetricBatch};
