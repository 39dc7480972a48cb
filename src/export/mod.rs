//! SignalFx metrics export.
//!
//! - `factory`: host-facing factory (default config, metrics exporter,
//!   trace refusal)
//! - `exporter`: exporter lifecycle and push path
//! - `sink`: transport seam, HTTP and in-memory sinks
//! - `translate`: SignalFx JSON datapoint encoding

pub mod exporter;
pub mod factory;
pub mod sink;
pub mod translate;

pub use exporter::{ExporterState, ExporterStats, MetricsExporter};
pub use factory::{ExporterFactory, NoTraceExporter, SignalFxFactory};
pub use sink::{HttpSink, MemorySink, MetricsSink};
