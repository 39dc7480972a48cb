//! Metric data model consumed by the exporter.

pub mod types;

pub use types::{Datapoint, MetricBatch, MetricKind, MetricValue};
