//! Metric datapoints as handed to the exporter by the pipeline.
//!
//! The model follows the SignalFx ingest vocabulary: every datapoint is a
//! gauge, a delta counter or a cumulative counter, carrying flat string
//! dimensions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// SignalFx metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Point-in-time measurement (CPU usage, queue depth)
    Gauge,
    /// Count accumulated since the previous report
    Counter,
    /// Monotonically increasing total since process start
    CumulativeCounter,
}

/// Datapoint value, integer or floating point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Integer value
    Int(i64),
    /// Floating point value
    Double(f64),
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Double(v)
    }
}

/// One metric value with its dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct Datapoint {
    /// Metric name
    pub metric: String,
    /// Metric type
    pub kind: MetricKind,
    /// Value
    pub value: MetricValue,
    /// Dimensions, sorted by key
    pub dimensions: BTreeMap<String, String>,
    /// Milliseconds since the Unix epoch; `None` lets ingest stamp it
    pub timestamp_ms: Option<i64>,
}

impl Datapoint {
    /// Create a datapoint of the given kind
    pub fn new(metric: impl Into<String>, kind: MetricKind, value: impl Into<MetricValue>) -> Self {
        Self {
            metric: metric.into(),
            kind,
            value: value.into(),
            dimensions: BTreeMap::new(),
            timestamp_ms: None,
        }
    }

    /// Create a gauge datapoint
    pub fn gauge(metric: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        Self::new(metric, MetricKind::Gauge, value)
    }

    /// Create a delta counter datapoint
    pub fn counter(metric: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        Self::new(metric, MetricKind::Counter, value)
    }

    /// Create a cumulative counter datapoint
    pub fn cumulative_counter(metric: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        Self::new(metric, MetricKind::CumulativeCounter, value)
    }

    /// Add a dimension
    pub fn with_dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(key.into(), value.into());
        self
    }

    /// Set the timestamp in epoch milliseconds
    pub fn at(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }
}

/// Batch of datapoints pushed in one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricBatch {
    points: Vec<Datapoint>,
}

impl MetricBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a datapoint
    pub fn push(&mut self, point: Datapoint) {
        self.points.push(point);
    }

    /// Number of datapoints
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the batch holds no datapoints
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over datapoints in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Datapoint> {
        self.points.iter()
    }
}

impl From<Vec<Datapoint>> for MetricBatch {
    fn from(points: Vec<Datapoint>) -> Self {
        Self { points }
    }
}

impl FromIterator<Datapoint> for MetricBatch {
    fn from_iter<I: IntoIterator<Item = Datapoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MetricBatch {
    type Item = &'a Datapoint;
    type IntoIter = std::slice::Iter<'a, Datapoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
