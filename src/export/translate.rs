//! SignalFx JSON datapoint encoding.
//!
//! The `/v2/datapoint` endpoint takes one object keyed by metric type:
//!
//! ```json
//! {"gauge": [{"metric": "cpu", "value": 1.5, "dimensions": {"host": "a"}}]}
//! ```

use crate::core::Result;
use crate::metrics::{Datapoint, MetricBatch, MetricKind, MetricValue};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct SfxDatapoint<'a> {
    metric: &'a str,
    value: MetricValue,
    #[serde(skip_serializing_if = "no_dimensions")]
    dimensions: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
}

#[derive(Serialize, Default)]
struct SfxBody<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    gauge: Vec<SfxDatapoint<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    counter: Vec<SfxDatapoint<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cumulative_counter: Vec<SfxDatapoint<'a>>,
}

fn no_dimensions(dimensions: &&BTreeMap<String, String>) -> bool {
    dimensions.is_empty()
}

impl<'a> From<&'a Datapoint> for SfxDatapoint<'a> {
    fn from(point: &'a Datapoint) -> Self {
        SfxDatapoint {
            metric: &point.metric,
            value: point.value,
            dimensions: &point.dimensions,
            timestamp: point.timestamp_ms,
        }
    }
}

/// Encode a batch as a SignalFx JSON request body.
pub fn encode_batch(batch: &MetricBatch) -> Result<Vec<u8>> {
    let mut body = SfxBody::default();
    for point in batch {
        let bucket = match point.kind {
            MetricKind::Gauge => &mut body.gauge,
            MetricKind::Counter => &mut body.counter,
            MetricKind::CumulativeCounter => &mut body.cumulative_counter,
        };
        bucket.push(SfxDatapoint::from(point));
    }
    Ok(serde_json::to_vec(&body)?)
}
