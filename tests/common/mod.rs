//! Common test utilities and fixtures.

#![allow(dead_code)]

use chrono::Duration;
use signalfx_exporter::{Config, ConfigBuilder, Datapoint, MetricBatch};

/// Logger handle that records nothing.
pub fn nop_logger() -> tracing::Span {
    tracing::Span::none()
}

/// Builder pre-filled with the values a real deployment must supply.
pub fn valid_builder() -> ConfigBuilder {
    ConfigBuilder::new()
        .access_token("testToken")
        .realm("us1")
        .timeout(Duration::seconds(2))
}

/// Config pointing at a mock ingest server.
pub fn config_for_server(uri: &str) -> Config {
    valid_builder()
        .url(format!("{}/v2/datapoint", uri))
        .build()
        .expect("mock server config is valid")
}

/// Small mixed batch with one dimension on every point.
pub fn sample_batch() -> MetricBatch {
    vec![
        Datapoint::gauge("cpu.utilization", 0.75).with_dimension("host", "web-1"),
        Datapoint::counter("http.requests", 12_i64).with_dimension("host", "web-1"),
        Datapoint::cumulative_counter("bytes.sent", 4096_i64).with_dimension("host", "web-1"),
    ]
    .into()
}
