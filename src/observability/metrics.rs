//! Metrics collection and exposition.
//!
//! # Metrics
//! - `breach_lookup_searches_total` (counter): searches by dataset
//! - `breach_lookup_query_duration_seconds` (histogram): query latency by dataset
//! - `breach_lookup_rejected_total` (counter): requests refused before querying, by reason
//! - `breach_lookup_rate_limited_total` (counter): throttled search requests
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::store::Dataset;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_search(dataset: Dataset, started: Instant) {
    counter!("breach_lookup_searches_total", "dataset" => dataset.table()).increment(1);
    histogram!("breach_lookup_query_duration_seconds", "dataset" => dataset.table())
        .record(started.elapsed().as_secs_f64());
}

pub fn record_rejected(reason: &'static str) {
    counter!("breach_lookup_rejected_total", "reason" => reason).increment(1);
}

pub fn record_rate_limited() {
    counter!("breach_lookup_rate_limited_total").increment(1);
    record_rejected("rate_limit");
}
