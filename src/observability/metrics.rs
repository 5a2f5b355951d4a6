//! Metrics collection and exposition.
//!
//! # Metrics
//! - `adapter_routes_registered_total` (counter): registered pipelines by mode
//! - `adapter_dispatch_total` (counter): dispatches by pattern and outcome
//! - `adapter_dispatch_duration_seconds` (histogram): dispatch latency by pattern
//!
//! Outcomes are `error`, `redirect`, `autoreply` and `manual`. Without an
//! installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_registration(mode: &'static str) {
    metrics::counter!("adapter_routes_registered_total", "mode" => mode).increment(1);
}

pub fn record_dispatch(pattern: &str, outcome: &'static str, started: Instant) {
    metrics::counter!(
        "adapter_dispatch_total",
        "pattern" => pattern.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("adapter_dispatch_duration_seconds", "pattern" => pattern.to_string())
        .record(started.elapsed().as_secs_f64());
}
