//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by method, route, status
//! - `edge_request_duration_seconds` (histogram): latency by route
//! - `edge_upstream_errors_total` (counter): transport failures by route
//! - `edge_analytics_events_total` (counter): events by outcome
//!   (queued, dropped, written, failed)
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed inbound request.
pub fn record_request(method: &str, route: &'static str, status: u16, start: Instant) {
    counter!(
        "edge_requests_total",
        "method" => method.to_string(),
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("edge_request_duration_seconds", "route" => route).record(start.elapsed().as_secs_f64());
}

/// Record a transport failure reaching an upstream.
pub fn record_upstream_error(route: &'static str) {
    counter!("edge_upstream_errors_total", "route" => route).increment(1);
}

/// Record an analytics pipeline outcome.
pub fn record_analytics(outcome: &'static str) {
    counter!("edge_analytics_events_total", "outcome" => outcome).increment(1);
}
