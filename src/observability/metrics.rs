//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relays by outcome and status
//! - `relay_request_duration_seconds` (histogram): end-to-end latency
//! - `relay_upstream_responses_total` (counter): upstream replies by status
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished relay.
pub fn record_relay(outcome: &'static str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!("relay_requests_total", "outcome" => outcome, "status" => status.clone()).increment(1);
    histogram!("relay_request_duration_seconds", "outcome" => outcome, "status" => status)
        .record(start.elapsed().as_secs_f64());
}

/// Record the status an upstream replied with.
pub fn record_upstream_status(status: u16) {
    counter!("relay_upstream_responses_total", "status" => status.to_string()).increment(1);
}
