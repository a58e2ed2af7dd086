//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_connections_accepted_total` (counter)
//! - `proxy_accept_errors_total` (counter)
//! - `proxy_active_connections` (gauge)
//! - `proxy_requests_total` (counter, by method)
//! - `proxy_requests_rejected_total` (counter)
//! - `proxy_request_failures_total` (counter, by error kind)
//! - `proxy_relayed_bytes_total` (counter)
//! - `proxy_request_duration_seconds` (histogram, dispatch through relay)
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_connection_accepted() {
    counter!("proxy_connections_accepted_total").increment(1);
}

pub fn record_accept_error() {
    counter!("proxy_accept_errors_total").increment(1);
}

pub fn set_active_connections(count: u64) {
    gauge!("proxy_active_connections").set(count as f64);
}

pub fn record_request(method: &str) {
    counter!("proxy_requests_total", "method" => method.to_string()).increment(1);
}

pub fn record_rejected() {
    counter!("proxy_requests_rejected_total").increment(1);
}

pub fn record_failure(kind: &'static str) {
    counter!("proxy_request_failures_total", "kind" => kind).increment(1);
}

/// Record a completed relay.
pub fn record_relay(bytes: u64, started: Instant) {
    counter!("proxy_relayed_bytes_total").increment(bytes);
    histogram!("proxy_request_duration_seconds").record(started.elapsed().as_secs_f64());
}
