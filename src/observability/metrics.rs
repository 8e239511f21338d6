//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, route
//! - `proxy_request_duration_seconds` (histogram): latency by route
//! - `proxy_purge_total` (counter): purge requests by outcome
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .add_global_label("service", "edge_proxy")
        .install()?;

    describe_counter!("proxy_requests_total", "Requests handled, by method, status and route");
    describe_histogram!(
        "proxy_request_duration_seconds",
        "Time from request receipt to response headers, by route"
    );
    describe_counter!("proxy_purge_total", "Purge requests, by outcome");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one handled request.
pub fn record_request(method: &str, status: u16, route: &'static str, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record a purge outcome: `purged`, `rejected` or `failed`.
pub fn record_purge(outcome: &'static str) {
    counter!("proxy_purge_total", "outcome" => outcome).increment(1);
}
