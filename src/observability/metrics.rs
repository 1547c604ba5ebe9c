//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define edge metrics (requests, latency, SSRF blocks)
//! - Expose a Prometheus-compatible endpoint when enabled
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by method, status, route
//! - `edge_request_duration_seconds` (histogram): latency by route
//! - `edge_proxy_blocked_total` (counter): refused proxy targets by reason
//!
//! # Design Decisions
//! - Recording is a no-op until `init_metrics` installs a recorder
//! - Labels are bounded: method, status code, route kind, block reason

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "edge_requests_total";
pub const REQUEST_DURATION: &str = "edge_request_duration_seconds";
pub const PROXY_BLOCKED_TOTAL: &str = "edge_proxy_blocked_total";

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one handled request.
pub fn record_request(method: &str, status: u16, route: &'static str, start: Instant) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route
    )
    .increment(1);
    metrics::histogram!(REQUEST_DURATION, "route" => route).record(start.elapsed().as_secs_f64());
}

/// Record a proxy target refused by the SSRF policy.
pub fn record_proxy_blocked(reason: &'static str) {
    metrics::counter!(PROXY_BLOCKED_TOTAL, "reason" => reason).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_noop() {
        record_request("GET", 200, "static", Instant::now());
        record_proxy_blocked("blocked_host");
    }
}
