//! Metrics collection and exposition.
//!
//! # Metrics
//! - `issue_tracker_requests_total` (counter): requests by method, route, status
//! - `issue_tracker_request_duration_seconds` (histogram): latency by method, route
//! - `issue_tracker_store_errors_total` (counter): store failures by operation
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Middleware recording one counter and one latency sample per request.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(method, route, response.status().as_u16(), start);
    response
}

pub fn record_request(method: String, route: String, status: u16, start: Instant) {
    metrics::counter!(
        "issue_tracker_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "issue_tracker_request_duration_seconds",
        "method" => method,
        "route" => route
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_store_error(operation: &'static str) {
    metrics::counter!("issue_tracker_store_errors_total", "operation" => operation).increment(1);
}
