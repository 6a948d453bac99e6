//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tasks_requests_total` (counter): requests by method, status, route
//! - `tasks_request_duration_seconds` (histogram): latency distribution
//! - `tasks_store_records` (gauge): records per collection
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   exporter every call is a no-op
//! - Prometheus exporter is opt-in via config
//! - `route` is the registered pattern, never the raw path, so label
//!   cardinality stays bounded by the route table

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Label used for requests that matched no route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Record one handled request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!(
        "tasks_requests_total",
        "method" => method.to_string(),
        "status" => status.clone(),
        "route" => route.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "tasks_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status,
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the current size of a collection.
pub fn record_store_size(collection: &str, records: usize) {
    metrics::gauge!("tasks_store_records", "collection" => collection.to_string())
        .set(records as f64);
}
