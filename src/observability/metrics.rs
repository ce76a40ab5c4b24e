//! Metrics collection and exposition.
//!
//! # Metrics
//! - `decision_runs_total` (counter): completed runs by final status
//! - `decision_halts_total` (counter): runs ended by a handler halt, by status
//! - `decision_run_errors_total` (counter): runs aborted by configuration errors
//! - `decision_run_duration_seconds` (histogram): time from entry step to final status

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_run(status: u16, start: Instant) {
    counter!("decision_runs_total", "status" => status.to_string()).increment(1);
    histogram!("decision_run_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_halt(status: u16) {
    counter!("decision_halts_total", "status" => status.to_string()).increment(1);
}

pub fn record_run_error() {
    counter!("decision_run_errors_total").increment(1);
}
