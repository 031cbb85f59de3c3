//! Metrics collection and exposition.
//!
//! # Metrics
//! - `heicker_conversions_total` (counter): conversions by outcome
//! - `heicker_conversion_duration_seconds` (histogram): decode + encode time
//! - `heicker_admission_rejections_total` (counter): rejected by reason
//! - `heicker_upload_bytes` (histogram): accepted upload sizes
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_conversion(outcome: &'static str, started: Instant) {
    metrics::counter!("heicker_conversions_total", "outcome" => outcome).increment(1);
    metrics::histogram!("heicker_conversion_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: &'static str) {
    metrics::counter!("heicker_admission_rejections_total", "reason" => reason).increment(1);
}

pub fn record_upload(bytes: usize) {
    metrics::histogram!("heicker_upload_bytes").record(bytes as f64);
}
