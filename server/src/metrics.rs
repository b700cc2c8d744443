//! Prometheus metrics for the Fest server.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `fest_bookings_total{outcome}` - Booking attempts by terminal state
//! - `fest_events_created_total` - Events created
//! - `fest_registrations_total` - Organizations registered
//! - `fest_store_lock_timeouts_total` - Row lock waits that hit the bound
//!
//! ## Histograms
//! - `fest_booking_duration_seconds` - Wall time of one booking attempt

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use std::net::SocketAddr;

/// Register all metric descriptions.
///
/// Call once at startup, before any metrics are recorded.
pub fn register_metrics() {
    describe_counter!(
        "fest_bookings_total",
        "Booking attempts by outcome (booked, rejected_sold_out, rejected_duplicate, rejected_not_found, rejected_transient, failed)"
    );
    describe_histogram!(
        "fest_booking_duration_seconds",
        "Time taken by one booking attempt, including lock waits"
    );
    describe_counter!("fest_events_created_total", "Total number of events created");
    describe_counter!(
        "fest_registrations_total",
        "Total number of organizations registered"
    );
    describe_counter!(
        "fest_store_lock_timeouts_total",
        "Per-event row lock waits that exceeded the lock timeout"
    );

    tracing::info!("Metrics registered");
}

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must run inside a Tokio runtime.
///
/// # Errors
///
/// Returns error if the recorder cannot be built or installed.
pub fn install(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        )?
        .install()?;

    register_metrics();
    tracing::info!(%addr, "Metrics server started - available at http://{addr}/metrics");
    Ok(())
}
