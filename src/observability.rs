use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: reservations created.
pub const RESERVATIONS_CREATED_TOTAL: &str = "spindry_reservations_created_total";

/// Counter: reservations cancelled.
pub const RESERVATIONS_CANCELLED_TOTAL: &str = "spindry_reservations_cancelled_total";

/// Counter: reservations rescheduled.
pub const RESERVATIONS_RESCHEDULED_TOTAL: &str = "spindry_reservations_rescheduled_total";

/// Counter: rejected booking attempts. Labels: reason (error discriminant).
pub const BOOKINGS_REJECTED_TOTAL: &str = "spindry_bookings_rejected_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: machines currently registered.
pub const MACHINES_ACTIVE: &str = "spindry_machines_active";

/// Install the Prometheus metrics exporter on the given port. No-op if port
/// is None. Intended to be called once by the embedding service.
pub fn init_metrics(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Install the default tracing subscriber (env-filtered fmt output).
/// Intended to be called once by the embedding service.
pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}
