//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the PhimBro server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Search session and catalog snapshot gauges (collected dynamically)
//! - Core search, cache and upstream metrics (registered from `phimbro_core`)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "phimbro_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("phimbro_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "phimbro_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Session Metrics (collected dynamically)
// =============================================================================

/// Search sessions currently retained.
pub static SEARCH_SESSIONS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "phimbro_search_sessions",
        "Number of search sessions currently retained",
    )
    .unwrap()
});

// =============================================================================
// Catalog Snapshot Metrics (collected dynamically)
// =============================================================================

/// Movies in the cached catalog snapshot.
pub static CATALOG_SNAPSHOT_MOVIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "phimbro_catalog_snapshot_movies",
        "Number of movies in the cached catalog snapshot",
    )
    .unwrap()
});

/// Age of the cached catalog snapshot in seconds (-1 when empty).
pub static CATALOG_SNAPSHOT_AGE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "phimbro_catalog_snapshot_age_seconds",
        "Age of the cached catalog snapshot in seconds",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Sessions
    registry.register(Box::new(SEARCH_SESSIONS.clone())).unwrap();

    // Catalog snapshot
    registry
        .register(Box::new(CATALOG_SNAPSHOT_MOVIES.clone()))
        .unwrap();
    registry
        .register(Box::new(CATALOG_SNAPSHOT_AGE.clone()))
        .unwrap();

    // Core metrics (search phases, cache, upstream)
    for metric in phimbro_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with the current
/// session count and catalog snapshot.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    SEARCH_SESSIONS.set(state.sessions().len().await as i64);

    let stats = state.service().cache_stats().await;
    CATALOG_SNAPSHOT_MOVIES.set(stats.movies as i64);
    CATALOG_SNAPSHOT_AGE.set(stats.age_secs.unwrap_or(-1));
}
