//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Upstream page fetches (per search phase)
//! - Catalog cache lookups
//! - Progressive search phases (count, duration, matches)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Upstream Metrics
// =============================================================================

/// Upstream page fetches by phase and result.
pub static UPSTREAM_PAGE_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "phimbro_upstream_page_fetches_total",
            "Total upstream listing page fetches",
        ),
        &["phase", "result"], // phase: "quick", "full"; result: "success", "error"
    )
    .unwrap()
});

/// Upstream page fetch duration in seconds.
pub static UPSTREAM_FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "phimbro_upstream_fetch_duration_seconds",
            "Duration of upstream listing page fetches",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["phase"],
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics
// =============================================================================

/// Catalog cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "phimbro_catalog_cache_lookups_total",
            "Total full-catalog cache lookups",
        ),
        &["result"], // "hit", "miss"
    )
    .unwrap()
});

// =============================================================================
// Search Metrics
// =============================================================================

/// Searches started by scan kind.
pub static SEARCHES_STARTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("phimbro_searches_started_total", "Total searches started"),
        &["kind"], // "keyword", "filter"
    )
    .unwrap()
});

/// Search phase duration in seconds.
pub static SEARCH_PHASE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "phimbro_search_phase_duration_seconds",
            "Duration of each progressive search phase",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["phase"], // "quick", "full"
    )
    .unwrap()
});

/// Matches found per search phase.
pub static SEARCH_MATCHES: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "phimbro_search_matches",
            "Number of matching movies per search phase",
        )
        .buckets(vec![0.0, 1.0, 8.0, 24.0, 64.0, 250.0, 1000.0, 5000.0]),
        &["phase"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Upstream
        Box::new(UPSTREAM_PAGE_FETCHES.clone()),
        Box::new(UPSTREAM_FETCH_DURATION.clone()),
        // Cache
        Box::new(CACHE_LOOKUPS.clone()),
        // Search
        Box::new(SEARCHES_STARTED.clone()),
        Box::new(SEARCH_PHASE_DURATION.clone()),
        Box::new(SEARCH_MATCHES.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register_cleanly() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        UPSTREAM_PAGE_FETCHES
            .with_label_values(&["quick", "success"])
            .inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "phimbro_upstream_page_fetches_total"));
    }
}
