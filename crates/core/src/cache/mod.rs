//! Time-boxed snapshot of the full catalog.
//!
//! The background search phase needs every movie the upstream serves, which
//! costs hundreds of page requests. The snapshot is reused across searches
//! until it expires or is invalidated. There is no single-flight guard: two
//! callers that both miss will both fetch, and the last one to finish wins.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::metrics::CACHE_LOOKUPS;
use crate::upstream::MovieSummary;

/// A full-catalog fetch result and when it was taken.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub movies: Arc<Vec<MovieSummary>>,
    pub fetched_at: DateTime<Utc>,
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Movies in the current snapshot (0 when empty).
    pub movies: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_secs: Option<i64>,
    pub is_fresh: bool,
    pub ttl_secs: i64,
}

/// In-memory full-catalog cache.
#[derive(Debug)]
pub struct CatalogCache {
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    snapshot: RwLock<Option<CatalogSnapshot>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CatalogCache {
    /// Create a cache backed by the wall clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a cache with an explicit clock.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock,
            snapshot: RwLock::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn is_fresh(&self, snapshot: &CatalogSnapshot, now: DateTime<Utc>) -> bool {
        now - snapshot.fetched_at < self.ttl
    }

    /// The cached movies, if a snapshot exists and has not expired.
    pub async fn fresh(&self) -> Option<Arc<Vec<MovieSummary>>> {
        let now = self.clock.now();
        let snapshot = self.snapshot.read().await;
        snapshot
            .as_ref()
            .filter(|s| self.is_fresh(s, now))
            .map(|s| Arc::clone(&s.movies))
    }

    /// Replace the snapshot, stamping it with the current time.
    pub async fn store(&self, movies: Vec<MovieSummary>) -> Arc<Vec<MovieSummary>> {
        let movies = Arc::new(movies);
        let snapshot = CatalogSnapshot {
            movies: Arc::clone(&movies),
            fetched_at: self.clock.now(),
        };
        *self.snapshot.write().await = Some(snapshot);
        movies
    }

    /// Return the fresh snapshot, or run `fetch` and cache what it returns.
    ///
    /// An empty fetch result is returned but not cached, so an upstream outage
    /// does not pin an empty catalog for the whole TTL.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Arc<Vec<MovieSummary>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<MovieSummary>>,
    {
        if let Some(movies) = self.fresh().await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
            debug!(movies = movies.len(), "Catalog cache hit");
            return movies;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
        debug!("Catalog cache miss, fetching full catalog");

        let movies = fetch().await;
        if movies.is_empty() {
            warn!("Full catalog fetch returned no movies, not caching");
            return Arc::new(movies);
        }

        info!(movies = movies.len(), "Catalog snapshot refreshed");
        self.store(movies).await
    }

    /// Drop the snapshot; the next lookup fetches again.
    pub async fn invalidate(&self) {
        if self.snapshot.write().await.take().is_some() {
            info!("Catalog cache invalidated");
        }
    }

    pub async fn snapshot(&self) -> Option<CatalogSnapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let snapshot = self.snapshot.read().await;
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            movies: snapshot.as_ref().map_or(0, |s| s.movies.len()),
            fetched_at: snapshot.as_ref().map(|s| s.fetched_at),
            age_secs: snapshot.as_ref().map(|s| (now - s.fetched_at).num_seconds()),
            is_fresh: snapshot.as_ref().is_some_and(|s| self.is_fresh(s, now)),
            ttl_secs: self.ttl.num_seconds(),
        }
    }
}
