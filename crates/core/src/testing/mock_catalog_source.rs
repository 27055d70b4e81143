//! Mock catalog source for testing.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::upstream::{
    parse_listing, CatalogPage, CatalogSource, FetchError, MovieDetail, MovieSummary,
};

/// A recorded page fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    /// The requested page.
    pub page: u32,
    /// When the fetch was made.
    pub timestamp: Instant,
}

/// Mock implementation of the [`CatalogSource`] trait.
///
/// Serves a scripted catalog page by page and provides controllable behavior:
/// - Per-page failures and one-shot errors
/// - Per-page latency (to reorder completion inside a batch)
/// - Optional total-pages hint
/// - Raw upstream JSON bodies, normalized the way the real client does
/// - Recorded fetches for call-count assertions
///
/// Pages past the end of the scripted catalog come back empty.
///
/// # Example
///
/// ```rust,ignore
/// use phimbro_core::testing::{MockCatalogSource, fixtures};
///
/// let source = MockCatalogSource::with_catalog(fixtures::catalog(60), 20);
/// source.fail_page(2, FetchError::Http { status: 500 }).await;
///
/// let page = source.fetch_page(1).await?;
/// assert_eq!(page.items.len(), 20);
/// assert_eq!(source.page_fetch_count().await, 1);
/// ```
pub struct MockCatalogSource {
    /// Scripted pages; index 0 is page 1.
    pages: Arc<RwLock<Vec<Vec<MovieSummary>>>>,
    /// Raw listing bodies; when set they replace `pages` and go through
    /// `parse_listing`.
    listing_bodies: Arc<RwLock<Option<Vec<Value>>>>,
    /// Whether pages carry a total-pages hint.
    report_total_pages: Arc<RwLock<bool>>,
    /// Pages that always fail.
    page_errors: Arc<RwLock<HashMap<u32, FetchError>>>,
    /// If set, the next fetch (page or detail) fails with this error.
    next_error: Arc<RwLock<Option<FetchError>>>,
    /// Simulated per-page latency.
    latency: Arc<RwLock<HashMap<u32, Duration>>>,
    /// Detail records by slug.
    details: Arc<RwLock<HashMap<String, MovieDetail>>>,
    /// Recorded page fetches.
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    /// Recorded detail lookups.
    detail_lookups: Arc<RwLock<Vec<String>>>,
}

impl std::fmt::Debug for MockCatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCatalogSource")
            .field("pages", &"<pages>")
            .field("fetches", &"<fetches>")
            .finish()
    }
}

impl Default for MockCatalogSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalogSource {
    /// Create a mock source with an empty catalog.
    pub fn new() -> Self {
        Self::from_pages(Vec::new())
    }

    /// Create a mock source serving `movies` split into pages of `page_size`.
    pub fn with_catalog(movies: Vec<MovieSummary>, page_size: usize) -> Self {
        Self::from_pages(paginate(movies, page_size))
    }

    fn from_pages(pages: Vec<Vec<MovieSummary>>) -> Self {
        Self {
            pages: Arc::new(RwLock::new(pages)),
            listing_bodies: Arc::new(RwLock::new(None)),
            report_total_pages: Arc::new(RwLock::new(true)),
            page_errors: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            latency: Arc::new(RwLock::new(HashMap::new())),
            details: Arc::new(RwLock::new(HashMap::new())),
            fetches: Arc::new(RwLock::new(Vec::new())),
            detail_lookups: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Replace the catalog, split into pages of `page_size`.
    pub async fn set_catalog(&self, movies: Vec<MovieSummary>, page_size: usize) {
        *self.pages.write().await = paginate(movies, page_size);
    }

    /// Replace the catalog with explicit pages (index 0 is page 1).
    pub async fn set_pages(&self, pages: Vec<Vec<MovieSummary>>) {
        *self.pages.write().await = pages;
    }

    /// Serve raw listing bodies (index 0 is page 1) instead of scripted
    /// pages. Each body is normalized with `parse_listing`, so malformed or
    /// untitled records are dropped exactly as with the real upstream.
    pub async fn set_listing_bodies(&self, bodies: Vec<Value>) {
        *self.listing_bodies.write().await = Some(bodies);
    }

    /// Number of scripted pages.
    pub async fn page_count(&self) -> usize {
        self.pages.read().await.len()
    }

    /// Stop reporting a total-pages hint, so callers must detect the end
    /// of the catalog from short or empty pages.
    pub async fn without_total_pages_hint(&self) {
        *self.report_total_pages.write().await = false;
    }

    /// Make every fetch of `page` fail with `error`.
    pub async fn fail_page(&self, page: u32, error: FetchError) {
        self.page_errors.write().await.insert(page, error);
    }

    /// Clear all per-page failures.
    pub async fn clear_page_failures(&self) {
        self.page_errors.write().await.clear();
    }

    /// Configure the next fetch (page or detail) to fail with the given error.
    pub async fn set_next_error(&self, error: FetchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Delay every fetch of `page` by `delay`.
    pub async fn set_page_latency(&self, page: u32, delay: Duration) {
        self.latency.write().await.insert(page, delay);
    }

    /// Register a detail record under its slug.
    pub async fn add_detail(&self, detail: MovieDetail) {
        let slug = detail.movie.summary.slug.clone();
        self.details.write().await.insert(slug, detail);
    }

    /// Get recorded page fetches, in call order.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    /// Get the requested page numbers, in call order.
    pub async fn fetched_pages(&self) -> Vec<u32> {
        self.fetches.read().await.iter().map(|f| f.page).collect()
    }

    /// Get the number of page fetches performed.
    pub async fn page_fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }

    /// Get the slugs of detail lookups, in call order.
    pub async fn detail_lookups(&self) -> Vec<String> {
        self.detail_lookups.read().await.clone()
    }

    /// Clear recorded fetches and lookups.
    pub async fn clear_recorded(&self) {
        self.fetches.write().await.clear();
        self.detail_lookups.write().await.clear();
    }
}

fn paginate(movies: Vec<MovieSummary>, page_size: usize) -> Vec<Vec<MovieSummary>> {
    movies
        .chunks(page_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

#[async_trait]
impl CatalogSource for MockCatalogSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_page(&self, page: u32) -> Result<CatalogPage, FetchError> {
        self.fetches.write().await.push(RecordedFetch {
            page,
            timestamp: Instant::now(),
        });

        let delay = self.latency.read().await.get(&page).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if let Some(error) = self.page_errors.read().await.get(&page) {
            return Err(error.clone());
        }

        if let Some(bodies) = self.listing_bodies.read().await.as_ref() {
            let body = page
                .checked_sub(1)
                .and_then(|index| bodies.get(index as usize))
                .cloned()
                .unwrap_or_else(|| json!({ "items": [] }));
            return parse_listing(page, &body, None);
        }

        let pages = self.pages.read().await;
        let items = page
            .checked_sub(1)
            .and_then(|index| pages.get(index as usize))
            .cloned()
            .unwrap_or_default();
        let total_pages = if *self.report_total_pages.read().await {
            Some(pages.len() as u32)
        } else {
            None
        };

        Ok(CatalogPage::new(page, items, total_pages))
    }

    async fn fetch_detail(&self, slug: &str) -> Result<MovieDetail, FetchError> {
        self.detail_lookups.write().await.push(slug.to_string());
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        self.details
            .read()
            .await
            .get(slug)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(slug.to_string()))
    }
}
