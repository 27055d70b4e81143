//! Two-phase progressive search over the paginated listing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::full_scan::fetch_full_catalog;
use super::types::{
    BackgroundPhase, BackgroundSearch, FullResult, ProgressiveSearch, QuickResult, SearchOptions,
    SortOrder,
};
use crate::cache::CatalogCache;
use crate::config::SearchConfig;
use crate::filter::{MovieFilter, ScanKind};
use crate::metrics::{
    SEARCHES_STARTED, SEARCH_MATCHES, SEARCH_PHASE_DURATION, UPSTREAM_FETCH_DURATION,
    UPSTREAM_PAGE_FETCHES,
};
use crate::upstream::{CatalogPage, CatalogSource, FetchError, MovieSummary};

/// Progressive search engine.
///
/// `search` scans the listing page by page until it has enough matches for a
/// quick answer, then hands the complete answer to a background task that
/// works on the full catalog (cached or freshly fetched in batches).
///
/// Cloning is cheap and clones share the cache and the generation counter.
#[derive(Clone)]
pub struct SearchEngine {
    source: Arc<dyn CatalogSource>,
    cache: Arc<CatalogCache>,
    config: SearchConfig,
    generation: Arc<AtomicU64>,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("source", &self.source.name())
            .field("config", &self.config)
            .field("generation", &self.latest_generation())
            .finish()
    }
}

impl SearchEngine {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        cache: Arc<CatalogCache>,
        config: SearchConfig,
    ) -> Self {
        Self {
            source,
            cache,
            config,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    pub fn source(&self) -> &Arc<dyn CatalogSource> {
        &self.source
    }

    /// Generation of the most recently started search (0 before any).
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Page-scan ceiling of the quick phase for this kind of filter.
    pub fn scan_ceiling(&self, kind: ScanKind) -> u32 {
        match kind {
            ScanKind::Keyword => self.config.keyword_scan_pages,
            ScanKind::Filter => self.config.filter_scan_pages,
        }
    }

    /// Run the quick phase, start the background phase, return both.
    ///
    /// Never fails: upstream errors are logged and treated as pages without
    /// matches.
    pub async fn search(&self, filter: MovieFilter, options: SearchOptions) -> ProgressiveSearch {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let kind = filter.scan_kind();
        SEARCHES_STARTED.with_label_values(&[kind.as_str()]).inc();

        info!(generation, kind = kind.as_str(), filter = ?filter, "Starting search");

        let quick = self.quick_phase(&filter).await;

        let (tx, rx) = watch::channel(BackgroundPhase::NotStarted);
        let page_size = options
            .limit
            .unwrap_or(self.config.default_page_size)
            .max(1);
        let engine = self.clone();
        let delay = self.config.background_delay();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tx.send_replace(BackgroundPhase::Running);

            let full = engine.background_phase(&filter, options.sort, page_size).await;
            debug!(generation, matches = full.total_items, "Background search complete");
            tx.send_replace(BackgroundPhase::Complete(Arc::new(full)));
        });

        ProgressiveSearch {
            quick,
            background: BackgroundSearch::new(generation, Arc::clone(&self.generation), rx),
            options,
        }
    }

    /// Scan pages from 1 until the quick threshold, the ceiling, or the end
    /// of the catalog.
    pub async fn quick_phase(&self, filter: &MovieFilter) -> QuickResult {
        let start = Instant::now();
        let threshold = self.config.quick_threshold;
        let ceiling = self.scan_ceiling(filter.scan_kind());

        let mut matches: Vec<MovieSummary> = Vec::new();
        let mut seen = HashSet::new();
        let mut pages_scanned = 0u32;

        for page in 1..=ceiling {
            pages_scanned = page;
            let catalog_page = match fetch_page(self.source.as_ref(), page, "quick").await {
                Ok(catalog_page) => catalog_page,
                Err(e) => {
                    warn!(page, error = %e, "Skipping failed page in quick phase");
                    continue;
                }
            };

            if catalog_page.raw_len == 0 {
                debug!(page, "Empty page, end of catalog");
                break;
            }
            let is_last = catalog_page.is_last();

            matches.extend(
                catalog_page
                    .items
                    .into_iter()
                    .filter(|m| filter.matches(m))
                    .filter(|m| seen.insert(m.key().to_string())),
            );

            if matches.len() >= threshold || is_last {
                break;
            }
        }

        let total_items = matches.len();
        matches.truncate(threshold);

        SEARCH_PHASE_DURATION
            .with_label_values(&["quick"])
            .observe(start.elapsed().as_secs_f64());
        SEARCH_MATCHES
            .with_label_values(&["quick"])
            .observe(total_items as f64);

        info!(
            matches = total_items,
            pages_scanned,
            ceiling,
            duration_ms = start.elapsed().as_millis() as u64,
            "Quick phase complete"
        );

        QuickResult {
            items: matches,
            total_items,
            is_partial: true,
            pages_scanned,
        }
    }

    /// The full catalog, from the cache when fresh.
    pub async fn full_catalog(&self) -> Arc<Vec<MovieSummary>> {
        let source = self.source.as_ref();
        let batch = self.config.batch_concurrency;
        let max_pages = self.config.full_scan_max_pages;
        self.cache
            .get_or_fetch(|| fetch_full_catalog(source, batch, max_pages))
            .await
    }

    async fn background_phase(
        &self,
        filter: &MovieFilter,
        sort: SortOrder,
        page_size: usize,
    ) -> FullResult {
        let start = Instant::now();
        let catalog = self.full_catalog().await;

        let mut items: Vec<MovieSummary> =
            catalog.iter().filter(|m| filter.matches(m)).cloned().collect();
        sort.apply(&mut items);

        SEARCH_PHASE_DURATION
            .with_label_values(&["full"])
            .observe(start.elapsed().as_secs_f64());
        SEARCH_MATCHES
            .with_label_values(&["full"])
            .observe(items.len() as f64);

        info!(
            matches = items.len(),
            catalog = catalog.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Background phase complete"
        );

        FullResult::new(items, page_size)
    }
}

/// Fetch one listing page, recording timing and outcome under `phase`.
pub(crate) async fn fetch_page(
    source: &dyn CatalogSource,
    page: u32,
    phase: &'static str,
) -> Result<CatalogPage, FetchError> {
    let start = Instant::now();
    let result = source.fetch_page(page).await;

    UPSTREAM_FETCH_DURATION
        .with_label_values(&[phase])
        .observe(start.elapsed().as_secs_f64());
    let outcome = if result.is_ok() { "success" } else { "error" };
    UPSTREAM_PAGE_FETCHES.with_label_values(&[phase, outcome]).inc();

    if let Ok(catalog_page) = &result {
        debug!(
            source = source.name(),
            page,
            phase,
            items = catalog_page.items.len(),
            total_pages = ?catalog_page.total_pages,
            "Fetched page"
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockCatalogSource};
    use std::time::Duration;

    fn engine_with(source: Arc<MockCatalogSource>) -> SearchEngine {
        let config = SearchConfig {
            background_delay_ms: 0,
            ..SearchConfig::default()
        };
        SearchEngine::new(
            source,
            Arc::new(CatalogCache::new(Duration::from_secs(300))),
            config,
        )
    }

    #[tokio::test]
    async fn test_quick_phase_stops_at_threshold() {
        let source = Arc::new(MockCatalogSource::with_catalog(fixtures::catalog(500), 24));
        let engine = engine_with(source.clone());

        let quick = engine.quick_phase(&MovieFilter::new()).await;
        // 64 matches need 3 pages of 24.
        assert_eq!(quick.pages_scanned, 3);
        assert_eq!(quick.items.len(), 64);
        assert_eq!(quick.total_items, 72);
        assert!(quick.is_partial);
        assert_eq!(source.page_fetch_count().await, 3);
    }

    #[tokio::test]
    async fn test_quick_phase_uses_ceiling_per_kind() {
        let source = Arc::new(MockCatalogSource::with_catalog(fixtures::catalog(2400), 24));
        let engine = engine_with(source.clone());

        let by_year = engine
            .quick_phase(&MovieFilter::new().with_year(1999))
            .await;
        assert_eq!(by_year.pages_scanned, 20);
        assert_eq!(by_year.total_items, 0);

        source.clear_recorded().await;
        let by_keyword = engine
            .quick_phase(&MovieFilter::new().with_keyword("no such title"))
            .await;
        assert_eq!(by_keyword.pages_scanned, 50);
        assert_eq!(source.page_fetch_count().await, 50);
    }

    #[tokio::test]
    async fn test_quick_phase_survives_first_page_failure() {
        let source = Arc::new(MockCatalogSource::with_catalog(fixtures::catalog(30), 10));
        source.fail_page(1, FetchError::Http { status: 500 }).await;
        let engine = engine_with(source.clone());

        let quick = engine.quick_phase(&MovieFilter::new()).await;
        assert_eq!(quick.total_items, 20);
        assert_eq!(quick.items[0].slug, "movie-11");
    }

    #[tokio::test]
    async fn test_quick_phase_continues_past_page_of_unusable_records() {
        let source = Arc::new(MockCatalogSource::new());
        let mut untitled = fixtures::catalog(3);
        for movie in &mut untitled {
            movie.title.clear();
        }
        let valid = vec![fixtures::movie("Movie A", "movie-a")];
        source
            .set_listing_bodies(vec![
                fixtures::listing_body(&untitled, 2),
                fixtures::listing_body(&valid, 2),
            ])
            .await;
        let engine = engine_with(source.clone());

        let quick = engine.quick_phase(&MovieFilter::new()).await;
        assert_eq!(quick.pages_scanned, 2);
        assert_eq!(quick.total_items, 1);
        assert_eq!(quick.items[0].slug, "movie-a");
    }

    #[tokio::test]
    async fn test_quick_phase_all_pages_fail() {
        let source = Arc::new(MockCatalogSource::with_catalog(fixtures::catalog(30), 10));
        let engine = engine_with(source.clone());
        for page in 1..=engine.config().filter_scan_pages {
            source.fail_page(page, FetchError::Network("down".to_string())).await;
        }

        let quick = engine.quick_phase(&MovieFilter::new().with_year(2020)).await;
        assert!(quick.items.is_empty());
        assert_eq!(quick.total_items, 0);
        assert_eq!(quick.pages_scanned, 20);
    }

    #[tokio::test]
    async fn test_search_delivers_background_result() {
        let source = Arc::new(MockCatalogSource::with_catalog(fixtures::catalog(100), 24));
        let engine = engine_with(source);

        let search = engine
            .search(
                MovieFilter::new().with_keyword("movie 1"),
                SearchOptions::default().with_limit(5),
            )
            .await;
        // "Movie 1", "Movie 10".."Movie 19", "Movie 100"
        let full = search.background.clone().wait().await.unwrap();
        assert_eq!(full.total_items, 12);
        assert_eq!(full.total_pages, 3);
        assert_eq!(search.quick.items[..], full.items[..]);
    }

    #[tokio::test]
    async fn test_full_result_is_sorted_by_option() {
        let movies = vec![
            fixtures::movie_with("Old", "old", Some(1999), &[], &[]),
            fixtures::movie_with("New", "new", Some(2024), &[], &[]),
            fixtures::movie_with("Mid", "mid", Some(2010), &[], &[]),
        ];
        let source = Arc::new(MockCatalogSource::with_catalog(movies, 24));
        let engine = engine_with(source);

        let search = engine
            .search(
                MovieFilter::new(),
                SearchOptions::default().with_sort(SortOrder::YearDesc),
            )
            .await;
        let quick_slugs: Vec<_> = search.quick.items.iter().map(|m| m.slug.as_str()).collect();
        assert_eq!(quick_slugs, vec!["old", "new", "mid"]);

        let full = search.background.wait().await.unwrap();
        let full_slugs: Vec<_> = full.items.iter().map(|m| m.slug.as_str()).collect();
        assert_eq!(full_slugs, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_generations_increase_and_supersede() {
        let source = Arc::new(MockCatalogSource::with_catalog(fixtures::catalog(10), 24));
        let engine = engine_with(source);

        let first = engine.search(MovieFilter::new(), SearchOptions::default()).await;
        assert_eq!(first.generation(), 1);
        assert!(!first.background.is_superseded());

        let second = engine
            .clone()
            .search(MovieFilter::new(), SearchOptions::default())
            .await;
        assert_eq!(second.generation(), 2);
        assert!(first.background.is_superseded());
        assert!(!second.background.is_superseded());
        assert_eq!(engine.latest_generation(), 2);

        // A superseded search still completes.
        assert_eq!(first.background.wait().await.unwrap().total_items, 10);
    }
}
