//! Consumer-facing movie service.

use std::sync::Arc;

use tracing::debug;

use super::engine::SearchEngine;
use super::types::{ProgressiveSearch, SearchOptions};
use crate::cache::{CacheStats, CatalogCache};
use crate::config::SearchConfig;
use crate::filter::{MovieFilter, MovieType};
use crate::upstream::{CatalogSource, FetchError, MovieDetail};

/// Entry point for UI-facing queries.
///
/// Every listing query (keyword, category, country, year, type) is a
/// progressive search over the same upstream listing. The service owns the
/// engine and, through it, the catalog cache.
#[derive(Debug, Clone)]
pub struct MovieService {
    engine: SearchEngine,
}

impl MovieService {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        cache: Arc<CatalogCache>,
        config: SearchConfig,
    ) -> Self {
        Self {
            engine: SearchEngine::new(source, cache, config),
        }
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    /// Search with an arbitrary combination of filters.
    pub async fn search(&self, filter: MovieFilter, options: SearchOptions) -> ProgressiveSearch {
        self.engine.search(filter, options).await
    }

    /// Keyword search, optionally narrowed by the other dimensions of
    /// `refine` (its own keyword is replaced).
    pub async fn search_movies(
        &self,
        keyword: &str,
        refine: MovieFilter,
        options: SearchOptions,
    ) -> ProgressiveSearch {
        let filter = refine.with_keyword(keyword);
        self.engine.search(filter, options).await
    }

    pub async fn movies_by_category(
        &self,
        category: &str,
        options: SearchOptions,
    ) -> ProgressiveSearch {
        let filter = MovieFilter::new().with_category(category);
        self.engine.search(filter, options).await
    }

    pub async fn movies_by_country(
        &self,
        country: &str,
        options: SearchOptions,
    ) -> ProgressiveSearch {
        let filter = MovieFilter::new().with_country(country);
        self.engine.search(filter, options).await
    }

    pub async fn movies_by_year(&self, year: u32, options: SearchOptions) -> ProgressiveSearch {
        let filter = MovieFilter::new().with_year(year);
        self.engine.search(filter, options).await
    }

    pub async fn movies_by_type(
        &self,
        movie_type: MovieType,
        options: SearchOptions,
    ) -> ProgressiveSearch {
        let filter = MovieFilter::new().with_type(movie_type);
        self.engine.search(filter, options).await
    }

    /// Fetch the detail record of one movie straight from the upstream.
    pub async fn movie_detail(&self, slug: &str) -> Result<MovieDetail, FetchError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(FetchError::NotFound(String::new()));
        }
        debug!(slug, "Fetching movie detail");
        self.engine.source().fetch_detail(slug).await
    }

    /// Drop the cached catalog snapshot.
    pub async fn invalidate_cache(&self) {
        self.engine.cache().invalidate().await;
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.engine.cache().stats().await
    }
}
