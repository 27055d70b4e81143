//! Types for progressive search.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

use crate::upstream::MovieSummary;

/// Errors surfaced by a progressive search.
///
/// Upstream failures never show up here: they are logged and count as pages
/// without matches.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The background task ended without producing a result (panic or
    /// runtime shutdown).
    #[error("Background search aborted before completing")]
    BackgroundAborted,
}

/// Ordering applied to the full result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Upstream order (most recently updated first).
    #[default]
    Catalog,
    YearDesc,
    YearAsc,
    TitleAsc,
    RatingDesc,
}

impl SortOrder {
    /// Sort `movies` in place. Stable, so equal keys keep catalog order.
    /// Movies missing the sort key go last.
    pub fn apply(&self, movies: &mut [MovieSummary]) {
        match self {
            SortOrder::Catalog => {}
            SortOrder::YearDesc => {
                movies.sort_by(|a, b| missing_last(a.year, b.year, |x, y| y.cmp(&x)))
            }
            SortOrder::YearAsc => {
                movies.sort_by(|a, b| missing_last(a.year, b.year, |x, y| x.cmp(&y)))
            }
            SortOrder::TitleAsc => {
                movies.sort_by_cached_key(|m| m.title.to_lowercase());
            }
            SortOrder::RatingDesc => movies.sort_by(|a, b| {
                missing_last(a.vote_average(), b.vote_average(), |x, y| {
                    y.partial_cmp(&x).unwrap_or(Ordering::Equal)
                })
            }),
        }
    }
}

fn missing_last<T>(a: Option<T>, b: Option<T>, cmp: impl FnOnce(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Caller options for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// 1-based page of the full result the caller wants first.
    #[serde(default = "default_page")]
    pub page: usize,
    /// Page size; the configured default when unset.
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub sort: SortOrder,
}

fn default_page() -> usize {
    1
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: None,
            sort: SortOrder::default(),
        }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }
}

/// The answer of the quick phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickResult {
    /// The first matches in catalog order, capped at the quick threshold.
    pub items: Vec<MovieSummary>,
    /// Matches found so far (may exceed `items.len()`).
    pub total_items: usize,
    /// Always true: the full answer comes from the background phase.
    pub is_partial: bool,
    /// Pages requested before the quick phase stopped, failures included.
    pub pages_scanned: u32,
}

/// The answer of the background phase: every match in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullResult {
    pub items: Vec<MovieSummary>,
    pub total_items: usize,
    /// `ceil(total_items / page_size)`; 0 when nothing matched.
    pub total_pages: usize,
    pub page_size: usize,
}

impl FullResult {
    pub fn new(items: Vec<MovieSummary>, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            total_items: items.len(),
            total_pages: items.len().div_ceil(page_size),
            items,
            page_size,
        }
    }

    /// Slice one 1-based page of `limit` items (page 0 is treated as 1).
    pub fn page(&self, page: usize, limit: usize) -> ResultPage {
        let limit = limit.max(1);
        let page = page.max(1);
        let start = (page - 1).saturating_mul(limit).min(self.items.len());
        let end = start.saturating_add(limit).min(self.items.len());

        ResultPage {
            items: self.items[start..end].to_vec(),
            page,
            limit,
            total_items: self.total_items,
            total_pages: self.total_items.div_ceil(limit),
        }
    }
}

/// One page of a full result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPage {
    pub items: Vec<MovieSummary>,
    pub page: usize,
    pub limit: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Progress of a background phase, as published on its watch channel.
#[derive(Debug, Clone)]
pub enum BackgroundPhase {
    NotStarted,
    Running,
    Complete(Arc<FullResult>),
}

/// Serializable view of [`BackgroundPhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundState {
    NotStarted,
    Running,
    Complete,
}

impl BackgroundState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackgroundState::NotStarted => "not_started",
            BackgroundState::Running => "running",
            BackgroundState::Complete => "complete",
        }
    }
}

/// Handle on a background phase.
///
/// Cloning is cheap; every clone observes the same phase.
#[derive(Debug, Clone)]
pub struct BackgroundSearch {
    generation: u64,
    latest_generation: Arc<AtomicU64>,
    phase: watch::Receiver<BackgroundPhase>,
}

impl BackgroundSearch {
    pub(crate) fn new(
        generation: u64,
        latest_generation: Arc<AtomicU64>,
        phase: watch::Receiver<BackgroundPhase>,
    ) -> Self {
        Self {
            generation,
            latest_generation,
            phase,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a newer search has been started on the same engine since
    /// this one. A superseded search still runs to completion.
    pub fn is_superseded(&self) -> bool {
        self.latest_generation.load(AtomicOrdering::SeqCst) > self.generation
    }

    pub fn state(&self) -> BackgroundState {
        match &*self.phase.borrow() {
            BackgroundPhase::NotStarted => BackgroundState::NotStarted,
            BackgroundPhase::Running => BackgroundState::Running,
            BackgroundPhase::Complete(_) => BackgroundState::Complete,
        }
    }

    /// The full result, if the background phase has completed.
    pub fn result(&self) -> Option<Arc<FullResult>> {
        match &*self.phase.borrow() {
            BackgroundPhase::Complete(full) => Some(Arc::clone(full)),
            _ => None,
        }
    }

    /// Wait for the background phase to complete.
    pub async fn wait(mut self) -> Result<Arc<FullResult>, SearchError> {
        let phase = self
            .phase
            .wait_for(|phase| matches!(phase, BackgroundPhase::Complete(_)))
            .await
            .map_err(|_| SearchError::BackgroundAborted)?;

        match &*phase {
            BackgroundPhase::Complete(full) => Ok(Arc::clone(full)),
            _ => Err(SearchError::BackgroundAborted),
        }
    }
}

/// The two-step answer of a search: the quick result now, the full result
/// later through [`BackgroundSearch::wait`].
#[derive(Debug, Clone)]
pub struct ProgressiveSearch {
    pub quick: QuickResult,
    pub background: BackgroundSearch,
    pub options: SearchOptions,
}

impl ProgressiveSearch {
    pub fn generation(&self) -> u64 {
        self.background.generation()
    }

    /// Wait for the full result and slice the page requested in the options.
    pub async fn wait_page(self, default_limit: usize) -> Result<ResultPage, SearchError> {
        let limit = self.options.limit.unwrap_or(default_limit);
        let page = self.options.page;
        let full = self.background.wait().await?;
        Ok(full.page(page, limit))
    }
}
