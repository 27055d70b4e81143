//! Batched fetch of the whole catalog.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::engine::fetch_page;
use crate::upstream::{CatalogPage, CatalogSource, FetchError, MovieSummary};

/// Fetch every page of the catalog, `batch_size` pages at a time.
///
/// Batches run one after the other; the pages inside a batch are fetched
/// concurrently and merged by page number. The scan ends at the first empty
/// page, at the last page according to the total-pages hint (or, without a
/// hint, at the first page shorter than a full one), at `max_pages`, or after
/// a batch in which every page failed. Page lengths count the records the
/// upstream sent, not the ones that survived normalization. Failed pages are skipped. A movie that shows up on two pages (the
/// listing shifts while it is being read) is kept at its first position.
pub async fn fetch_full_catalog(
    source: &dyn CatalogSource,
    batch_size: usize,
    max_pages: u32,
) -> Vec<MovieSummary> {
    let start = Instant::now();
    let batch_size = batch_size.max(1) as u32;

    let mut movies = Vec::new();
    let mut seen = HashSet::new();
    let mut full_page_len = 0usize;
    let mut pages_ok = 0u32;
    let mut pages_failed = 0u32;
    let mut next_page = 1u32;

    'batches: while next_page <= max_pages {
        let last_in_batch = next_page.saturating_add(batch_size - 1).min(max_pages);

        let fetches: Vec<_> = (next_page..=last_in_batch)
            .map(|page| async move { (page, fetch_page(source, page, "full").await) })
            .collect();
        let mut results: Vec<(u32, Result<CatalogPage, FetchError>)> =
            futures::future::join_all(fetches).await;
        // Merge by page number, never by completion order.
        results.sort_by_key(|(page, _)| *page);

        debug!(from = next_page, to = last_in_batch, "Fetched catalog batch");

        if results.iter().all(|(_, result)| result.is_err()) {
            pages_failed += results.len() as u32;
            warn!(
                from = next_page,
                to = last_in_batch,
                "Every page in batch failed, ending full scan"
            );
            break;
        }

        for (page, result) in results {
            let catalog_page = match result {
                Ok(catalog_page) => catalog_page,
                Err(e) => {
                    pages_failed += 1;
                    warn!(page, error = %e, "Skipping failed catalog page");
                    continue;
                }
            };
            pages_ok += 1;

            // Dropped records must not make a full page look short.
            let len = catalog_page.raw_len;
            if len == 0 {
                break 'batches;
            }
            full_page_len = full_page_len.max(len);
            let is_end = match catalog_page.total_pages {
                Some(_) => catalog_page.is_last(),
                None => len < full_page_len,
            };

            for movie in catalog_page.items {
                if seen.insert(movie.key().to_string()) {
                    movies.push(movie);
                }
            }

            if is_end {
                break 'batches;
            }
        }

        next_page = last_in_batch + 1;
    }

    info!(
        movies = movies.len(),
        pages_ok,
        pages_failed,
        duration_ms = start.elapsed().as_millis() as u64,
        "Full catalog fetch complete"
    );

    movies
}
