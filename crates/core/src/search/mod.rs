//! Progressive movie search.
//!
//! A search runs in two phases:
//! - **Quick phase**: listing pages are fetched one at a time and filtered
//!   until enough matches are found, a page-scan ceiling is hit, or the
//!   catalog ends. The result is returned to the caller right away.
//! - **Background phase**: a spawned task obtains the full catalog (from the
//!   [`CatalogCache`](crate::cache::CatalogCache) or a batched fetch),
//!   filters and sorts it, and publishes the complete result on the
//!   [`BackgroundSearch`] handle.

mod engine;
mod full_scan;
mod service;
mod types;

pub use engine::SearchEngine;
pub use full_scan::fetch_full_catalog;
pub use service::MovieService;
pub use types::*;
