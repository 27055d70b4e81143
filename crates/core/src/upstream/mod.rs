//! Upstream movie listing API integration.
//!
//! The upstream exposes a single paginated listing of recently updated
//! movies plus a per-movie detail endpoint. Everything else (keyword,
//! category, country, year search) is built on top of the listing by the
//! search engine.

mod phimapi;
mod response;
mod types;

pub use phimapi::PhimApiClient;
pub use response::{parse_detail, parse_listing};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the upstream API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, timeout, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// The upstream answered with a non-success status.
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// The requested movie does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The body was JSON but contained no list of movies.
    #[error("Unrecognized response shape: {0}")]
    UnrecognizedResponseShape(String),

    /// The body could not be decoded.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => FetchError::Http {
                status: status.as_u16(),
            },
            None if e.is_decode() => FetchError::Parse(e.to_string()),
            None => FetchError::Network(e.to_string()),
        }
    }
}

/// A paginated source of catalog pages.
///
/// Implemented by [`PhimApiClient`] against the real upstream, and by
/// `testing::MockCatalogSource` for tests. Implementations must not retry or
/// cache; callers own both policies.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Fetch one page of the listing (1-based).
    async fn fetch_page(&self, page: u32) -> Result<CatalogPage, FetchError>;

    /// Fetch the detail record of a single movie.
    async fn fetch_detail(&self, slug: &str) -> Result<MovieDetail, FetchError>;
}
