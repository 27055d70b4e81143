//! HTTP client for the PhimAPI-compatible listing service.
//!
//! No authentication is required. The service has no documented rate limit,
//! but callers are expected to bound their fan-out (the search engine fetches
//! at most `batch_concurrency` pages at once).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::UpstreamConfig;

use super::response::{parse_detail, parse_listing};
use super::types::{CatalogPage, MovieDetail};
use super::{CatalogSource, FetchError};

/// Upstream listing API client.
#[derive(Debug, Clone)]
pub struct PhimApiClient {
    client: Client,
    base_url: String,
    listing_path: String,
    detail_path: String,
    image_base_url: Option<String>,
}

impl PhimApiClient {
    /// Create a new client from the upstream configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            listing_path: normalize_path(&config.listing_path),
            detail_path: normalize_path(&config.detail_path),
            image_base_url: config.image_base_url.clone(),
        })
    }

    fn listing_url(&self) -> String {
        format!("{}{}", self.base_url, self.listing_path)
    }

    fn detail_url(&self, slug: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            self.detail_path,
            urlencoding::encode(slug)
        )
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Parse(format!("Invalid JSON from {}: {}", url, e)))
    }
}

#[async_trait]
impl CatalogSource for PhimApiClient {
    fn name(&self) -> &str {
        "phimapi"
    }

    async fn fetch_page(&self, page: u32) -> Result<CatalogPage, FetchError> {
        let url = self.listing_url();
        debug!(page, url = %url, "Fetching catalog page");

        let body = match self.get_json(&url, &[("page", page.to_string())]).await {
            // A missing listing page is an upstream fault, not a missing movie
            Err(FetchError::NotFound(_)) => return Err(FetchError::Http { status: 404 }),
            other => other?,
        };

        parse_listing(page, &body, self.image_base_url.as_deref())
    }

    async fn fetch_detail(&self, slug: &str) -> Result<MovieDetail, FetchError> {
        let url = self.detail_url(slug);
        debug!(slug, "Fetching movie detail");

        let body = match self.get_json(&url, &[]).await {
            Err(FetchError::NotFound(_)) => {
                return Err(FetchError::NotFound(format!("Movie {}", slug)))
            }
            other => other?,
        };

        parse_detail(slug, &body)
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base_url: &str) -> PhimApiClient {
        let config = UpstreamConfig {
            base_url: base_url.to_string(),
            ..UpstreamConfig::default()
        };
        PhimApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_listing_url() {
        let client = client_for("https://phimapi.com/");
        assert_eq!(
            client.listing_url(),
            "https://phimapi.com/danh-sach/phim-moi-cap-nhat-v3"
        );
    }

    #[test]
    fn test_detail_url_encodes_slug() {
        let client = client_for("https://phimapi.com");
        assert_eq!(
            client.detail_url("nguoi nhen"),
            "https://phimapi.com/phim/nguoi%20nhen"
        );
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("danh-sach/x/"), "/danh-sach/x");
        assert_eq!(normalize_path("/phim"), "/phim");
        assert_eq!(normalize_path(""), "");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let client = client_for("http://127.0.0.1:9");
        let result = client.fetch_page(1).await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
