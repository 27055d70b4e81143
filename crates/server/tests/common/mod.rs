//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock catalog source injected, enabling E2E testing of the HTTP
//! surface without the upstream API.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use phimbro_core::{
    testing::MockCatalogSource, CatalogCache, CatalogSource, Config,
    MovieService,
};
use phimbro_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use phimbro_core::testing::fixtures;

/// Test fixture for E2E testing with a mock upstream.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_search() {
///     let fixture = TestFixture::new().await;
///     fixture.source.set_catalog(fixtures::catalog(50), 24).await;
///
///     let response = fixture.get("/api/v1/movies/search?keyword=movie").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock upstream - configure the catalog and failures
    pub source: Arc<MockCatalogSource>,
    /// Shared state, for assertions on sessions and the cache
    pub state: Arc<AppState>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with an empty catalog.
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Create a test fixture serving `catalog` in pages of `page_size`.
    pub async fn with_catalog(catalog: Vec<phimbro_core::MovieSummary>, page_size: usize) -> Self {
        let fixture = Self::new().await;
        fixture.source.set_catalog(catalog, page_size).await;
        fixture
    }

    /// Create a test fixture with custom configuration.
    ///
    /// The background delay is always zeroed so polls complete quickly.
    pub async fn with_config(mut config: Config) -> Self {
        config.search.background_delay_ms = 0;

        let source = Arc::new(MockCatalogSource::new());
        let cache = Arc::new(CatalogCache::new(Duration::from_secs(config.cache.ttl_secs)));
        let service = MovieService::new(
            Arc::clone(&source) as Arc<dyn CatalogSource>,
            cache,
            config.search.clone(),
        );

        let state = Arc::new(AppState::new(config, service));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            source,
            state,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path).await
    }

    /// Start a search and return its id.
    pub async fn start_search(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status, StatusCode::OK, "body: {}", response.text);
        response.body["search_id"]
            .as_str()
            .expect("search_id missing")
            .to_string()
    }

    /// Poll a search, waiting for the background phase to finish.
    pub async fn wait_for_search(&self, search_id: &str, query: &str) -> TestResponse {
        let separator = if query.is_empty() { "" } else { "&" };
        self.get(&format!(
            "/api/v1/searches/{}?wait_ms=5000{}{}",
            search_id, separator, query
        ))
        .await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
