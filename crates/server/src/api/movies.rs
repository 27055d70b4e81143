//! Movie search and detail handlers.
//!
//! Every listing query starts a progressive search: the response carries the
//! quick result and a `search_id` to poll (`GET /api/v1/searches/{id}`) for
//! the full result.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use phimbro_core::{
    FetchError, MovieDetail, MovieFilter, MovieType, ProgressiveSearch, QuickResult,
    SearchOptions, SortOrder,
};

use super::handlers::{error_response, ErrorResponse};
use crate::state::AppState;

/// Maximum page size a client may request
const MAX_LIMIT: usize = 100;

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Request/Response Types
// ============================================================================

/// Paging and ordering parameters shared by all listing queries
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    /// 1-based page of the full result
    pub page: Option<usize>,
    /// Page size (default from config, capped at 100)
    pub limit: Option<usize>,
    pub sort: Option<SortOrder>,
    /// Caller key; a newer search under the same key supersedes this one
    pub client: Option<String>,
}

/// Query parameters for the combined search
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub year: Option<u32>,
    #[serde(rename = "type")]
    pub movie_type: Option<MovieType>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub sort: Option<SortOrder>,
    pub client: Option<String>,
}

impl SearchParams {
    fn listing(&self) -> ListingParams {
        ListingParams {
            page: self.page,
            limit: self.limit,
            sort: self.sort,
            client: self.client.clone(),
        }
    }
}

/// Response for a started search
#[derive(Debug, Serialize)]
pub struct SearchStartedResponse {
    pub search_id: Uuid,
    pub generation: u64,
    pub filter: MovieFilter,
    pub quick: QuickResult,
}

impl ListingParams {
    fn to_options(&self) -> Result<SearchOptions, ApiError> {
        let mut options = SearchOptions::default();
        if let Some(page) = self.page {
            if page == 0 {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    "page must be at least 1",
                ));
            }
            options = options.with_page(page);
        }
        if let Some(limit) = self.limit {
            if limit == 0 {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    "limit must be at least 1",
                ));
            }
            options = options.with_limit(limit.min(MAX_LIMIT));
        }
        if let Some(sort) = self.sort {
            options = options.with_sort(sort);
        }
        Ok(options)
    }
}

async fn register(
    state: &AppState,
    client: Option<&str>,
    filter: MovieFilter,
    search: ProgressiveSearch,
) -> Json<SearchStartedResponse> {
    let session = state.sessions().insert(client, filter.clone(), &search).await;
    info!(
        search_id = %session.id,
        client = session.client.as_deref().unwrap_or("-"),
        generation = search.generation(),
        quick_matches = search.quick.total_items,
        "Search started"
    );
    Json(SearchStartedResponse {
        search_id: session.id,
        generation: search.generation(),
        filter,
        quick: search.quick,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/movies/search
///
/// Keyword search, optionally combined with category, country, year and type.
pub async fn search_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchStartedResponse>, ApiError> {
    let options = params.listing().to_options()?;

    let mut filter = MovieFilter::new()
        .with_category(params.category.as_deref().unwrap_or(""))
        .with_country(params.country.as_deref().unwrap_or(""));
    filter.year = params.year;
    filter.movie_type = params.movie_type;

    let keyword = params.keyword.unwrap_or_default();
    let session_filter = filter.clone().with_keyword(&keyword);
    let search = state
        .service()
        .search_movies(&keyword, filter, options)
        .await;
    Ok(register(&state, params.client.as_deref(), session_filter, search).await)
}

/// GET /api/v1/movies/category/{name}
pub async fn movies_by_category(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<ListingParams>,
) -> Result<Json<SearchStartedResponse>, ApiError> {
    let options = params.to_options()?;
    let search = state.service().movies_by_category(&name, options).await;
    let filter = MovieFilter::new().with_category(&name);
    Ok(register(&state, params.client.as_deref(), filter, search).await)
}

/// GET /api/v1/movies/country/{name}
pub async fn movies_by_country(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<ListingParams>,
) -> Result<Json<SearchStartedResponse>, ApiError> {
    let options = params.to_options()?;
    let search = state.service().movies_by_country(&name, options).await;
    let filter = MovieFilter::new().with_country(&name);
    Ok(register(&state, params.client.as_deref(), filter, search).await)
}

/// GET /api/v1/movies/year/{year}
pub async fn movies_by_year(
    State(state): State<Arc<AppState>>,
    Path(year): Path<u32>,
    Query(params): Query<ListingParams>,
) -> Result<Json<SearchStartedResponse>, ApiError> {
    let options = params.to_options()?;
    let search = state.service().movies_by_year(year, options).await;
    let filter = MovieFilter::new().with_year(year);
    Ok(register(&state, params.client.as_deref(), filter, search).await)
}

/// GET /api/v1/movies/type/{movie_type}
///
/// Accepts `single`/`series` or the upstream slugs `phim-le`/`phim-bo`.
pub async fn movies_by_type(
    State(state): State<Arc<AppState>>,
    Path(movie_type): Path<String>,
    Query(params): Query<ListingParams>,
) -> Result<Json<SearchStartedResponse>, ApiError> {
    let movie_type: MovieType = movie_type
        .parse()
        .map_err(|e: String| error_response(StatusCode::BAD_REQUEST, e))?;
    let options = params.to_options()?;
    let search = state.service().movies_by_type(movie_type, options).await;
    let filter = MovieFilter::new().with_type(movie_type);
    Ok(register(&state, params.client.as_deref(), filter, search).await)
}

/// GET /api/v1/movies/{slug}
///
/// Movie detail with its episode servers, fetched from the upstream.
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<MovieDetail>, ApiError> {
    match state.service().movie_detail(&slug).await {
        Ok(detail) => Ok(Json(detail)),
        Err(FetchError::NotFound(_)) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Movie not found: {}", slug),
        )),
        Err(e) => {
            warn!(slug = %slug, error = %e, "Upstream detail fetch failed");
            Err(error_response(StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}
