//! Search session polling.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use phimbro_core::{BackgroundState, MovieFilter, ResultPage};

use super::handlers::{error_response, ErrorResponse};
use crate::state::AppState;

/// Upper bound for long-polling
const MAX_WAIT_MS: u64 = 30_000;

/// Maximum page size a client may request
const MAX_LIMIT: usize = 100;

/// Query parameters for polling a search
#[derive(Debug, Default, Deserialize)]
pub struct PollParams {
    /// Page of the full result (defaults to the page the search was started with)
    pub page: Option<usize>,
    /// Page size (defaults to the limit the search was started with)
    pub limit: Option<usize>,
    /// Wait up to this many milliseconds for the background phase to finish
    pub wait_ms: Option<u64>,
}

/// Response for a polled search
#[derive(Debug, Serialize)]
pub struct SearchStatusResponse {
    pub search_id: Uuid,
    pub generation: u64,
    pub state: BackgroundState,
    /// The same client has started a newer search since this one
    pub superseded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    pub created_at: DateTime<Utc>,
    pub filter: MovieFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultPage>,
}

/// GET /api/v1/searches/{id}
///
/// State of the background phase and, once complete, one page of the full
/// result.
pub async fn get_search(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<PollParams>,
) -> Result<Json<SearchStatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let session = state.sessions().get(&id).await.ok_or_else(|| {
        error_response(StatusCode::NOT_FOUND, format!("Search not found: {}", id))
    })?;

    if let Some(wait_ms) = params.wait_ms.filter(|ms| *ms > 0) {
        let wait = Duration::from_millis(wait_ms.min(MAX_WAIT_MS));
        // A timeout just means the result is not ready yet.
        let _ = tokio::time::timeout(wait, session.background.clone().wait()).await;
    }

    let default_limit = session
        .options
        .limit
        .unwrap_or(state.config().search.default_page_size);
    let page = params.page.unwrap_or(session.options.page);
    let limit = params.limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT);

    let result = session
        .background
        .result()
        .map(|full| full.page(page, limit));
    let background_state = match result {
        Some(_) => BackgroundState::Complete,
        None => session.background.state(),
    };

    Ok(Json(SearchStatusResponse {
        search_id: session.id,
        generation: session.background.generation(),
        state: background_state,
        superseded: state.sessions().is_superseded(&session).await,
        client: session.client.clone(),
        created_at: session.created_at,
        filter: session.filter,
        result,
    }))
}
