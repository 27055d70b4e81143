//! Catalog snapshot cache handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use phimbro_core::CacheStats;
use tracing::info;

use super::handlers::SuccessResponse;
use crate::state::AppState;

/// GET /api/v1/catalog/cache
///
/// Hit/miss counters and the age of the cached full-catalog snapshot.
pub async fn get_cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(state.service().cache_stats().await)
}

/// DELETE /api/v1/catalog/cache
///
/// Drop the snapshot; the next background phase fetches the catalog again.
pub async fn invalidate_cache(State(state): State<Arc<AppState>>) -> Json<SuccessResponse> {
    state.service().invalidate_cache().await;
    info!("Catalog cache invalidated via API");
    Json(SuccessResponse {
        message: "Catalog cache invalidated".to_string(),
    })
}
