use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{catalog, handlers, middleware::metrics_middleware, movies, searches};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Progressive searches
        .route("/movies/search", get(movies::search_movies))
        .route("/movies/category/{name}", get(movies::movies_by_category))
        .route("/movies/country/{name}", get(movies::movies_by_country))
        .route("/movies/year/{year}", get(movies::movies_by_year))
        .route("/movies/type/{movie_type}", get(movies::movies_by_type))
        .route("/searches/{id}", get(searches::get_search))
        // Movie detail (proxied from upstream)
        .route("/movies/{slug}", get(movies::get_movie))
        // Catalog snapshot cache
        .route(
            "/catalog/cache",
            get(catalog::get_cache_stats).delete(catalog::invalidate_cache),
        )
        .route_layer(middleware::from_fn(metrics_middleware))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
