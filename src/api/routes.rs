//! API Routes
//!
//! Configures the Axum router with all media cache endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cached_handler, clear_handler, counters_handler, evict_handler, health_handler,
    media_handler, preload_handler, resolve_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /resolve?url=` - Resolve a locator to a local reference
/// - `POST /preload` - Warm the cache for a batch of locators
/// - `GET /cached?url=` - Check whether a locator is cached
/// - `GET /stats` - Storage snapshot
/// - `GET /stats/counters` - Hit/miss/fetch/eviction counters
/// - `DELETE /cache` - Clear the cache
/// - `DELETE /cache/entry?url=` - Evict a single locator
/// - `GET /media/:id` - Bytes behind a local reference
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin so players on other origins can load media
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/resolve", get(resolve_handler))
        .route("/preload", post(preload_handler))
        .route("/cached", get(cached_handler))
        .route("/stats", get(stats_handler))
        .route("/stats/counters", get(counters_handler))
        .route("/cache", delete(clear_handler))
        .route("/cache/entry", delete(evict_handler))
        .route("/media/:id", get(media_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
