//! API Handlers
//!
//! HTTP request handlers for each media cache endpoint.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::{MediaCache, PreloadOutcome};
use crate::error::{CacheError, Result};
use crate::models::{
    CachedResponse, CountersResponse, HealthResponse, LocatorQuery, MessageResponse,
    PreloadRequest, ResolveResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// Holds the process-wide cache handle; cloning it is cheap.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Shared media cache
    pub cache: MediaCache,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: MediaCache) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the on-disk store; fails if the cache directory is unusable.
    pub async fn from_config(config: &crate::config::Config) -> Result<Self> {
        let cache = MediaCache::open(config).await?;
        Ok(Self::new(cache))
    }
}

/// Handler for GET /resolve?url=
///
/// Returns a local reference for the locator, fetching it on a miss. The
/// client only keeps the id, so the reference is leased.
pub async fn resolve_handler(
    State(state): State<AppState>,
    Query(query): Query<LocatorQuery>,
) -> Result<Json<ResolveResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidLocator(error_msg));
    }

    let reference = state.cache.resolve(&query.url).await?;
    state.cache.lease(&reference).await;

    Ok(Json(ResolveResponse::new(query.url, &reference)))
}

/// Handler for POST /preload
///
/// Warms the cache for every locator and reports one outcome per input.
pub async fn preload_handler(
    State(state): State<AppState>,
    Json(req): Json<PreloadRequest>,
) -> Result<Json<Vec<PreloadOutcome>>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidLocator(error_msg));
    }

    let outcomes = state.cache.preload(req.urls).await;

    Ok(Json(outcomes))
}

/// Handler for GET /cached?url=
///
/// Existence check only; never fetches.
pub async fn cached_handler(
    State(state): State<AppState>,
    Query(query): Query<LocatorQuery>,
) -> Result<Json<CachedResponse>> {
    let cached = state.cache.has(&query.url).await?;

    Ok(Json(CachedResponse::new(query.url, cached)))
}

/// Handler for GET /stats
///
/// Returns the storage snapshot in the consumer-facing stats shape.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let info = state.cache.storage_info().await?;

    Ok(Json(StatsResponse::from_info(&info)))
}

/// Handler for GET /stats/counters
pub async fn counters_handler(State(state): State<AppState>) -> Json<CountersResponse> {
    Json(CountersResponse::from(state.cache.stats()))
}

/// Handler for DELETE /cache
///
/// Empties the cache and revokes every issued reference.
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    state.cache.clear().await?;

    Ok(Json(MessageResponse::new("Cache cleared")))
}

/// Handler for DELETE /cache/entry?url=
///
/// Removes a single locator; absent locators are not an error.
pub async fn evict_handler(
    State(state): State<AppState>,
    Query(query): Query<LocatorQuery>,
) -> Result<Json<MessageResponse>> {
    state.cache.evict(&query.url).await?;

    Ok(Json(MessageResponse::new(format!(
        "Locator '{}' evicted",
        query.url
    ))))
}

/// Handler for GET /media/:id
///
/// Serves the bytes behind a live local reference and renews its lease.
pub async fn media_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let reference = state.cache.reference(&id).await?;
    state.cache.lease(&reference).await;
    let payload = reference
        .payload()
        .ok_or_else(|| CacheError::NotFound(format!("reference {}", id)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CACHE_CONTROL, "private, max-age=3600"),
        ],
        payload,
    )
        .into_response())
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
