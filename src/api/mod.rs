//! API Module
//!
//! HTTP handlers and routing for the media cache REST API.
//!
//! # Endpoints
//! - `GET /resolve?url=` - Resolve a locator to a local reference
//! - `POST /preload` - Warm the cache for a batch of locators
//! - `GET /cached?url=` - Check whether a locator is cached
//! - `GET /stats` - Storage snapshot
//! - `GET /stats/counters` - Cache counters
//! - `DELETE /cache` - Clear the cache
//! - `DELETE /cache/entry?url=` - Evict a single locator
//! - `GET /media/:id` - Serve cached bytes
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
