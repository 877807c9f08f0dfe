//! Media Cache - A local cache for remote media assets
//!
//! Resolves remote locators to local references, fetching each asset at most
//! once, persisting it on disk, and keeping the store under a size quota with
//! LRU eviction.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::MediaCache;
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
