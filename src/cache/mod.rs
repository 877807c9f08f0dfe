//! Cache Module
//!
//! Provides a persistent, quota-bounded cache for remote media assets with
//! single-flight fetching and LRU eviction.

mod coordinator;
mod disk;
mod entry;
mod fetch;
pub mod key;
mod lru;
mod reference;
mod stats;
mod store;


// Re-export public types
pub use coordinator::{CacheOptions, MediaCache, PreloadOutcome};
pub use disk::DiskStore;
pub use entry::{CacheEntry, EntryMeta};
pub use fetch::{Fetcher, HttpFetcher};
pub use lru::{select_victims, EvictionManager, EvictionPolicy};
pub use reference::{LocalReference, ReferenceRegistry};
pub use stats::{CacheStats, StatsRecorder};
pub use store::{MemoryStore, StorageInfo, Store, StoreIndex};

// == Public Constants ==
/// Maximum allowed locator length in bytes
pub const MAX_LOCATOR_LENGTH: usize = 8 * 1024;

/// Maximum number of locators accepted by a single preload request
pub const MAX_PRELOAD_BATCH: usize = 256;
