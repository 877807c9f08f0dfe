//! Response DTOs for the media cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheStats, LocalReference, StorageInfo};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Response body for GET /resolve
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    /// The locator as requested
    pub url: String,
    /// Canonical cache key
    pub key: String,
    /// Local address serving the cached bytes
    pub reference: String,
    /// Payload size in bytes
    pub size_bytes: u64,
}

impl ResolveResponse {
    /// Creates a new ResolveResponse for a resolved reference
    pub fn new(url: impl Into<String>, reference: &LocalReference) -> Self {
        Self {
            url: url.into(),
            key: reference.key().to_string(),
            reference: media_path(reference.id()),
            size_bytes: reference.size_bytes(),
        }
    }
}

/// Local path under which a reference is served.
pub fn media_path(id: &str) -> String {
    format!("/media/{}", id)
}

/// Response body for GET /cached
#[derive(Debug, Clone, Serialize)]
pub struct CachedResponse {
    /// The locator as requested
    pub url: String,
    /// Whether the locator is currently cached
    pub cached: bool,
}

impl CachedResponse {
    /// Creates a new CachedResponse
    pub fn new(url: impl Into<String>, cached: bool) -> Self {
        Self {
            url: url.into(),
            cached,
        }
    }
}

/// One cached asset in the stats listing
#[derive(Debug, Clone, Serialize)]
pub struct VideoInfo {
    /// Canonical locator of the asset
    pub url: String,
    /// Payload size in bytes
    pub size: u64,
    /// Last access time (RFC 3339)
    pub timestamp: String,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Number of cached assets
    pub total_videos: usize,
    /// Aggregate size in MiB, two decimals
    #[serde(rename = "totalSizeMB")]
    pub total_size_mb: String,
    /// Per-asset details, least recently used first
    pub videos: Vec<VideoInfo>,
}

impl StatsResponse {
    /// Builds the stats body from a storage snapshot
    pub fn from_info(info: &StorageInfo) -> Self {
        Self {
            total_videos: info.entry_count,
            total_size_mb: format!("{:.2}", info.total_size_bytes as f64 / BYTES_PER_MB),
            videos: info
                .entries
                .iter()
                .map(|meta| VideoInfo {
                    url: meta.key.clone(),
                    size: meta.size_bytes,
                    timestamp: meta.last_accessed_at.to_rfc3339(),
                })
                .collect(),
        }
    }
}

/// Response body for GET /stats/counters
#[derive(Debug, Clone, Serialize)]
pub struct CountersResponse {
    /// Resolves answered from the store
    pub hits: u64,
    /// Resolves that went to the network
    pub misses: u64,
    /// Successful remote fetches
    pub fetches: u64,
    /// Failed remote fetches
    pub fetch_failures: u64,
    /// Resolves that joined an in-flight load
    pub coalesced: u64,
    /// Entries removed by the LRU policy
    pub evictions: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for CountersResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            fetches: stats.fetches,
            fetch_failures: stats.fetch_failures,
            coalesced: stats.coalesced,
            evictions: stats.evictions,
        }
    }
}

/// Response body for DELETE /cache and DELETE /cache/entry
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Success message
    pub message: String,
}

impl MessageResponse {
    /// Creates a new MessageResponse
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
