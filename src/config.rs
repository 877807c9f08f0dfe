//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheOptions;

/// Default cache directory
pub const DEFAULT_CACHE_DIR: &str = "./media-cache";

/// Default storage quota: 512 MiB
pub const DEFAULT_QUOTA_BYTES: u64 = 512 * 1024 * 1024;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding cached payloads and the index
    pub cache_dir: PathBuf,
    /// Soft upper bound on the aggregate size of cached payloads
    pub quota_bytes: u64,
    /// Upper bound for a single remote fetch, in seconds
    pub fetch_timeout_secs: u64,
    /// Maximum number of concurrent resolves during a preload
    pub preload_concurrency: usize,
    /// Skip entries whose references are still held or leased when evicting
    pub pin_referenced: bool,
    /// Seconds a served reference stays pinned after its last access
    pub pin_lease_secs: u64,
    /// Background eviction sweep interval in seconds
    pub sweep_interval: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Cache directory (default: ./media-cache)
    /// - `CACHE_QUOTA_BYTES` - Storage quota in bytes (default: 512 MiB)
    /// - `FETCH_TIMEOUT_SECS` - Fetch timeout in seconds (default: 60)
    /// - `PRELOAD_CONCURRENCY` - Concurrent resolves per preload (default: 4)
    /// - `PIN_REFERENCED` - Pin referenced entries against eviction (default: false)
    /// - `PIN_LEASE_SECS` - Pin duration after a reference is served (default: 300)
    /// - `SWEEP_INTERVAL` - Eviction sweep frequency in seconds (default: 30)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            quota_bytes: parse_var("CACHE_QUOTA_BYTES").unwrap_or(defaults.quota_bytes),
            fetch_timeout_secs: parse_var("FETCH_TIMEOUT_SECS")
                .unwrap_or(defaults.fetch_timeout_secs),
            preload_concurrency: parse_var("PRELOAD_CONCURRENCY")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.preload_concurrency),
            pin_referenced: parse_var("PIN_REFERENCED").unwrap_or(defaults.pin_referenced),
            pin_lease_secs: parse_var("PIN_LEASE_SECS").unwrap_or(defaults.pin_lease_secs),
            sweep_interval: parse_var("SWEEP_INTERVAL")
                .filter(|n: &u64| *n > 0)
                .unwrap_or(defaults.sweep_interval),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Options for the cache coordinator derived from this configuration.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            quota_bytes: self.quota_bytes,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            preload_concurrency: self.preload_concurrency,
            pin_referenced: self.pin_referenced,
            pin_lease: Duration::from_secs(self.pin_lease_secs),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            quota_bytes: DEFAULT_QUOTA_BYTES,
            fetch_timeout_secs: 60,
            preload_concurrency: 4,
            pin_referenced: false,
            pin_lease_secs: 300,
            sweep_interval: 30,
            server_port: 3000,
        }
    }
}
