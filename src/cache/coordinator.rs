//! Fetch-and-Cache Coordinator
//!
//! `MediaCache` turns locators into local references. Concurrent requests for
//! the same key share one load; misses are fetched, stored, and followed by an
//! eviction pass.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::key::normalize_locator;
use crate::cache::{
    CacheStats, DiskStore, EvictionManager, EvictionPolicy, Fetcher, HttpFetcher,
    LocalReference, ReferenceRegistry, StatsRecorder, StorageInfo, Store,
};
use crate::config::Config;
use crate::error::{CacheError, Result};

type Flight = Shared<BoxFuture<'static, Result<LocalReference>>>;

// == Options ==
/// Tuning knobs for the coordinator.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Soft upper bound on the aggregate payload size
    pub quota_bytes: u64,
    /// Upper bound for a single remote fetch
    pub fetch_timeout: Duration,
    /// Maximum number of concurrent resolves during a preload
    pub preload_concurrency: usize,
    /// Skip entries whose reference is held or leased when evicting
    pub pin_referenced: bool,
    /// How long a lease taken by `lease` keeps an entry pinned
    pub pin_lease: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Config::default().cache_options()
    }
}

// == Batch / Introspection Types ==
/// Per-locator result of a preload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreloadOutcome {
    pub locator: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PreloadOutcome {
    fn from_result(locator: String, result: Result<LocalReference>) -> Self {
        match result {
            Ok(_) => Self {
                locator,
                success: true,
                error: None,
            },
            Err(e) => Self {
                locator,
                success: false,
                error: Some(e.to_string()),
            },
        }
    }
}

// == Media Cache ==
struct Inner {
    store: Arc<dyn Store>,
    fetcher: Arc<dyn Fetcher>,
    references: ReferenceRegistry,
    eviction: EvictionManager,
    in_flight: Mutex<HashMap<String, Flight>>,
    stats: StatsRecorder,
    options: CacheOptions,
}

/// Process-wide media cache handle. Clones share the same state.
#[derive(Clone)]
pub struct MediaCache {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MediaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaCache")
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl MediaCache {
    // == Constructors ==
    /// Builds a cache over an arbitrary store and transport.
    pub fn new(store: Arc<dyn Store>, fetcher: Arc<dyn Fetcher>, options: CacheOptions) -> Self {
        let eviction = EvictionManager::new(EvictionPolicy {
            quota_bytes: options.quota_bytes,
            pin_referenced: options.pin_referenced,
        });
        Self {
            inner: Arc::new(Inner {
                store,
                fetcher,
                references: ReferenceRegistry::new(),
                eviction,
                in_flight: Mutex::new(HashMap::new()),
                stats: StatsRecorder::new(),
                options,
            }),
        }
    }

    /// Opens the on-disk store from `config` and fetches over HTTP.
    ///
    /// Fails with `StorageUnavailable` when the cache directory is unusable.
    pub async fn open(config: &Config) -> Result<Self> {
        let options = config.cache_options();
        let store = DiskStore::open(&config.cache_dir).await?;
        let fetcher = HttpFetcher::new(options.fetch_timeout)
            .map_err(|e| CacheError::Internal(format!("{:#}", e)))?;

        let cache = Self::new(Arc::new(store), Arc::new(fetcher), options);
        // A lowered quota takes effect immediately
        cache.sweep().await?;
        Ok(cache)
    }

    // == Resolve ==
    /// Returns a local reference for `locator`, fetching it on a miss.
    ///
    /// Only one load per key runs at a time; concurrent callers await the same
    /// load and observe the same outcome.
    pub async fn resolve(&self, locator: &str) -> Result<LocalReference> {
        let key = normalize_locator(locator)?;

        let flight = {
            let mut in_flight = self.inner.in_flight.lock().await;
            match in_flight.get(&key) {
                Some(flight) => {
                    self.inner.stats.record_coalesced();
                    debug!(key = %key, "Joining in-flight load");
                    flight.clone()
                }
                None => {
                    let flight = self.spawn_load(key.clone(), locator.trim().to_string());
                    in_flight.insert(key, flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    /// Runs the load on its own task so it settles even if every caller
    /// goes away. The task clears its in-flight slot when done.
    fn spawn_load(&self, key: String, locator: String) -> Flight {
        let cache = self.clone();
        let handle = tokio::spawn(async move {
            let result = cache.load(&key, &locator).await;
            cache.inner.in_flight.lock().await.remove(&key);
            result
        });

        async move {
            handle.await.unwrap_or_else(|e| {
                Err(CacheError::Internal(format!("resolve task failed: {}", e)))
            })
        }
        .boxed()
        .shared()
    }

    async fn load(&self, key: &str, locator: &str) -> Result<LocalReference> {
        let inner = &self.inner;

        if let Some(reference) = inner.references.lookup(key).await {
            if inner.store.touch(key, Utc::now()).await? {
                inner.stats.record_hit();
                debug!(key = %key, id = %reference.id(), "Cache hit (live reference)");
                return Ok(reference);
            }
            inner.references.release(key).await;
        }

        if let Some(entry) = inner.store.get(key).await? {
            inner.store.touch(key, Utc::now()).await?;
            inner.stats.record_hit();
            debug!(key = %key, size = entry.size_bytes(), "Cache hit");
            return Ok(inner.references.materialize(key, entry.payload).await);
        }

        inner.stats.record_miss();
        debug!(key = %key, "Cache miss");
        let payload = self.fetch(locator).await?;

        inner.store.put(key, payload.clone(), Utc::now()).await?;
        let evicted = inner
            .eviction
            .enforce(inner.store.as_ref(), &inner.references, Some(key))
            .await?;
        inner.stats.record_evictions(evicted.len());

        Ok(inner.references.replace(key, payload).await)
    }

    async fn fetch(&self, locator: &str) -> Result<bytes::Bytes> {
        let inner = &self.inner;
        let timeout = inner.options.fetch_timeout;
        let started = Instant::now();

        let outcome = match tokio::time::timeout(timeout, inner.fetcher.fetch(locator)).await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(e)) => Err(CacheError::fetch_failed(locator, format!("{:#}", e))),
            Err(_) => Err(CacheError::fetch_failed(
                locator,
                format!("timed out after {}ms", timeout.as_millis()),
            )),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(payload) => {
                inner.stats.record_fetch();
                debug!(url = %locator, size = payload.len(), elapsed_ms, "Fetch complete");
            }
            Err(e) => {
                inner.stats.record_fetch_failure();
                warn!(url = %locator, elapsed_ms, error = %e, "Fetch failed");
            }
        }
        outcome
    }

    // == Preload ==
    /// Resolves every locator, reporting one outcome per input in input order.
    ///
    /// A failure for one locator never aborts the batch.
    pub async fn preload<I, S>(&self, locators: I) -> Vec<PreloadOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let concurrency = self.inner.options.preload_concurrency.max(1);
        let outcomes: Vec<PreloadOutcome> = stream::iter(locators.into_iter().map(Into::into))
            .map(|locator: String| async move {
                let result = self.resolve(&locator).await;
                PreloadOutcome::from_result(locator, result)
            })
            .buffered(concurrency)
            .collect()
            .await;

        let failed = outcomes.iter().filter(|o| !o.success).count();
        info!(total = outcomes.len(), failed, "Preload complete");
        outcomes
    }

    // == Introspection ==
    /// Whether `locator` is cached. Never fetches.
    pub async fn has(&self, locator: &str) -> Result<bool> {
        match normalize_locator(locator) {
            Ok(key) => self.inner.store.contains(&key).await,
            Err(_) => Ok(false),
        }
    }

    /// Snapshot of the store contents. Never fetches or bumps recency.
    pub async fn storage_info(&self) -> Result<StorageInfo> {
        self.inner.store.snapshot().await
    }

    /// Counter snapshot.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot()
    }

    /// Live reference by id.
    pub async fn reference(&self, id: &str) -> Result<LocalReference> {
        self.inner
            .references
            .by_id(id)
            .await
            .ok_or_else(|| CacheError::NotFound(format!("reference {}", id)))
    }

    /// Pins `reference` against eviction for the configured lease period.
    ///
    /// Used by consumers that address bytes by id and do not keep the handle
    /// alive. A no-op unless pinning is enabled.
    pub async fn lease(&self, reference: &LocalReference) {
        if self.inner.options.pin_referenced {
            self.inner
                .references
                .lease(reference, self.inner.options.pin_lease)
                .await;
        }
    }

    // == Clear ==
    /// Empties the store and revokes every outstanding reference.
    pub async fn clear(&self) -> Result<()> {
        self.inner.store.clear_all().await?;
        let revoked = self.inner.references.revoke_all().await;
        info!(revoked, "Cache cleared");
        Ok(())
    }

    // == Evict ==
    /// Removes a single locator from the cache. Absent locators are a no-op.
    pub async fn evict(&self, locator: &str) -> Result<()> {
        let key = normalize_locator(locator)?;
        self.inner.store.delete(&key).await?;
        self.inner.references.release(&key).await;
        debug!(key = %key, "Evicted on request");
        Ok(())
    }

    // == Sweep ==
    /// Runs an eviction pass with nothing protected, then flushes pending
    /// recency updates. Returns the number of entries evicted.
    pub async fn sweep(&self) -> Result<usize> {
        let inner = &self.inner;
        let evicted = inner
            .eviction
            .enforce(inner.store.as_ref(), &inner.references, None)
            .await?;
        inner.stats.record_evictions(evicted.len());
        inner.store.flush().await?;
        Ok(evicted.len())
    }

    /// Persists pending recency updates.
    pub async fn flush(&self) -> Result<()> {
        self.inner.store.flush().await
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves `size` zero bytes for every locator containing "ok", fails the rest.
    #[derive(Default)]
    struct ScriptedFetcher {
        calls: AtomicUsize,
        delay: Option<Duration>,
        size: usize,
    }

    impl ScriptedFetcher {
        fn new(size: usize) -> Self {
            Self {
                size,
                ..Self::default()
            }
        }

        fn with_delay(size: usize, delay: Duration) -> Self {
            Self {
                size,
                delay: Some(delay),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, locator: &str) -> anyhow::Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if locator.contains("ok") {
                Ok(Bytes::from(vec![0u8; self.size]))
            } else {
                anyhow::bail!("origin returned status 404 Not Found")
            }
        }
    }

    fn cache_with(fetcher: Arc<ScriptedFetcher>, quota_bytes: u64) -> MediaCache {
        MediaCache::new(
            Arc::new(MemoryStore::new()),
            fetcher,
            CacheOptions {
                quota_bytes,
                fetch_timeout: Duration::from_secs(5),
                preload_concurrency: 4,
                pin_referenced: false,
                pin_lease: Duration::from_secs(60),
            },
        )
    }

    #[tokio::test]
    async fn test_sequential_resolves_fetch_once() {
        let fetcher = Arc::new(ScriptedFetcher::new(8));
        let cache = cache_with(fetcher.clone(), 1024);

        let first = cache.resolve("https://cdn.example.com/ok.mp4").await.unwrap();
        let second = cache.resolve("https://cdn.example.com/ok.mp4").await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(first.id(), second.id());
        assert_eq!(first.size_bytes(), 8);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.fetches, 1);
    }

    #[tokio::test]
    async fn test_equivalent_locators_fetch_once() {
        let fetcher = Arc::new(ScriptedFetcher::new(8));
        let cache = cache_with(fetcher.clone(), 1024);

        cache.resolve("https://CDN.example.com/ok.mp4").await.unwrap();
        cache.resolve("https://cdn.example.com/ok.mp4#t=5").await.unwrap();

        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_resolves_share_one_fetch() {
        let fetcher = Arc::new(ScriptedFetcher::with_delay(8, Duration::from_millis(100)));
        let cache = cache_with(fetcher.clone(), 1024);

        let results = futures::future::join_all(
            (0..10).map(|_| cache.resolve("https://cdn.example.com/ok.mp4")),
        )
        .await;

        assert_eq!(fetcher.calls(), 1);
        let first_id = results[0].as_ref().unwrap().id().to_string();
        for result in &results {
            assert_eq!(result.as_ref().unwrap().id(), first_id);
        }
        assert_eq!(cache.stats().coalesced, 9);
    }

    #[tokio::test]
    async fn test_concurrent_failures_share_one_error() {
        let fetcher = Arc::new(ScriptedFetcher::with_delay(8, Duration::from_millis(50)));
        let cache = cache_with(fetcher.clone(), 1024);

        let results = futures::future::join_all(
            (0..5).map(|_| cache.resolve("https://cdn.example.com/missing.mp4")),
        )
        .await;

        assert_eq!(fetcher.calls(), 1);
        let first = results[0].clone().unwrap_err();
        assert!(matches!(first, CacheError::FetchFailed { .. }));
        for result in results {
            assert_eq!(result.unwrap_err(), first);
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_stores_nothing_and_allows_retry() {
        let fetcher = Arc::new(ScriptedFetcher::new(8));
        let cache = cache_with(fetcher.clone(), 1024);

        let err = cache
            .resolve("https://cdn.example.com/missing.mp4")
            .await
            .unwrap_err();
        match err {
            CacheError::FetchFailed { locator, cause } => {
                assert_eq!(locator, "https://cdn.example.com/missing.mp4");
                assert!(cause.contains("404"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!cache.has("https://cdn.example.com/missing.mp4").await.unwrap());
        assert_eq!(cache.storage_info().await.unwrap().entry_count, 0);

        let _ = cache.resolve("https://cdn.example.com/missing.mp4").await;
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(cache.stats().fetch_failures, 2);
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let fetcher = Arc::new(ScriptedFetcher::with_delay(8, Duration::from_secs(10)));
        let cache = MediaCache::new(
            Arc::new(MemoryStore::new()),
            fetcher.clone(),
            CacheOptions {
                quota_bytes: 1024,
                fetch_timeout: Duration::from_millis(50),
                preload_concurrency: 1,
                pin_referenced: false,
                pin_lease: Duration::from_secs(60),
            },
        );

        let err = cache
            .resolve("https://cdn.example.com/ok.mp4")
            .await
            .unwrap_err();
        match err {
            CacheError::FetchFailed { cause, .. } => assert!(cause.contains("timed out")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!cache.has("https://cdn.example.com/ok.mp4").await.unwrap());
        assert!(cache.inner.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_locator() {
        let fetcher = Arc::new(ScriptedFetcher::new(8));
        let cache = cache_with(fetcher.clone(), 1024);

        let err = cache.resolve("not a url").await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidLocator(_)));
        assert_eq!(fetcher.calls(), 0);
        assert!(!cache.has("not a url").await.unwrap());
    }

    #[tokio::test]
    async fn test_eviction_after_insert() {
        let fetcher = Arc::new(ScriptedFetcher::new(10));
        let cache = cache_with(fetcher.clone(), 25);

        cache.resolve("https://cdn.example.com/ok-1.mp4").await.unwrap();
        cache.resolve("https://cdn.example.com/ok-2.mp4").await.unwrap();
        cache.resolve("https://cdn.example.com/ok-3.mp4").await.unwrap();

        let info = cache.storage_info().await.unwrap();
        assert_eq!(info.entry_count, 2);
        assert_eq!(info.total_size_bytes, 20);
        assert!(!cache.has("https://cdn.example.com/ok-1.mp4").await.unwrap());
        assert!(cache.has("https://cdn.example.com/ok-3.mp4").await.unwrap());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_hit_refreshes_recency() {
        let fetcher = Arc::new(ScriptedFetcher::new(10));
        let cache = cache_with(fetcher.clone(), 25);

        cache.resolve("https://cdn.example.com/ok-1.mp4").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.resolve("https://cdn.example.com/ok-2.mp4").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.resolve("https://cdn.example.com/ok-1.mp4").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.resolve("https://cdn.example.com/ok-3.mp4").await.unwrap();

        assert!(cache.has("https://cdn.example.com/ok-1.mp4").await.unwrap());
        assert!(!cache.has("https://cdn.example.com/ok-2.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_oversized_asset_is_still_cached() {
        let fetcher = Arc::new(ScriptedFetcher::new(100));
        let cache = cache_with(fetcher.clone(), 50);

        cache.resolve("https://cdn.example.com/ok-1.mp4").await.unwrap();
        cache.resolve("https://cdn.example.com/ok-2.mp4").await.unwrap();

        let info = cache.storage_info().await.unwrap();
        assert_eq!(info.entry_count, 1);
        assert_eq!(info.entries[0].key, "https://cdn.example.com/ok-2.mp4");
    }

    #[tokio::test]
    async fn test_evicted_reference_stays_readable() {
        let fetcher = Arc::new(ScriptedFetcher::new(10));
        let cache = cache_with(fetcher.clone(), 15);

        let held = cache.resolve("https://cdn.example.com/ok-1.mp4").await.unwrap();
        cache.resolve("https://cdn.example.com/ok-2.mp4").await.unwrap();

        assert!(!cache.has("https://cdn.example.com/ok-1.mp4").await.unwrap());
        assert!(held.payload().is_some());
        assert!(cache.reference(held.id()).await.is_err());

        let fresh = cache.resolve("https://cdn.example.com/ok-1.mp4").await.unwrap();
        assert_ne!(fresh.id(), held.id());
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_preload_partial_failure_keeps_order() {
        let fetcher = Arc::new(ScriptedFetcher::new(4));
        let cache = cache_with(fetcher.clone(), 1024);

        let outcomes = cache
            .preload([
                "https://cdn.example.com/ok-1.mp4",
                "https://cdn.example.com/broken.mp4",
                "https://cdn.example.com/ok-3.mp4",
            ])
            .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].locator, "https://cdn.example.com/ok-1.mp4");
        assert!(outcomes[0].success);
        assert!(outcomes[0].error.is_none());
        assert_eq!(outcomes[1].locator, "https://cdn.example.com/broken.mp4");
        assert!(!outcomes[1].success);
        assert!(outcomes[1].error.is_some());
        assert!(outcomes[2].success);
    }

    #[tokio::test]
    async fn test_storage_info_does_not_fetch() {
        let fetcher = Arc::new(ScriptedFetcher::new(4));
        let cache = cache_with(fetcher.clone(), 1024);
        cache.resolve("https://cdn.example.com/ok.mp4").await.unwrap();

        let before = cache.storage_info().await.unwrap();
        let after = cache.storage_info().await.unwrap();

        assert_eq!(before, after);
        assert_eq!(before.entry_count, 1);
        assert_eq!(before.total_size_bytes, 4);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_clear_revokes_references() {
        let fetcher = Arc::new(ScriptedFetcher::new(4));
        let cache = cache_with(fetcher.clone(), 1024);
        let reference = cache.resolve("https://cdn.example.com/ok.mp4").await.unwrap();

        cache.clear().await.unwrap();

        assert!(!cache.has("https://cdn.example.com/ok.mp4").await.unwrap());
        assert_eq!(cache.storage_info().await.unwrap().entry_count, 0);
        assert!(reference.is_revoked());
        assert!(reference.payload().is_none());
        assert!(matches!(
            cache.reference(reference.id()).await,
            Err(CacheError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_evict_is_idempotent() {
        let fetcher = Arc::new(ScriptedFetcher::new(4));
        let cache = cache_with(fetcher.clone(), 1024);
        cache.resolve("https://cdn.example.com/ok.mp4").await.unwrap();

        cache.evict("https://cdn.example.com/ok.mp4").await.unwrap();
        cache.evict("https://cdn.example.com/ok.mp4").await.unwrap();
        cache.evict("https://cdn.example.com/never.mp4").await.unwrap();

        assert!(!cache.has("https://cdn.example.com/ok.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_reference_lookup_by_id() {
        let fetcher = Arc::new(ScriptedFetcher::new(4));
        let cache = cache_with(fetcher.clone(), 1024);
        let reference = cache.resolve("https://cdn.example.com/ok.mp4").await.unwrap();

        let found = cache.reference(reference.id()).await.unwrap();
        assert_eq!(found, reference);
        assert!(cache.reference("unknown").await.is_err());
    }

    #[tokio::test]
    async fn test_sweep_respects_pins_until_released() {
        let fetcher = Arc::new(ScriptedFetcher::new(10));
        let cache = MediaCache::new(
            Arc::new(MemoryStore::new()),
            fetcher,
            CacheOptions {
                quota_bytes: 15,
                fetch_timeout: Duration::from_secs(5),
                preload_concurrency: 1,
                pin_referenced: true,
                pin_lease: Duration::from_secs(60),
            },
        );

        let held = cache.resolve("https://cdn.example.com/ok-1.mp4").await.unwrap();
        cache.resolve("https://cdn.example.com/ok-2.mp4").await.unwrap();
        assert_eq!(cache.storage_info().await.unwrap().entry_count, 2);

        drop(held);
        assert_eq!(cache.sweep().await.unwrap(), 1);
        assert!(!cache.has("https://cdn.example.com/ok-1.mp4").await.unwrap());
    }

    fn leasing_cache(pin_lease: Duration) -> MediaCache {
        MediaCache::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ScriptedFetcher::new(10)),
            CacheOptions {
                quota_bytes: 15,
                fetch_timeout: Duration::from_secs(5),
                preload_concurrency: 1,
                pin_referenced: true,
                pin_lease,
            },
        )
    }

    #[tokio::test]
    async fn test_lease_pins_entry_after_handle_is_dropped() {
        let cache = leasing_cache(Duration::from_secs(60));

        let reference = cache.resolve("https://cdn.example.com/ok-1.mp4").await.unwrap();
        cache.lease(&reference).await;
        drop(reference);

        cache.resolve("https://cdn.example.com/ok-2.mp4").await.unwrap();
        assert!(cache.has("https://cdn.example.com/ok-1.mp4").await.unwrap());
        assert_eq!(cache.sweep().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expired_lease_no_longer_pins() {
        let cache = leasing_cache(Duration::ZERO);

        let reference = cache.resolve("https://cdn.example.com/ok-1.mp4").await.unwrap();
        cache.lease(&reference).await;
        drop(reference);

        cache.resolve("https://cdn.example.com/ok-2.mp4").await.unwrap();
        assert!(!cache.has("https://cdn.example.com/ok-1.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_storage_info_total_matches_entries() {
        let fetcher = Arc::new(ScriptedFetcher::new(6));
        let cache = cache_with(fetcher, 1024);
        cache.resolve("https://cdn.example.com/ok-1.mp4").await.unwrap();
        cache.resolve("https://cdn.example.com/ok-2.mp4").await.unwrap();

        let info = cache.storage_info().await.unwrap();
        assert_eq!(info.entry_count, info.entries.len());
        assert_eq!(
            info.total_size_bytes,
            info.entries.iter().map(|meta| meta.size_bytes).sum::<u64>()
        );
    }
}
