//! Local References
//!
//! Process-lifetime handles that let playback consumers address cached bytes
//! without touching the store again. References are never persisted; after a
//! restart they are recreated from the stored payload on first resolve.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::key::key_digest;

// == Local Reference ==
#[derive(Debug)]
struct ReferenceInner {
    id: String,
    key: String,
    payload: Bytes,
    revoked: AtomicBool,
}

/// A locally playable handle to cached bytes. Cheap to clone.
///
/// A reference that has been released by eviction keeps serving its bytes to
/// whoever still holds it. A reference revoked by a cache clear exposes no
/// payload at all.
#[derive(Debug, Clone)]
pub struct LocalReference {
    inner: Arc<ReferenceInner>,
}

impl LocalReference {
    fn new(id: String, key: &str, payload: Bytes) -> Self {
        Self {
            inner: Arc::new(ReferenceInner {
                id,
                key: key.to_string(),
                payload,
                revoked: AtomicBool::new(false),
            }),
        }
    }

    /// Opaque identifier, unique within the process.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Cache key this reference was derived from.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Payload length in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.inner.payload.len() as u64
    }

    /// The cached bytes, or `None` once revoked.
    pub fn payload(&self) -> Option<Bytes> {
        if self.is_revoked() {
            None
        } else {
            Some(self.inner.payload.clone())
        }
    }

    /// Whether a cache clear has invalidated this reference.
    pub fn is_revoked(&self) -> bool {
        self.inner.revoked.load(Ordering::Acquire)
    }

    fn revoke(&self) {
        self.inner.revoked.store(true, Ordering::Release);
    }

    fn same_as(&self, other: &LocalReference) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for LocalReference {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for LocalReference {}

// == Reference Registry ==
#[derive(Debug, Default)]
struct RegistryState {
    by_key: HashMap<String, LocalReference>,
    key_by_id: HashMap<String, String>,
    /// Key to lease expiry
    leases: HashMap<String, Instant>,
    next_id: u64,
}

impl RegistryState {
    fn insert(&mut self, key: &str, payload: Bytes) -> LocalReference {
        self.next_id += 1;
        let id = format!("{}-{}", &key_digest(key)[..16], self.next_id);
        let reference = LocalReference::new(id.clone(), key, payload);

        if let Some(old) = self.by_key.insert(key.to_string(), reference.clone()) {
            self.key_by_id.remove(old.id());
            self.leases.remove(key);
        }
        self.key_by_id.insert(id, key.to_string());
        reference
    }
}

/// Tracks the live reference of every key.
///
/// The registry holds exactly one clone per live reference, so any extra
/// strong count means a consumer is still holding it. Consumers that only
/// keep the id (HTTP clients) pin a reference with a timed lease instead.
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    state: Mutex<RegistryState>,
}

impl ReferenceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Live reference for `key`, if one exists.
    pub async fn lookup(&self, key: &str) -> Option<LocalReference> {
        self.state.lock().await.by_key.get(key).cloned()
    }

    /// Live reference by id.
    pub async fn by_id(&self, id: &str) -> Option<LocalReference> {
        let state = self.state.lock().await;
        state
            .key_by_id
            .get(id)
            .and_then(|key| state.by_key.get(key))
            .cloned()
    }

    /// Reuses the live reference for `key` or creates one from `payload`.
    pub async fn materialize(&self, key: &str, payload: Bytes) -> LocalReference {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.by_key.get(key) {
            return existing.clone();
        }
        let reference = state.insert(key, payload);
        debug!(key = %key, id = %reference.id(), "Materialized local reference");
        reference
    }

    /// Creates a fresh reference for `key`, replacing any previous one.
    pub async fn replace(&self, key: &str, payload: Bytes) -> LocalReference {
        let reference = self.state.lock().await.insert(key, payload);
        debug!(key = %key, id = %reference.id(), "Created local reference");
        reference
    }

    /// Stops tracking the reference for `key` without revoking it.
    pub async fn release(&self, key: &str) {
        let mut state = self.state.lock().await;
        if let Some(reference) = state.by_key.remove(key) {
            state.key_by_id.remove(reference.id());
        }
        state.leases.remove(key);
    }

    /// Pins the live reference for `ttl` from now. Stale handles are ignored.
    pub async fn lease(&self, reference: &LocalReference, ttl: Duration) {
        let mut state = self.state.lock().await;
        let live = state
            .by_key
            .get(reference.key())
            .is_some_and(|current| current.same_as(reference));
        if live {
            state
                .leases
                .insert(reference.key().to_string(), Instant::now() + ttl);
            debug!(key = %reference.key(), ttl_secs = ttl.as_secs(), "Leased local reference");
        }
    }

    /// Revokes and forgets every reference. Returns how many were revoked.
    pub async fn revoke_all(&self) -> usize {
        let mut state = self.state.lock().await;
        let count = state.by_key.len();
        for reference in state.by_key.values() {
            reference.revoke();
        }
        state.by_key.clear();
        state.key_by_id.clear();
        state.leases.clear();
        count
    }

    /// Keys whose references are held by a consumer or under a live lease.
    /// Expired leases are dropped.
    pub async fn pinned_keys(&self) -> Vec<String> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let now = Instant::now();
        state.leases.retain(|_, expiry| *expiry > now);

        state
            .by_key
            .iter()
            .filter(|(key, reference)| {
                Arc::strong_count(&reference.inner) > 1 || state.leases.contains_key(*key)
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of live references.
    pub async fn len(&self) -> usize {
        self.state.lock().await.by_key.len()
    }

    /// Returns true if no reference is live.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
