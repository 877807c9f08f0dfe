//! Cache Store Module
//!
//! The `Store` trait every durable medium implements, the index both backends
//! use for size accounting, and an in-memory backend.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::cache::{CacheEntry, EntryMeta};
use crate::error::Result;

// == Storage Snapshot ==
/// Read-only snapshot of what a store holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageInfo {
    pub entry_count: usize,
    pub total_size_bytes: u64,
    /// Least recently used first
    pub entries: Vec<EntryMeta>,
}

// == Store Trait ==
/// Durable key/value storage for media payloads plus their metadata.
///
/// Implementations must be safe to call concurrently and must keep the
/// payload write and the size accounting in one critical section.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Returns the entry for `key`, payload included.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Metadata-only existence check.
    async fn contains(&self, key: &str) -> Result<bool>;

    /// Stores `payload` under `key`, replacing any existing entry.
    async fn put(&self, key: &str, payload: Bytes, timestamp: DateTime<Utc>) -> Result<()>;

    /// Bumps the access timestamp of `key`. Returns false if absent.
    async fn touch(&self, key: &str, timestamp: DateTime<Utc>) -> Result<bool>;

    /// Removes `key`. Absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Metadata of every entry, least recently used first.
    async fn list_all(&self) -> Result<Vec<EntryMeta>>;

    /// Listing and size total taken under one read.
    async fn snapshot(&self) -> Result<StorageInfo>;

    /// Removes every entry.
    async fn clear_all(&self) -> Result<()>;

    /// Sum of payload sizes.
    async fn total_size(&self) -> Result<u64>;

    /// Number of entries.
    async fn len(&self) -> Result<usize>;

    /// Persists recency updates that are only held in memory.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

// == Store Index ==
/// Metadata index with running size total.
///
/// `total_size` is only ever changed by `insert`, `remove` and `clear`.
/// Timestamps are clamped to the latest one seen, so a wall clock that steps
/// back never makes a fresh entry look old.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoreIndex {
    entries: HashMap<String, EntryMeta>,
    total_size: u64,
    next_sequence: u64,
    #[serde(default)]
    latest_access: Option<DateTime<Utc>>,
}

impl StoreIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new or replaced entry. Returns the previous metadata.
    pub fn insert(&mut self, key: &str, size_bytes: u64, at: DateTime<Utc>) -> Option<EntryMeta> {
        let at = self.clamp(at);
        let meta = EntryMeta::new(key, size_bytes, at, self.next_sequence);
        self.next_sequence += 1;
        self.total_size += size_bytes;

        let previous = self.entries.insert(key.to_string(), meta);
        if let Some(prev) = &previous {
            self.total_size -= prev.size_bytes;
        }
        previous
    }

    /// Puts back `previous` for `key` after a failed write.
    pub fn restore(&mut self, key: &str, previous: Option<EntryMeta>) {
        self.remove(key);
        if let Some(meta) = previous {
            self.total_size += meta.size_bytes;
            self.entries.insert(key.to_string(), meta);
        }
    }

    /// Removes `key`, returning its metadata if it was present.
    pub fn remove(&mut self, key: &str) -> Option<EntryMeta> {
        let removed = self.entries.remove(key);
        if let Some(meta) = &removed {
            self.total_size -= meta.size_bytes;
        }
        removed
    }

    /// Bumps the access timestamp of `key` and moves it behind every other
    /// entry with the same timestamp.
    pub fn touch(&mut self, key: &str, at: DateTime<Utc>) -> bool {
        if !self.entries.contains_key(key) {
            return false;
        }
        let at = self.clamp(at);
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        if let Some(meta) = self.entries.get_mut(key) {
            meta.touch(at);
            meta.sequence = sequence;
        }
        true
    }

    fn clamp(&mut self, at: DateTime<Utc>) -> DateTime<Utc> {
        let at = match self.latest_access {
            Some(latest) if latest > at => latest,
            _ => at,
        };
        self.latest_access = Some(at);
        at
    }

    /// Metadata for `key`.
    pub fn get(&self, key: &str) -> Option<&EntryMeta> {
        self.entries.get(key)
    }

    /// Whether `key` is indexed.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All metadata, least recently used first.
    pub fn snapshot(&self) -> Vec<EntryMeta> {
        let mut entries: Vec<EntryMeta> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.lru_cmp(b));
        entries
    }

    /// Entries and total as one consistent value.
    pub fn storage_info(&self) -> StorageInfo {
        StorageInfo {
            entry_count: self.entries.len(),
            total_size_bytes: self.total_size,
            entries: self.snapshot(),
        }
    }

    /// Drops every entry. The sequence counter and the clock mark are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_size = 0;
    }

    /// Sum of indexed payload sizes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keeps only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&EntryMeta) -> bool) -> Vec<EntryMeta> {
        let dropped: Vec<String> = self
            .entries
            .values()
            .filter(|meta| !keep(meta))
            .map(|meta| meta.key.clone())
            .collect();

        dropped.iter().filter_map(|key| self.remove(key)).collect()
    }
}

// == Memory Store ==
#[derive(Debug, Default)]
struct MemoryState {
    index: StoreIndex,
    payloads: HashMap<String, Bytes>,
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let state = self.state.read().await;
        let entry = state
            .index
            .get(key)
            .zip(state.payloads.get(key))
            .map(|(meta, payload)| CacheEntry::new(meta.clone(), payload.clone()));
        Ok(entry)
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.state.read().await.index.contains(key))
    }

    async fn put(&self, key: &str, payload: Bytes, timestamp: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.write().await;
        state.index.insert(key, payload.len() as u64, timestamp);
        state.payloads.insert(key.to_string(), payload);
        Ok(())
    }

    async fn touch(&self, key: &str, timestamp: DateTime<Utc>) -> Result<bool> {
        Ok(self.state.write().await.index.touch(key, timestamp))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.index.remove(key);
        state.payloads.remove(key);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<EntryMeta>> {
        Ok(self.state.read().await.index.snapshot())
    }

    async fn snapshot(&self) -> Result<StorageInfo> {
        Ok(self.state.read().await.index.storage_info())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.index.clear();
        state.payloads.clear();
        Ok(())
    }

    async fn total_size(&self) -> Result<u64> {
        Ok(self.state.read().await.index.total_size())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.state.read().await.index.len())
    }
}
