//! Disk Store Module
//!
//! File-based persistent store: one blob file per entry plus a JSON index
//! with the metadata of every entry.
//!
//! Layout:
//! - `<root>/<sha256(key)>.blob` payload bytes
//! - `<root>/index.json` serialized `StoreIndex`
//!
//! Blobs and the index are written to a `.tmp` file first and renamed into
//! place, so a crash never leaves a half-written file under a live name.
//! Blob bytes are staged before the index lock is taken; only the index
//! update and the final rename run under it. Recency bumps stay in memory
//! until the next index write or `flush`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::key::key_digest;
use crate::cache::{CacheEntry, EntryMeta, StorageInfo, Store, StoreIndex};
use crate::error::{CacheError, Result};

const INDEX_FILE: &str = "index.json";
const BLOB_EXTENSION: &str = "blob";
const TMP_EXTENSION: &str = "tmp";

// == Disk Store ==
/// Persistent store rooted at a cache directory.
#[derive(Debug)]
pub struct DiskStore {
    root: PathBuf,
    index: RwLock<StoreIndex>,
    staging_seq: AtomicU64,
    recency_dirty: AtomicBool,
}

impl DiskStore {
    // == Open ==
    /// Opens (or creates) the store at `root`.
    ///
    /// Fails with `StorageUnavailable` if the directory cannot be created or
    /// the index cannot be read or parsed. Index records whose blob is gone or
    /// has the wrong length are dropped, and files the index does not know
    /// about are deleted.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            CacheError::StorageUnavailable(format!("cannot create {}: {}", root.display(), e))
        })?;

        let index_path = root.join(INDEX_FILE);
        let mut index = match fs::read(&index_path).await {
            Ok(raw) => serde_json::from_slice::<StoreIndex>(&raw).map_err(|e| {
                CacheError::StorageUnavailable(format!(
                    "corrupted index {}: {}",
                    index_path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreIndex::new(),
            Err(e) => {
                return Err(CacheError::StorageUnavailable(format!(
                    "cannot read {}: {}",
                    index_path.display(),
                    e
                )))
            }
        };

        let store = Self {
            root,
            index: RwLock::new(StoreIndex::new()),
            staging_seq: AtomicU64::new(0),
            recency_dirty: AtomicBool::new(false),
        };
        let dropped = store.reconcile(&mut index).await?;
        if dropped > 0 {
            store.persist_index(&index).await?;
        }

        info!(
            cache_dir = %store.root.display(),
            entries = index.len(),
            total_size = index.total_size(),
            dropped,
            "Disk store opened"
        );
        *store.index.write().await = index;
        Ok(store)
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", key_digest(key), BLOB_EXTENSION))
    }

    /// Unique temporary name for a blob being written.
    fn staging_path(&self, key: &str) -> PathBuf {
        let seq = self.staging_seq.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(format!("{}.{}.{}", key_digest(key), seq, TMP_EXTENSION))
    }

    // == Reconcile ==
    /// Drops index records without a matching blob and deletes stray files.
    async fn reconcile(&self, index: &mut StoreIndex) -> Result<usize> {
        let mut present = HashSet::new();
        for meta in index.snapshot() {
            match fs::metadata(self.blob_path(&meta.key)).await {
                Ok(file) if file.len() == meta.size_bytes => {
                    present.insert(meta.key);
                }
                Ok(file) => {
                    warn!(key = %meta.key, expected = meta.size_bytes, actual = file.len(), "Blob size mismatch, dropping entry");
                }
                Err(_) => {
                    warn!(key = %meta.key, "Blob missing, dropping entry");
                }
            }
        }
        let dropped = index.retain(|meta| present.contains(&meta.key));
        for meta in &dropped {
            let _ = fs::remove_file(self.blob_path(&meta.key)).await;
        }

        let known: HashSet<PathBuf> = index
            .snapshot()
            .iter()
            .map(|meta| self.blob_path(&meta.key))
            .collect();
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(|e| CacheError::from_io("listing cache dir", e))?;
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| CacheError::from_io("listing cache dir", e))?
        {
            let path = item.path();
            let stray = match path.extension().and_then(|ext| ext.to_str()) {
                Some(BLOB_EXTENSION) => !known.contains(&path),
                Some(TMP_EXTENSION) => true,
                _ => false,
            };
            if stray {
                debug!(path = %path.display(), "Removing stray cache file");
                let _ = fs::remove_file(&path).await;
            }
        }

        Ok(dropped.len())
    }

    // == Atomic Write ==
    async fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        let tmp = path.with_extension(TMP_EXTENSION);
        if let Err(e) = fs::write(&tmp, data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(CacheError::from_io("writing cache file", e));
        }
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(CacheError::from_io("renaming cache file", e));
        }
        Ok(())
    }

    /// Callers hold the index write lock.
    async fn persist_index(&self, index: &StoreIndex) -> Result<()> {
        let raw = serde_json::to_vec(index)
            .map_err(|e| CacheError::Internal(format!("serializing index: {}", e)))?;
        self.write_atomic(&self.root.join(INDEX_FILE), &raw).await?;
        self.recency_dirty.store(false, Ordering::Release);
        Ok(())
    }
}

#[async_trait]
impl Store for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let meta = {
            let index = self.index.read().await;
            match index.get(key) {
                Some(meta) => meta.clone(),
                None => return Ok(None),
            }
        };

        let path = self.blob_path(key);
        let payload = match fs::read(&path).await {
            Ok(raw) => Bytes::from(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(key = %key, "Blob vanished, removing entry");
                self.delete(key).await?;
                return Ok(None);
            }
            Err(e) => return Err(CacheError::from_io("reading blob", e)),
        };

        let entry = CacheEntry::new(meta, payload);
        if !entry.is_consistent() {
            warn!(key = %key, expected = entry.size_bytes(), actual = entry.payload.len(), "Blob size mismatch, removing entry");
            self.delete(key).await?;
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.index.read().await.contains(key))
    }

    async fn put(&self, key: &str, payload: Bytes, timestamp: DateTime<Utc>) -> Result<()> {
        let path = self.blob_path(key);
        let staging = self.staging_path(key);
        if let Err(e) = fs::write(&staging, &payload).await {
            let _ = fs::remove_file(&staging).await;
            return Err(CacheError::from_io("writing blob", e));
        }

        let mut index = self.index.write().await;
        let previous = index.insert(key, payload.len() as u64, timestamp);
        if let Err(e) = self.persist_index(&index).await {
            index.restore(key, previous);
            drop(index);
            let _ = fs::remove_file(&staging).await;
            return Err(e);
        }

        // The index already names the new size; a failed rename has to undo it
        if let Err(e) = fs::rename(&staging, &path).await {
            index.restore(key, previous);
            if let Err(persist) = self.persist_index(&index).await {
                warn!(key = %key, error = %persist, "Failed to roll back index after blob rename");
            }
            drop(index);
            let _ = fs::remove_file(&staging).await;
            return Err(CacheError::from_io("renaming blob", e));
        }

        debug!(key = %key, size = payload.len(), total_size = index.total_size(), "Stored blob");
        Ok(())
    }

    async fn touch(&self, key: &str, timestamp: DateTime<Utc>) -> Result<bool> {
        let found = self.index.write().await.touch(key, timestamp);
        if found {
            self.recency_dirty.store(true, Ordering::Release);
        }
        Ok(found)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut index = self.index.write().await;
        let Some(meta) = index.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.persist_index(&index).await {
            index.restore(key, Some(meta));
            return Err(e);
        }
        match fs::remove_file(self.blob_path(key)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(key = %key, error = %e, "Failed to remove blob file"),
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<EntryMeta>> {
        Ok(self.index.read().await.snapshot())
    }

    async fn snapshot(&self) -> Result<StorageInfo> {
        Ok(self.index.read().await.storage_info())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut index = self.index.write().await;
        let keys: Vec<String> = index.snapshot().into_iter().map(|meta| meta.key).collect();

        let mut cleared = index.clone();
        cleared.clear();
        self.persist_index(&cleared).await?;
        *index = cleared;
        for key in keys {
            let _ = fs::remove_file(self.blob_path(&key)).await;
        }
        Ok(())
    }

    async fn total_size(&self) -> Result<u64> {
        Ok(self.index.read().await.total_size())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.index.read().await.len())
    }

    async fn flush(&self) -> Result<()> {
        let index = self.index.write().await;
        if !self.recency_dirty.load(Ordering::Acquire) {
            return Ok(());
        }
        self.persist_index(&index).await?;
        debug!(entries = index.len(), "Flushed recency to index");
        Ok(())
    }
}
