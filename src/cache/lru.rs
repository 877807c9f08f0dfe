//! LRU Eviction Module
//!
//! Keeps the store under its byte quota by deleting least recently used
//! entries.

use std::collections::HashSet;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::{EntryMeta, ReferenceRegistry, Store};
use crate::error::Result;

// == Eviction Policy ==
/// Quota and pinning settings for eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Soft upper bound on the aggregate payload size
    pub quota_bytes: u64,
    /// Skip entries whose reference is currently held or leased
    pub pin_referenced: bool,
}

// == Victim Selection ==
/// Picks the keys to delete so that `total_size` drops to `quota_bytes`.
///
/// `entries` must be ordered least recently used first. The most recently
/// used entry, the `protect` key and every `pinned` key are never chosen, so
/// a single entry larger than the quota stays cached on its own.
pub fn select_victims(
    entries: &[EntryMeta],
    total_size: u64,
    quota_bytes: u64,
    protect: Option<&str>,
    pinned: &HashSet<String>,
) -> Vec<EntryMeta> {
    let mut remaining = total_size;
    let mut victims = Vec::new();
    let Some((_newest, candidates)) = entries.split_last() else {
        return victims;
    };

    for meta in candidates {
        if remaining <= quota_bytes {
            break;
        }
        if protect == Some(meta.key.as_str()) || pinned.contains(&meta.key) {
            continue;
        }
        remaining = remaining.saturating_sub(meta.size_bytes);
        victims.push(meta.clone());
    }
    victims
}

// == Eviction Manager ==
/// Runs eviction passes against a store, one at a time.
#[derive(Debug)]
pub struct EvictionManager {
    policy: EvictionPolicy,
    pass: Mutex<()>,
}

impl EvictionManager {
    /// Creates a manager for `policy`.
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            policy,
            pass: Mutex::new(()),
        }
    }

    // == Enforce ==
    /// Deletes least recently used entries until the store is within quota.
    ///
    /// Released references stay readable for whoever holds them but are no
    /// longer reused or served. Returns the evicted entries.
    pub async fn enforce(
        &self,
        store: &dyn Store,
        references: &ReferenceRegistry,
        protect: Option<&str>,
    ) -> Result<Vec<EntryMeta>> {
        let _pass = self.pass.lock().await;

        let info = store.snapshot().await?;
        if info.total_size_bytes <= self.policy.quota_bytes {
            return Ok(Vec::new());
        }

        let pinned: HashSet<String> = if self.policy.pin_referenced {
            references.pinned_keys().await.into_iter().collect()
        } else {
            HashSet::new()
        };

        let victims = select_victims(
            &info.entries,
            info.total_size_bytes,
            self.policy.quota_bytes,
            protect,
            &pinned,
        );
        for meta in &victims {
            store.delete(&meta.key).await?;
            references.release(&meta.key).await;
            debug!(key = %meta.key, size = meta.size_bytes, "Evicted least recently used entry");
        }

        if !victims.is_empty() {
            let freed: u64 = victims.iter().map(|meta| meta.size_bytes).sum();
            info!(
                evicted = victims.len(),
                freed,
                quota = self.policy.quota_bytes,
                "Eviction pass complete"
            );
        }
        Ok(victims)
    }
}
