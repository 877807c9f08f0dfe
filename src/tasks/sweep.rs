//! Eviction Sweep Task
//!
//! Background task that periodically re-applies the storage quota. Entries
//! skipped earlier because a consumer held them become evictable once they
//! are released; the sweep is what catches them.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::MediaCache;

/// Spawns a background task that runs an eviction pass every interval.
///
/// # Arguments
/// * `cache` - Shared cache handle
/// * `sweep_interval_secs` - Interval in seconds between passes
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let sweep_handle = spawn_sweep_task(cache.clone(), 30);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(cache: MediaCache, sweep_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting eviction sweep task with interval of {} seconds",
            sweep_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            match cache.sweep().await {
                Ok(0) => debug!("Eviction sweep: store within quota"),
                Ok(evicted) => info!("Eviction sweep: removed {} entries", evicted),
                Err(e) => warn!(error = %e, "Eviction sweep failed"),
            }
        }
    })
}
