// src/engine/locks.rs

//! Per-cluster serialisation.
//!
//! Two installs of the same cluster name would race on one working directory
//! and one install config. `ClusterLocks` hands out one async mutex per
//! name; installs of different clusters never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Shared registry of per-cluster locks. Cloning shares the registry.
#[derive(Debug, Clone, Default)]
pub struct ClusterLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl ClusterLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `cluster`. The lock is held until the guard
    /// is dropped.
    pub async fn acquire(&self, cluster: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = match self.inner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            Arc::clone(map.entry(cluster.to_string()).or_default())
        };
        debug!(cluster, "waiting for cluster lock");
        let guard = lock.lock_owned().await;
        debug!(cluster, "cluster lock acquired");
        guard
    }

    /// Non-blocking variant; `None` if another install holds the lock.
    pub fn try_acquire(&self, cluster: &str) -> Option<OwnedMutexGuard<()>> {
        let lock = {
            let mut map = match self.inner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            Arc::clone(map.entry(cluster.to_string()).or_default())
        };
        lock.try_lock_owned().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_name_is_exclusive_other_names_are_not() {
        let locks = ClusterLocks::new();
        let hub = locks.acquire("hub").await;

        assert!(locks.try_acquire("hub").is_none());
        assert!(locks.try_acquire("edge").is_some());

        drop(hub);
        assert!(locks.try_acquire("hub").is_some());
    }
}
