//! Local snapshot cache.
//!
//! Each domain list is stored as one JSON array under a fixed key. Writes are
//! whole-list overwrites. A cache failure never fails the caller: the worst
//! outcome is a stale or empty snapshot, which the next successful remote
//! load repairs.

use std::sync::Arc;

use hq_core::LocalStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

#[derive(Clone)]
pub struct SnapshotCache {
    store: Arc<dyn LocalStore>,
}

impl SnapshotCache {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// The cached list under `key`; empty when absent or unreadable.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(key, error = %err, "local cache read failed");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(err) => {
                warn!(key, error = %err, "discarding unreadable cache snapshot");
                Vec::new()
            }
        }
    }

    /// Overwrites the snapshot under `key`.
    pub async fn write<T: Serialize>(&self, key: &str, items: &[T]) {
        let raw = match serde_json::to_string(items) {
            Ok(raw) => raw,
            Err(err) => {
                error!(key, error = %err, "could not encode cache snapshot");
                return;
            }
        };
        match self.store.set(key, raw).await {
            Ok(()) => debug!(key, len = items.len(), "cache snapshot written"),
            Err(err) => error!(key, error = %err, "local cache write failed"),
        }
    }

    pub async fn clear(&self, key: &str) {
        if let Err(err) = self.store.remove(key).await {
            error!(key, error = %err, "local cache remove failed");
        }
    }

    /// Raw string value, used for small settings such as the forum selection.
    pub async fn get_string(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "local cache read failed");
                None
            }
        }
    }

    pub async fn set_string(&self, key: &str, value: &str) {
        if let Err(err) = self.store.set(key, value.to_string()).await {
            error!(key, error = %err, "local cache write failed");
        }
    }
}
