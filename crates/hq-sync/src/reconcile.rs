//! Load-time reconciliation between the remote collection and the local
//! snapshot.

use hq_core::{ErrorClass, Keyed};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::SnapshotCache;
use crate::collection::Collection;
use crate::session::Notice;

/// Where a loaded list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Non-empty remote read; the cache was overwritten with it.
    Remote,
    /// Remote was empty, cache was not.
    Cache,
    /// Remote and cache were both empty.
    Empty,
    /// Remote failed, cache was not empty.
    CacheFallback,
    /// Remote failed and there was nothing cached.
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    pub class: ErrorClass,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub items: Vec<T>,
    pub source: Source,
    /// Set whenever the remote read failed.
    pub failure: Option<LoadFailure>,
}

impl<T> Loaded<T> {
    /// Notice for a degraded load: a banner on permission failure, an alert
    /// otherwise. Other sources produce none.
    pub fn notice(&self) -> Option<Notice> {
        match (&self.source, &self.failure) {
            (Source::Degraded, Some(f)) if f.class == ErrorClass::Permission => {
                Some(Notice::permission_banner())
            }
            (Source::Degraded, _) => Some(Notice::unreachable_alert()),
            _ => None,
        }
    }

    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Loaded<U> {
        Loaded {
            items: self.items.into_iter().map(f).collect(),
            source: self.source,
            failure: self.failure,
        }
    }
}

/// Remote first; the cache only answers when the remote is empty or failing.
pub async fn reconcile<T>(remote: &Collection<T>, cache: &SnapshotCache, key: &str) -> Loaded<T>
where
    T: Serialize + DeserializeOwned + Keyed,
{
    match remote.fetch_all().await {
        Ok(items) if !items.is_empty() => {
            cache.write(key, &items).await;
            info!(collection = remote.name(), count = items.len(), "loaded from remote");
            Loaded { items, source: Source::Remote, failure: None }
        }
        Ok(_) => {
            let cached: Vec<T> = cache.read(key).await;
            let source = if cached.is_empty() { Source::Empty } else { Source::Cache };
            info!(collection = remote.name(), count = cached.len(), ?source, "remote empty");
            Loaded { items: cached, source, failure: None }
        }
        Err(err) => {
            let failure = LoadFailure { class: err.class(), message: err.to_string() };
            let cached: Vec<T> = cache.read(key).await;
            let source = if cached.is_empty() { Source::Degraded } else { Source::CacheFallback };
            warn!(
                collection = remote.name(),
                error = %err,
                class = ?failure.class,
                ?source,
                "remote load failed"
            );
            Loaded { items: cached, source, failure: Some(failure) }
        }
    }
}
