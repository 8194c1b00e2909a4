//! JSON bodies returned by the routes.

use hq_core::ErrorClass;
use hq_sync::{LoadFailure, Loaded, Notice, Source, Synced};
use serde::Serialize;

/// A mutation result: the locally applied value and what the remote said.
#[derive(Debug, Serialize)]
pub struct SyncedBody<T> {
    pub value: T,
    pub synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<ErrorClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl<T> From<Synced<T>> for SyncedBody<T> {
    fn from(synced: Synced<T>) -> Self {
        Self {
            synced: synced.is_synced(),
            error_class: synced.remote_error.as_ref().map(|e| e.class()),
            remote_error: synced.remote_error.map(|e| e.to_string()),
            notice: synced.notice,
            value: synced.value,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoadBody<T> {
    pub items: Vec<T>,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<LoadFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl<T> From<Loaded<T>> for LoadBody<T> {
    fn from(loaded: Loaded<T>) -> Self {
        Self {
            notice: loaded.notice(),
            items: loaded.items,
            source: loaded.source,
            failure: loaded.failure,
        }
    }
}
