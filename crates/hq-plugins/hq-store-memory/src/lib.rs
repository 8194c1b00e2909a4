//! # hq-store-memory
//!
//! In-process implementations of `DocumentStore` and `LocalStore`.
//! Used for development runs without a database and as the test double for
//! repository scenarios: faults can be injected to simulate permission
//! denials or an unreachable backend.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use hq_core::document::apply_update;
use hq_core::{Document, DocumentStore, LocalStore, StoreError, StoreResult, WriteBatch, WriteOp};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

type Collections = HashMap<String, BTreeMap<String, Value>>;

#[derive(Debug, Clone)]
struct Fault {
    error: StoreError,
    reads: bool,
}

#[derive(Default)]
struct Inner {
    collections: Collections,
    fault: Option<Fault>,
}

impl Inner {
    fn check(&self, is_read: bool) -> StoreResult<()> {
        match &self.fault {
            Some(fault) if !is_read || fault.reads => Err(fault.error.clone()),
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<Inner>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent operation fails with `error`.
    pub async fn fail_all(&self, error: StoreError) {
        self.inner.write().await.fault = Some(Fault { error, reads: true });
    }

    /// Reads keep working; every write fails with `error`.
    pub async fn fail_writes(&self, error: StoreError) {
        self.inner.write().await.fault = Some(Fault { error, reads: false });
    }

    pub async fn heal(&self) {
        self.inner.write().await.fault = None;
    }

    /// Inserts a document directly, bypassing any injected fault.
    pub async fn seed(&self, collection: &str, id: &str, body: Value) {
        self.inner
            .write()
            .await
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), body);
    }

    /// Snapshot of one collection, bypassing any injected fault.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.inner
            .read()
            .await
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, body)| Document { id: id.clone(), body: body.clone() })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn apply(collections: &mut Collections, op: WriteOp) -> StoreResult<()> {
    match op {
        WriteOp::Set { collection, id, body } => {
            collections.entry(collection).or_default().insert(id, body);
        }
        WriteOp::Update { collection, id, fields } => {
            let doc = collections
                .get_mut(&collection)
                .and_then(|docs| docs.get_mut(&id))
                .ok_or(StoreError::NotFound { collection, id })?;
            apply_update(doc, &fields)?;
        }
        WriteOp::Delete { collection, id } => {
            if let Some(docs) = collections.get_mut(&collection) {
                docs.remove(&id);
            }
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.inner.read().await.check(true)?;
        Ok(self.documents(collection).await)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let inner = self.inner.read().await;
        inner.check(true)?;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|body| Document { id: id.to_string(), body: body.clone() }))
    }

    async fn set(&self, collection: &str, id: &str, body: Value) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.set(collection, id, body);
        self.commit(batch).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.update(collection, id, fields);
        self.commit(batch).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete(collection, id);
        self.commit(batch).await
    }

    /// Applies the batch to a copy and swaps it in only if every op succeeded.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.check(false)?;
        let mut staged = inner.collections.clone();
        for op in batch {
            apply(&mut staged, op)?;
        }
        inner.collections = staged;
        Ok(())
    }
}

/// `LocalStore` kept in a map; lost when the process exits.
#[derive(Default)]
pub struct MemoryLocalStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> anyhow::Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
