//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreResult;

/// A stored JSON document together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

/// One write inside an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set { collection: String, id: String, body: Value },
    /// Partial update; keys may be dotted paths into nested objects.
    Update { collection: String, id: String, fields: Map<String, Value> },
    Delete { collection: String, id: String },
}

/// An all-or-nothing group of writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, collection: &str, id: &str, body: Value) -> &mut Self {
        self.ops.push(WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            body,
        });
        self
    }

    pub fn update(&mut self, collection: &str, id: &str, fields: Map<String, Value>) -> &mut Self {
        self.ops.push(WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
        self
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl IntoIterator for WriteBatch {
    type Item = WriteOp;
    type IntoIter = std::vec::IntoIter<WriteOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

/// Remote key-document persistence contract.
///
/// Any store offering these six operations satisfies the repositories.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in `collection`, in no particular order.
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Creates or replaces the whole document.
    async fn set(&self, collection: &str, id: &str, body: Value) -> StoreResult<()>;

    /// Merges `fields` into an existing document. Fails with `NotFound`
    /// when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> StoreResult<()>;

    /// Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Applies every op or none of them.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;
}

/// Durable string key-value storage on the local machine.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> anyhow::Result<()>;
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}
