//! Typed access to one remote collection.

use std::marker::PhantomData;
use std::sync::Arc;

use hq_core::document::field;
use hq_core::{DocumentStore, Keyed, StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned + Keyed,
{
    pub fn new(store: Arc<dyn DocumentStore>, name: &'static str) -> Self {
        Self { store, name, _marker: PhantomData }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Every decodable document. Documents that no longer match the model are
    /// skipped with a warning rather than failing the whole read.
    pub async fn fetch_all(&self) -> StoreResult<Vec<T>> {
        let docs = self.store.get_all(self.name).await?;
        let mut items = Vec::with_capacity(docs.len());
        for doc in docs {
            match serde_json::from_value::<T>(doc.body) {
                Ok(item) => items.push(item),
                Err(err) => warn!(collection = self.name, id = %doc.id, error = %err, "skipping malformed document"),
            }
        }
        Ok(items)
    }

    pub async fn fetch(&self, id: &str) -> StoreResult<Option<T>> {
        match self.store.get(self.name, id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc.body)?)),
            None => Ok(None),
        }
    }

    /// Creates or replaces the document for `item`.
    pub async fn put(&self, item: &T) -> StoreResult<()> {
        let body = encode(item)?;
        self.store.set(self.name, item.key(), body).await
    }

    pub async fn patch(&self, id: &str, fields: Map<String, Value>) -> StoreResult<()> {
        self.store.update(self.name, id, fields).await
    }

    /// Updates a single (possibly nested) field.
    pub async fn set_field<V: Serialize>(&self, id: &str, path: &str, value: &V) -> StoreResult<()> {
        let value = serde_json::to_value(value)?;
        self.patch(id, field(path, value)).await
    }

    pub async fn remove(&self, id: &str) -> StoreResult<()> {
        self.store.delete(self.name, id).await
    }
}

pub fn encode<T: Serialize>(item: &T) -> StoreResult<Value> {
    serde_json::to_value(item).map_err(StoreError::from)
}
