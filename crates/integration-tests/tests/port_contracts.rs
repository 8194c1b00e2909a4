//! Behaviour every `DocumentStore` must share, plus the exact calls the
//! repositories make through the port.

use std::sync::Arc;

use hq_core::document::field;
use hq_core::{
    DocumentStore, GameTag, MockDocumentStore, MockLocalStore, StoreError, WriteBatch, WriteOp,
};
use hq_store_memory::MemoryDocumentStore;
use hq_sync::{ForumRepository, Session, SnapshotCache};
use integration_tests::forum_user;
use serde_json::json;

async fn check_document_store(store: Arc<dyn DocumentStore>) {
    store.set("users", "gi-1", json!({ "id": "gi-1", "characters": {} })).await.unwrap();
    store
        .update("users", "gi-1", field("characters.xiao", json!({ "status": "Built" })))
        .await
        .unwrap();
    let doc = store.get("users", "gi-1").await.unwrap().unwrap();
    assert_eq!(doc.body["characters"]["xiao"]["status"], "Built");

    let missing = store.update("users", "gi-2", field("name", json!("x"))).await;
    assert!(matches!(missing, Err(StoreError::NotFound { .. })));

    let mut batch = WriteBatch::new();
    batch
        .delete("users", "gi-1")
        .update("users", "gi-404", field("name", json!("x")));
    assert!(store.commit(batch).await.is_err());
    assert!(store.get("users", "gi-1").await.unwrap().is_some(), "failed batch must not apply");

    store.delete("users", "gi-1").await.unwrap();
    store.delete("users", "gi-1").await.unwrap();
    assert!(store.get_all("users").await.unwrap().is_empty());
}

#[tokio::test]
async fn memory_store_honours_the_contract() {
    check_document_store(Arc::new(MemoryDocumentStore::new())).await;
}

#[cfg(feature = "store-sqlite")]
#[tokio::test]
async fn sqlite_store_honours_the_contract() {
    let store = hq_store_sqlite::SqliteDocumentStore::new("sqlite::memory:").await.unwrap();
    check_document_store(Arc::new(store)).await;
}

#[tokio::test]
async fn delete_post_is_one_batch() {
    let mut remote = MockDocumentStore::new();
    remote.expect_set().times(1).returning(|_, _, _| Ok(()));
    remote.expect_get_all().returning(|_| Ok(vec![]));
    remote
        .expect_commit()
        .withf(|batch| {
            batch.len() == 1
                && matches!(&batch.ops()[0], WriteOp::Delete { collection, .. } if collection == "blog-posts")
        })
        .times(1)
        .returning(|_| Ok(()));

    let mut local = MockLocalStore::new();
    local.expect_set().returning(|_, _| Ok(()));

    let forum = ForumRepository::new(
        Arc::new(remote),
        SnapshotCache::new(Arc::new(local)),
        Arc::new(Session::new()),
    );
    let sam = forum_user("Sam", GameTag::Genshin);
    let post = forum.create_post(&sam, GameTag::Genshin, "t", "b").await.unwrap().into_inner();
    let removed = forum.delete_post(&sam, &post.id).await.unwrap();
    assert!(removed.is_synced());
    assert_eq!(removed.value, 0);
}

#[test]
fn cache_write_failure_never_surfaces() {
    let mut local = MockLocalStore::new();
    local.expect_set().returning(|_, _| Err(anyhow::anyhow!("disk full")));
    let cache = SnapshotCache::new(Arc::new(local));
    tokio_test::block_on(cache.write("genshin-users", &[json!({ "id": "gi-1" })]));
}
