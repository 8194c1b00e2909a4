//! # hq-store-sqlite
//!
//! SQLite implementation of `DocumentStore`. Every document lives in a single
//! table keyed by `(collection, id)` with its body stored as JSON text.

use std::str::FromStr;

use async_trait::async_trait;
use hq_core::document::apply_update;
use hq_core::{Document, DocumentStore, StoreError, StoreResult, WriteBatch, WriteOp};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{debug, info, warn};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,
    body       TEXT NOT NULL,
    PRIMARY KEY (collection, id)
)";

// Primary SQLite result codes that mean "not allowed" rather than "broken".
const SQLITE_PERM: i32 = 3;
const SQLITE_READONLY: i32 = 8;
const SQLITE_AUTH: i32 = 23;

pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Opens (or creates) the database at `url` and ensures the schema.
    ///
    /// In-memory URLs get a single long-lived connection, otherwise each pooled
    /// connection would see its own empty database.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let mut pool = SqlitePoolOptions::new();
        if url.contains(":memory:") {
            pool = pool.max_connections(1).idle_timeout(None).max_lifetime(None);
        }
        let pool = pool.connect_with(options).await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        info!(url, "sqlite document store ready");
        Ok(Self { pool })
    }
}

fn db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        let primary = db.code().and_then(|c| c.parse::<i32>().ok()).map(|c| c & 0xff);
        if matches!(primary, Some(SQLITE_PERM | SQLITE_READONLY | SQLITE_AUTH)) {
            return StoreError::PermissionDenied(db.message().to_string());
        }
    }
    StoreError::Unavailable(err.to_string())
}

async fn read_body(conn: &mut SqliteConnection, collection: &str, id: &str) -> StoreResult<Option<Value>> {
    let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND id = ?")
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error)?;
    match row {
        Some(row) => {
            let raw: String = row.try_get("body").map_err(db_error)?;
            Ok(Some(serde_json::from_str(&raw)?))
        }
        None => Ok(None),
    }
}

async fn write_body(conn: &mut SqliteConnection, collection: &str, id: &str, body: &Value) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)
         ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body",
    )
    .bind(collection)
    .bind(id)
    .bind(body.to_string())
    .execute(&mut *conn)
    .await
    .map_err(db_error)?;
    Ok(())
}

async fn apply_op(conn: &mut SqliteConnection, op: WriteOp) -> StoreResult<()> {
    match op {
        WriteOp::Set { collection, id, body } => write_body(conn, &collection, &id, &body).await,
        WriteOp::Update { collection, id, fields } => {
            let Some(mut body) = read_body(conn, &collection, &id).await? else {
                return Err(StoreError::NotFound { collection, id });
            };
            apply_update(&mut body, &fields)?;
            write_body(conn, &collection, &id, &body).await
        }
        WriteOp::Delete { collection, id } => {
            sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
                .bind(&collection)
                .bind(&id)
                .execute(&mut *conn)
                .await
                .map_err(db_error)?;
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let rows = sqlx::query("SELECT id, body FROM documents WHERE collection = ? ORDER BY id")
            .bind(collection)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(db_error)?;
            let raw: String = row.try_get("body").map_err(db_error)?;
            match serde_json::from_str(&raw) {
                Ok(body) => docs.push(Document { id, body }),
                Err(err) => warn!(collection, id = %id, error = %err, "skipping row with unreadable body"),
            }
        }
        Ok(docs)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        let body = read_body(&mut conn, collection, id).await?;
        Ok(body.map(|body| Document { id: id.to_string(), body }))
    }

    async fn set(&self, collection: &str, id: &str, body: Value) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        write_body(&mut conn, collection, id, &body).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.update(collection, id, fields);
        self.commit(batch).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        apply_op(&mut conn, WriteOp::Delete { collection: collection.into(), id: id.into() }).await
    }

    /// Runs every op in one transaction; the first failure rolls back all of
    /// them.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let ops = batch.len();
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        for op in batch {
            apply_op(&mut tx, op).await?;
        }
        tx.commit().await.map_err(db_error)?;
        debug!(ops, "batch committed");
        Ok(())
    }
}
