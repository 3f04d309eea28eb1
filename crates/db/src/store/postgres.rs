//! PostgreSQL document store: one JSONB table per collection.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;

use super::{DocumentStore, StoreError};
use crate::collections::is_known_collection;
use crate::DbPool;

/// Stores each collection in a table of the same name with columns
/// `id BIGSERIAL`, `doc_key TEXT UNIQUE`, `body JSONB` and timestamps.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: DbPool,
}

impl PgDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Table names are interpolated into SQL, so only whitelisted collections
/// pass.
fn table(collection: &str) -> Result<&str, StoreError> {
    if is_known_collection(collection) {
        Ok(collection)
    } else {
        Err(StoreError::UnknownCollection(collection.to_string()))
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_one(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let table = table(collection)?;
        let sql = format!("SELECT body FROM {table} WHERE doc_key = $1");
        let row: Option<(Json<Value>,)> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(Json(body),)| body))
    }

    async fn find_many(&self, collection: &str, filter: &Value) -> Result<Vec<Value>, StoreError> {
        let table = table(collection)?;
        let sql = format!("SELECT body FROM {table} WHERE body @> $1 ORDER BY id");
        let rows: Vec<(Json<Value>,)> = sqlx::query_as(&sql)
            .bind(Json(filter))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(Json(body),)| body).collect())
    }

    async fn upsert(&self, collection: &str, key: &str, doc: &Value) -> Result<(), StoreError> {
        let table = table(collection)?;
        let sql = format!(
            "INSERT INTO {table} (doc_key, body) VALUES ($1, $2) \
             ON CONFLICT (doc_key) DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()"
        );
        sqlx::query(&sql)
            .bind(key)
            .bind(Json(doc))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert(&self, collection: &str, doc: &Value) -> Result<(), StoreError> {
        let table = table(collection)?;
        let sql = format!("INSERT INTO {table} (body) VALUES ($1)");
        sqlx::query(&sql).bind(Json(doc)).execute(&self.pool).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}
