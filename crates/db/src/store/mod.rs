//! Durable document storage.
//!
//! A collection holds JSON documents, optionally addressed by a unique
//! primary key. Keyed documents are written with upsert semantics; unkeyed
//! documents (the audit trail) are appended and read back in insertion
//! order.

mod memory;
mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The distinguished not-found: callers branch on this to provision
    /// defaults instead of failing.
    #[error("Document not found in {collection}: {key}")]
    DocumentNotFound {
        collection: &'static str,
        key: String,
    },

    #[error("Store operation timed out: {operation}")]
    Timeout { operation: &'static str },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by primary key.
    async fn find_one(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Fetch every document containing `filter` (JSON containment, as in
    /// PostgreSQL `@>`), in insertion order. An empty object matches all.
    async fn find_many(&self, collection: &str, filter: &Value) -> Result<Vec<Value>, StoreError>;

    /// Insert or replace the document stored under `key`.
    async fn upsert(&self, collection: &str, key: &str, doc: &Value) -> Result<(), StoreError>;

    /// Append an unkeyed document.
    async fn insert(&self, collection: &str, doc: &Value) -> Result<(), StoreError>;

    /// Verify the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// JSON containment: every member of `filter` appears in `doc`.
///
/// Objects match when each filter key is present with a contained value,
/// arrays when each filter element is contained in some document element,
/// scalars on equality.
pub fn json_contains(doc: &Value, filter: &Value) -> bool {
    match (doc, filter) {
        (Value::Object(d), Value::Object(f)) => f
            .iter()
            .all(|(k, fv)| d.get(k).is_some_and(|dv| json_contains(dv, fv))),
        (Value::Array(d), Value::Array(f)) => {
            f.iter().all(|fv| d.iter().any(|dv| json_contains(dv, fv)))
        }
        (d, f) => d == f,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn containment_matches_nested_subsets() {
        let doc = json!({"cpf": "03561350712", "status": "active", "tags": ["a", "b"]});
        assert!(json_contains(&doc, &json!({})));
        assert!(json_contains(&doc, &json!({"status": "active"})));
        assert!(json_contains(&doc, &json!({"tags": ["b"]})));
        assert!(!json_contains(&doc, &json!({"status": "quarantined"})));
        assert!(!json_contains(&doc, &json!({"missing": null})));
    }
}
