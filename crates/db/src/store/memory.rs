//! In-process document store for tests and local runs.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{json_contains, DocumentStore, StoreError};
use crate::collections::is_known_collection;

#[derive(Default)]
struct MemoryCollection {
    /// Documents in insertion order, with their key when keyed.
    rows: Vec<(Option<String>, Value)>,
    by_key: HashMap<String, usize>,
}

/// Document store backed by process memory.
///
/// Supports fault injection: [`fail_collection`](Self::fail_collection)
/// makes every operation on a collection return [`StoreError::Unavailable`],
/// and [`set_latency`](Self::set_latency) delays every operation.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
    failing: Mutex<HashSet<String>>,
    latency: Mutex<Option<Duration>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated failure for `collection`.
    pub fn fail_collection(&self, collection: &str, failing: bool) {
        let mut set = self.failing.lock().unwrap_or_else(|e| e.into_inner());
        if failing {
            set.insert(collection.to_string());
        } else {
            set.remove(collection);
        }
    }

    /// Delay every subsequent operation by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |c| c.rows.len())
    }

    async fn check(&self, collection: &str) -> Result<(), StoreError> {
        if !is_known_collection(collection) {
            return Err(StoreError::UnknownCollection(collection.to_string()));
        }
        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(collection);
        if failing {
            return Err(StoreError::Unavailable(format!(
                "simulated failure on {collection}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_one(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        self.check(collection).await?;
        let guard = self.collections.read().await;
        Ok(guard.get(collection).and_then(|c| {
            c.by_key
                .get(key)
                .and_then(|&idx| c.rows.get(idx))
                .map(|(_, doc)| doc.clone())
        }))
    }

    async fn find_many(&self, collection: &str, filter: &Value) -> Result<Vec<Value>, StoreError> {
        self.check(collection).await?;
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .map(|c| {
                c.rows
                    .iter()
                    .filter(|(_, doc)| json_contains(doc, filter))
                    .map(|(_, doc)| doc.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn upsert(&self, collection: &str, key: &str, doc: &Value) -> Result<(), StoreError> {
        self.check(collection).await?;
        let mut guard = self.collections.write().await;
        let coll = guard.entry(collection.to_string()).or_default();
        match coll.by_key.get(key) {
            Some(&idx) => coll.rows[idx].1 = doc.clone(),
            None => {
                coll.rows.push((Some(key.to_string()), doc.clone()));
                coll.by_key.insert(key.to_string(), coll.rows.len() - 1);
            }
        }
        Ok(())
    }

    async fn insert(&self, collection: &str, doc: &Value) -> Result<(), StoreError> {
        self.check(collection).await?;
        let mut guard = self.collections.write().await;
        guard
            .entry(collection.to_string())
            .or_default()
            .rows
            .push((None, doc.clone()));
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
