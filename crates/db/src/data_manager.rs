//! Cache-aside reads and store-then-invalidate writes.
//!
//! Reads check `{collection}:{key}` in the cache, fall back to the document
//! store and repopulate the cache best-effort. Writes go to the store first
//! and then delete the cache entry; the cache is never overwritten with a
//! new value directly, so a slow writer cannot plant a stale entry over a
//! newer one. Every store call is bounded by the configured timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStore;
use crate::collections;
use crate::store::{DocumentStore, StoreError};

/// Cache TTL per collection.
#[derive(Debug, Clone)]
pub struct CacheTtls {
    pub phone_mapping: Duration,
    pub user_config: Duration,
    pub notification_categories: Duration,
    pub citizens: Duration,
}

impl CacheTtls {
    pub fn for_collection(&self, collection: &str) -> Duration {
        match collection {
            collections::PHONE_MAPPING => self.phone_mapping,
            collections::USER_CONFIG => self.user_config,
            collections::NOTIFICATION_CATEGORIES => self.notification_categories,
            collections::CITIZENS => self.citizens,
            _ => self.user_config,
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            phone_mapping: Duration::from_secs(3600),
            user_config: Duration::from_secs(3600),
            notification_categories: Duration::from_secs(3600),
            citizens: Duration::from_secs(3 * 3600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataManagerConfig {
    /// Deadline for every document store operation.
    pub store_timeout: Duration,
    pub ttls: CacheTtls,
}

impl Default for DataManagerConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            ttls: CacheTtls::default(),
        }
    }
}

/// Cache key for a document or a named query in `collection`.
pub fn cache_key(collection: &str, key: &str) -> String {
    format!("{collection}:{key}")
}

#[derive(Clone)]
pub struct DataManager {
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn CacheStore>,
    config: DataManagerConfig,
}

impl DataManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<dyn CacheStore>,
        config: DataManagerConfig,
    ) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Read a document by primary key.
    ///
    /// Returns [`StoreError::DocumentNotFound`] when the store has no such
    /// document. Cache failures degrade to a store read; a store timeout is
    /// a hard error.
    pub async fn read<T: DeserializeOwned>(
        &self,
        collection: &'static str,
        key: &str,
    ) -> Result<T, StoreError> {
        let ck = cache_key(collection, key);
        if let Some(value) = self.cached::<T>(&ck).await {
            return Ok(value);
        }

        let doc = self
            .bounded("find_one", self.store.find_one(collection, key))
            .await?
            .ok_or_else(|| StoreError::DocumentNotFound {
                collection,
                key: key.to_string(),
            })?;

        self.populate(&ck, &doc, collection).await;
        Ok(serde_json::from_value(doc)?)
    }

    /// Like [`read`](Self::read) but maps not-found to `None`.
    pub async fn read_optional<T: DeserializeOwned>(
        &self,
        collection: &'static str,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        match self.read(collection, key).await {
            Ok(value) => Ok(Some(value)),
            Err(StoreError::DocumentNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Cache-aside read of a list query, cached under
    /// `{collection}:{query_name}`. Invalidate it with
    /// [`invalidate`](Self::invalidate) whenever the collection changes.
    pub async fn read_query<T: DeserializeOwned>(
        &self,
        collection: &'static str,
        query_name: &str,
        filter: &Value,
    ) -> Result<Vec<T>, StoreError> {
        let ck = cache_key(collection, query_name);
        if let Some(values) = self.cached::<Vec<T>>(&ck).await {
            return Ok(values);
        }

        let docs = self
            .bounded("find_many", self.store.find_many(collection, filter))
            .await?;
        let list = Value::Array(docs);
        self.populate(&ck, &list, collection).await;
        Ok(serde_json::from_value(list)?)
    }

    /// Uncached scan of `collection` for documents containing `filter`.
    pub async fn find_many<T: DeserializeOwned>(
        &self,
        collection: &'static str,
        filter: &Value,
    ) -> Result<Vec<T>, StoreError> {
        let docs = self
            .bounded("find_many", self.store.find_many(collection, filter))
            .await?;
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Upsert a document, then invalidate its cache entry.
    ///
    /// A store failure (including timeout) is returned and the cache is left
    /// alone. A timed-out write may still have been applied.
    pub async fn write<T: Serialize>(
        &self,
        collection: &'static str,
        key: &str,
        doc: &T,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(doc)?;
        self.bounded("upsert", self.store.upsert(collection, key, &value))
            .await?;
        self.invalidate(collection, key).await;
        Ok(())
    }

    /// Append an unkeyed document. Nothing is cached for appends.
    pub async fn append<T: Serialize>(
        &self,
        collection: &'static str,
        doc: &T,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(doc)?;
        self.bounded("insert", self.store.insert(collection, &value))
            .await
    }

    /// Delete a cache entry. Failures are logged and swallowed.
    pub async fn invalidate(&self, collection: &str, key: &str) {
        let ck = cache_key(collection, key);
        if let Err(e) = self.cache.delete(&ck).await {
            tracing::warn!(cache_key = %ck, error = %e, "Cache invalidation failed");
        }
    }

    /// Reachability of the document store.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.bounded("ping", self.store.ping()).await
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn bounded<R>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<R, StoreError>>,
    ) -> Result<R, StoreError> {
        match tokio::time::timeout(self.config.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(operation, timeout = ?self.config.store_timeout, "Store operation timed out");
                Err(StoreError::Timeout { operation })
            }
        }
    }

    /// Cached value for `ck`, or `None` on miss, cache error or an entry
    /// that no longer deserializes (which is evicted).
    async fn cached<T: DeserializeOwned>(&self, ck: &str) -> Option<T> {
        match self.cache.get(ck).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    tracing::debug!(cache_key = %ck, "Cache hit");
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!(cache_key = %ck, error = %e, "Evicting undecodable cache entry");
                    if let Err(e) = self.cache.delete(ck).await {
                        tracing::warn!(cache_key = %ck, error = %e, "Cache eviction failed");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(cache_key = %ck, error = %e, "Cache read failed, falling back to store");
                None
            }
        }
    }

    async fn populate(&self, ck: &str, value: &Value, collection: &str) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(cache_key = %ck, error = %e, "Cache serialization failed");
                return;
            }
        };
        let ttl = self.config.ttls.for_collection(collection);
        if let Err(e) = self.cache.set(ck, raw, ttl).await {
            tracing::warn!(cache_key = %ck, error = %e, "Cache population failed");
        }
    }
}
