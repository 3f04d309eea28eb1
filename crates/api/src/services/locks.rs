//! Per-document write serialization.
//!
//! Read-modify-write sequences on one document (`{collection}:{key}`) hold
//! one of a fixed set of async mutexes, chosen by hashing the key. Two
//! different keys may share a shard; that only costs parallelism. Callers
//! hold at most one guard at a time, so cross-document sync never
//! deadlocks.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

/// Default shard count.
pub const DEFAULT_SHARDS: usize = 256;

#[derive(Clone)]
pub struct KeyLocks {
    shards: Arc<[Mutex<()>]>,
}

impl KeyLocks {
    pub fn new(shards: usize) -> Self {
        let shards: Vec<Mutex<()>> = (0..shards.max(1)).map(|_| Mutex::new(())).collect();
        Self {
            shards: shards.into(),
        }
    }

    /// Wait for exclusive access to the document `key` of `collection`.
    pub async fn lock(&self, collection: &str, key: &str) -> MutexGuard<'_, ()> {
        self.shards[self.shard_of(collection, key)].lock().await
    }

    fn shard_of(&self, collection: &str, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        collection.hash(&mut hasher);
        key.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }
}

impl Default for KeyLocks {
    fn default() -> Self {
        Self::new(DEFAULT_SHARDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_serialized() {
        let locks = KeyLocks::new(8);
        let guard = locks.lock("user_config", "03561350712").await;

        let contender = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = contender.lock("user_config", "03561350712").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should acquire after release")
            .unwrap();
    }

    #[test]
    fn shard_choice_is_stable() {
        let locks = KeyLocks::new(16);
        assert_eq!(
            locks.shard_of("phone_mapping", "5521999887766"),
            locks.shard_of("phone_mapping", "5521999887766")
        );
    }
}
