//! In-memory cache implementation with LRU eviction.
//!
//! Mirrors the Redis backend: every feed key is tracked under its collection
//! (`feed:published`, `feed:author:{id}`) so that `delete_pattern` on a
//! collection pattern only touches the keys of that collection.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use feedcache_core::cache::{
    collection_of_key, collection_of_pattern, pattern_matches, Cache, Result,
};

/// A single cache entry with optional expiration.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        Self { value, expires_at }
    }

    /// An entry is expired from the instant its deadline is reached.
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// In-memory cache with LRU eviction and lazy TTL expiry.
///
/// Expired entries are dropped when they are next read. Reads never extend
/// an entry's lifetime.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
    /// Maps a collection prefix to the keys cached under it.
    tracking: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

impl MemoryCache {
    /// Creates a cache holding at most `max_entries` values. A capacity of
    /// zero is raised to one.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
            tracking: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

/// Removes `keys` from the tracking set of their collection, dropping the
/// set once it is empty.
fn untrack(tracking: &mut HashMap<String, HashSet<String>>, keys: &[String]) {
    for key in keys {
        let Some(collection) = collection_of_key(key) else {
            continue;
        };
        if let Some(tracked) = tracking.get_mut(collection) {
            tracked.remove(key);
            if tracked.is_empty() {
                tracking.remove(collection);
            }
        }
    }
}

// Lock order is always `tracking` then `store`. Holding `tracking` across a
// store change keeps the two in step, so a `delete_pattern` never sees a
// stored value that is not tracked yet.
#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        {
            let mut store = self.store.write().await;
            match store.get(key) {
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: re-check under both locks, a concurrent `set` may have
        // replaced the entry in between.
        let mut tracking = self.tracking.write().await;
        let mut store = self.store.write().await;
        match store.peek(key).map(CacheEntry::is_expired) {
            Some(true) => {
                store.pop(key);
                untrack(&mut tracking, &[key.to_string()]);
                Ok(None)
            }
            Some(false) => Ok(store.peek(key).map(|entry| entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let mut tracking = self.tracking.write().await;
        let mut store = self.store.write().await;

        if let Some(collection) = collection_of_key(key) {
            tracking
                .entry(collection.to_string())
                .or_default()
                .insert(key.to_string());
        }

        let displaced = store.push(key.to_string(), CacheEntry::new(value.to_vec(), ttl));
        if let Some((evicted, _)) = displaced {
            // `push` also hands back the old value of `key` itself.
            if evicted != key {
                untrack(&mut tracking, &[evicted]);
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut tracking = self.tracking.write().await;
        let mut store = self.store.write().await;

        store.pop(key);
        untrack(&mut tracking, &[key.to_string()]);

        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        let mut tracking = self.tracking.write().await;
        let mut store = self.store.write().await;

        let keys_to_delete: Vec<String> = match collection_of_pattern(pattern) {
            Some(collection) => tracking
                .get(collection)
                .map(|keys| {
                    keys.iter()
                        .filter(|k| pattern_matches(pattern, k))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
            // Untracked pattern: scan the whole store.
            None => store
                .iter()
                .filter(|(key, _)| pattern_matches(pattern, key))
                .map(|(key, _)| key.clone())
                .collect(),
        };

        for key in &keys_to_delete {
            store.pop(key);
        }
        untrack(&mut tracking, &keys_to_delete);

        Ok(())
    }
}
