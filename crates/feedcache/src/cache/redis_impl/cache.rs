//! Redis cache implementation.
//!
//! Feed keys are tracked in one Redis Set per collection
//! (`feed:published:_keys`, `feed:author:{id}:_keys`), so collection
//! invalidation is `SMEMBERS` + `DEL` and never needs `KEYS` or `SCAN`.
//!
//! Writing a value and tracking it happen in one `MULTI` block, and so do
//! deleting it and untracking it. No other client can run between the two
//! halves of either block, so a stored feed value is always tracked. A
//! `SET` that lands between `SMEMBERS` and the delete block is deleted with
//! the keys that were read.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use tokio::sync::OnceCell;

use feedcache_core::cache::{
    collection_of_key, collection_of_pattern, collection_tracking_key, pattern_matches, Cache,
    Result,
};

use super::error::map_redis_error;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(1);

/// Redis cache backend using a connection manager.
///
/// The connection is opened on first use rather than at construction, so a
/// Redis server that is down at startup only makes cache calls fail with
/// `CacheError::ConnectionFailed` until it comes back. A failed attempt is
/// retried by the next call; once open, the manager reconnects on its own.
pub struct RedisCache {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisCache {
    /// Creates a cache for `url` (e.g. "redis://localhost:6379") without
    /// connecting.
    ///
    /// # Errors
    ///
    /// Fails if `url` is not a valid Redis URL.
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
        })
    }

    /// Opens the connection now instead of on the first cache call.
    pub async fn connect(&self) -> Result<()> {
        self.connection().await.map(|_| ())
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        self.conn
            .get_or_try_init(|| async {
                ConnectionManager::new_with_config(self.client.clone(), manager_config())
                    .await
                    .map_err(map_redis_error)
            })
            .await
            .cloned()
    }
}

/// One quick retry when connecting; callers bound every call with their own
/// timeout and retry on the next call anyway.
fn manager_config() -> ConnectionManagerConfig {
    ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(CONNECTION_TIMEOUT)
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        let result: Option<Vec<u8>> = conn.get(key).await.map_err(map_redis_error)?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic();

        match ttl {
            Some(duration) => pipe.pset_ex(key, value, ttl_millis(duration)).ignore(),
            None => pipe.set(key, value).ignore(),
        };

        if let Some(collection) = collection_of_key(key) {
            let tracking_key = collection_tracking_key(collection);
            pipe.sadd(&tracking_key, key).ignore();
            if let Some(duration) = ttl {
                let millis = i64::try_from(ttl_millis(duration)).unwrap_or(i64::MAX);
                pipe.pexpire(&tracking_key, millis).ignore();
            }
        }

        let _: () = pipe.query_async(&mut conn).await.map_err(map_redis_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let tracking_key = collection_of_key(key).map(collection_tracking_key);

        let mut pipe = redis::pipe();
        pipe.atomic().del(key).ignore();
        if let Some(tracking_key) = &tracking_key {
            pipe.srem(tracking_key, key).ignore();
        }

        let _: () = pipe.query_async(&mut conn).await.map_err(map_redis_error)?;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        let Some(collection) = collection_of_pattern(pattern) else {
            // Only feed collections are tracked.
            tracing::debug!(pattern = %pattern, "Ignoring untracked cache pattern");
            return Ok(());
        };

        let tracking_key = collection_tracking_key(collection);
        let keys = self.tracked_matches(&tracking_key, pattern).await?;
        self.remove_tracked(&tracking_key, &keys).await
    }
}

impl RedisCache {
    /// Reads the tracked keys of a collection that match `pattern`.
    async fn tracked_matches(&self, tracking_key: &str, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        let tracked_keys: Vec<String> = conn
            .smembers(tracking_key)
            .await
            .map_err(map_redis_error)?;

        Ok(tracked_keys
            .into_iter()
            .filter(|k| pattern_matches(pattern, k))
            .collect())
    }

    /// Deletes `keys` and drops them from `tracking_key` in one `MULTI` block.
    async fn remove_tracked(&self, tracking_key: &str, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(keys)
            .ignore()
            .srem(tracking_key, keys)
            .ignore();

        let _: () = pipe.query_async(&mut conn).await.map_err(map_redis_error)?;
        Ok(())
    }
}
