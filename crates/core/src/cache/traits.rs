use std::time::Duration;

use async_trait::async_trait;

use super::Result;

/// Key-value cache with expiry.
///
/// Every operation is atomic per key. `get` reports an absent or expired key
/// as `Ok(None)`, never as an empty value. `delete` and `delete_pattern` are
/// idempotent.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a value from the cache by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Sets a value in the cache with an optional TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Deletes a value from the cache by key.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Deletes all values matching a pattern (e.g., "feed:published:*").
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;
}
