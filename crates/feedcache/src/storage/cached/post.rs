//! Cached post repository decorator.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use feedcache_core::cache::{
    decode_feed, encode_feed, feed_key, invalidation_patterns, Cache, CacheError, CacheLookup,
    Mutation, Result as CacheResult,
};
use feedcache_core::post::{Author, FeedQuery, Post, PostSummary};
use feedcache_core::storage::{AuthorRepository, PostRepository, RepositoryError, Result};

/// Default bound on a single cache call.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Cached post repository decorator.
///
/// Feeds are cached under a key derived from the [`FeedQuery`]. Writes are
/// forwarded to the underlying repository first; only once the store
/// reports success are the affected feed collections deleted from the cache.
///
/// Every call to the cache and to the store is bounded by a timeout. A cache
/// call that times out counts as an unavailable cache; a store call that
/// times out fails with [`RepositoryError::Timeout`].
///
/// # Type Parameters
///
/// * `R` - The underlying repository implementation
/// * `C` - The cache implementation
pub struct CachedPostRepository<R, C>
where
    R: PostRepository,
    C: Cache,
{
    repository: Arc<R>,
    cache: Arc<C>,
    ttl: Duration,
    cache_timeout: Duration,
    store_timeout: Duration,
}

impl<R, C> CachedPostRepository<R, C>
where
    R: PostRepository,
    C: Cache,
{
    /// Creates a new cached repository with default timeouts.
    ///
    /// # Arguments
    ///
    /// * `repository` - The underlying repository to cache
    /// * `cache` - The cache implementation
    /// * `ttl` - Time-to-live for cached feeds, fixed at write time
    pub fn new(repository: Arc<R>, cache: Arc<C>, ttl: Duration) -> Self {
        Self {
            repository,
            cache,
            ttl,
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Overrides the per-call timeouts.
    pub fn with_timeouts(mut self, cache_timeout: Duration, store_timeout: Duration) -> Self {
        self.cache_timeout = cache_timeout;
        self.store_timeout = store_timeout;
        self
    }

    async fn within_cache<T, F>(&self, fut: F) -> CacheResult<T>
    where
        F: Future<Output = CacheResult<T>>,
    {
        tokio::time::timeout(self.cache_timeout, fut)
            .await
            .unwrap_or(Err(CacheError::Timeout(self.cache_timeout)))
    }

    async fn within_store<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "Store operation timed out"
                );
                Err(RepositoryError::Timeout(self.store_timeout))
            }
        }
    }

    async fn lookup(&self, key: &str) -> CacheLookup<Vec<PostSummary>> {
        let raw = self.within_cache(self.cache.get(key)).await;
        CacheLookup::resolve(raw, decode_feed)
    }

    /// Writes a fresh result set back to the cache. Best effort.
    async fn populate(&self, key: &str, items: &[PostSummary]) {
        let bytes = match encode_feed(items) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "Failed to encode feed for caching");
                return;
            }
        };

        if let Err(err) = self
            .within_cache(self.cache.set(key, &bytes, Some(self.ttl)))
            .await
        {
            tracing::warn!(key = %key, error = %err, "Failed to cache feed");
        }
    }

    /// Deletes the feed collections made stale by a committed mutation.
    ///
    /// Failures are logged and swallowed; the stale entries expire with
    /// their TTL.
    async fn invalidate(&self, mutation: Mutation) {
        for pattern in invalidation_patterns(&mutation) {
            if let Err(err) = self
                .within_cache(self.cache.delete_pattern(&pattern))
                .await
            {
                tracing::warn!(
                    key = %pattern,
                    mutation = mutation.name(),
                    error = %err,
                    "Failed to invalidate feed cache"
                );
            }
        }
    }
}

#[async_trait]
impl<R, C> PostRepository for CachedPostRepository<R, C>
where
    R: PostRepository + 'static,
    C: Cache + 'static,
{
    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<PostSummary>> {
        let key = feed_key(query);

        let lookup = self.lookup(&key).await;
        let outcome = lookup.outcome();
        match lookup {
            CacheLookup::Hit(items) => {
                tracing::trace!(key = %key, outcome, count = items.len(), "Serving feed from cache");
                return Ok(items);
            }
            CacheLookup::Miss => {
                tracing::trace!(key = %key, outcome, "Reading feed from store");
            }
            CacheLookup::Unavailable(err) => {
                tracing::warn!(key = %key, outcome, error = %err, "Cache unavailable, reading feed from store");
            }
            CacheLookup::Corrupt(err) => {
                tracing::warn!(key = %key, outcome, error = %err, "Discarding undecodable cached feed");
            }
        }

        let items = self
            .within_store("list_feed", self.repository.list_feed(query))
            .await?;

        self.populate(&key, &items).await;

        Ok(items)
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        self.within_store("get_post", self.repository.get_post(id))
            .await
    }

    async fn create_post(&self, post: &Post) -> Result<()> {
        self.within_store("create_post", self.repository.create_post(post))
            .await?;

        self.invalidate(Mutation::created(post)).await;

        tracing::debug!(post_id = %post.id, author_id = %post.author_id, "Post created");
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> Result<Post> {
        let post = self
            .within_store("delete_post", self.repository.delete_post(id))
            .await?;

        self.invalidate(Mutation::deleted(&post)).await;

        tracing::debug!(post_id = %id, author_id = %post.author_id, "Post deleted");
        Ok(post)
    }

    async fn like_post(&self, post_id: Uuid, author_id: Uuid) -> Result<Post> {
        let post = self
            .within_store("like_post", self.repository.like_post(post_id, author_id))
            .await?;

        self.invalidate(Mutation::liked(&post)).await;

        tracing::debug!(%post_id, liked_by = %author_id, "Post liked");
        Ok(post)
    }
}

/// Authors are not cached; calls are forwarded with the store timeout.
#[async_trait]
impl<R, C> AuthorRepository for CachedPostRepository<R, C>
where
    R: PostRepository + AuthorRepository + 'static,
    C: Cache + 'static,
{
    async fn get_author(&self, id: Uuid) -> Result<Option<Author>> {
        self.within_store("get_author", self.repository.get_author(id))
            .await
    }

    async fn create_author(&self, author: &Author) -> Result<()> {
        self.within_store("create_author", self.repository.create_author(author))
            .await
    }
}
