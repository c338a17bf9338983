//! Application state with repository-based storage.
//!
//! This module defines the shared application state that is passed to all
//! request handlers. Handlers only see repository trait objects; the cached
//! decorator behind them owns the cache-aside read path and the write
//! invalidation path. Backend combinations are picked via feature flags.

use std::{sync::Arc, time::Duration, time::Instant};

use feedcache_core::storage::{AuthorRepository, PostRepository};

use crate::{config::Config, middleware::RateLimiter};

/// Shared application state.
///
/// This is cloned for each request handler. Clients are built once at
/// startup and dropped with the last clone on shutdown.
#[derive(Clone)]
pub struct AppState {
    /// Post repository (cached, wraps underlying storage).
    pub post_repo: Arc<dyn PostRepository>,
    /// Author repository (same decorator, authors are passed through).
    pub author_repo: Arc<dyn AuthorRepository>,
    /// Per-client request limiter shared by every route.
    pub rate_limiter: RateLimiter,
    /// Allowed CORS origin, `*` for any.
    pub allowed_origin: String,
    /// Feed size used when a read names no limit.
    pub feed_limit: u32,
    started_at: Instant,
}

impl AppState {
    /// Creates a new AppState with the given repositories and configuration.
    pub(crate) fn build(
        post_repo: Arc<dyn PostRepository>,
        author_repo: Arc<dyn AuthorRepository>,
        config: &Config,
    ) -> Self {
        Self {
            post_repo,
            author_repo,
            rate_limiter: RateLimiter::new(config.rate_limit_window(), config.rate_limit_max),
            allowed_origin: config.frontend_url.clone(),
            feed_limit: config.feed_limit,
            started_at: Instant::now(),
        }
    }

    /// Time since the state was built.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Inserts the demo authors, posts and likes.
    ///
    /// Writes go through the cached repository, so any feed cached before
    /// seeding is invalidated like for any other write.
    #[cfg(feature = "inmemory")]
    pub async fn seed_demo_data(&self) -> Result<(), anyhow::Error> {
        let data = crate::mock_data::generate_demo_data(chrono::Utc::now());

        for author in &data.authors {
            self.author_repo.create_author(author).await?;
        }
        for post in &data.posts {
            self.post_repo.create_post(post).await?;
        }
        for (post_id, liker_id) in &data.likes {
            self.post_repo.like_post(*post_id, *liker_id).await?;
        }

        tracing::info!(
            authors = data.authors.len(),
            posts = data.posts.len(),
            likes = data.likes.len(),
            "Seeded demo data"
        );
        Ok(())
    }
}

/// Builds the Redis cache and tries to connect once.
///
/// An unreachable server is not fatal: the cached repository treats every
/// failed cache call as a miss, and the connection is retried on later calls.
#[cfg(feature = "redis")]
async fn connect_redis(config: &Config) -> Result<crate::cache::RedisCache, anyhow::Error> {
    let cache = crate::cache::RedisCache::new(&config.redis_url)?;

    match tokio::time::timeout(config.cache_timeout(), cache.connect()).await {
        Ok(Ok(())) => tracing::info!("Connected to Redis"),
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "Redis unreachable, serving feeds from the store")
        }
        Err(_) => tracing::warn!("Redis connection timed out, serving feeds from the store"),
    }

    Ok(cache)
}

// ============================================================================
// Factory functions for different backend combinations
// ============================================================================

#[cfg(all(feature = "sqlite", feature = "memory"))]
mod sqlite_memory {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::storage::cached::CachedPostRepository;
    use crate::storage::SqliteRepository;

    impl AppState {
        /// Creates AppState with SQLite storage and in-memory cache.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            let sqlite_repo = Arc::new(SqliteRepository::new(&config.sqlite_path).await?);
            let memory_cache = Arc::new(MemoryCache::new(config.cache_max_entries));

            let cached_repo = Arc::new(
                CachedPostRepository::new(sqlite_repo, memory_cache, config.cache_ttl())
                    .with_timeouts(config.cache_timeout(), config.store_timeout()),
            );

            Ok(Self::build(cached_repo.clone(), cached_repo, config))
        }
    }
}

#[cfg(all(feature = "sqlite", feature = "redis"))]
mod sqlite_redis {
    use super::*;
    use crate::storage::cached::CachedPostRepository;
    use crate::storage::SqliteRepository;

    impl AppState {
        /// Creates AppState with SQLite storage and Redis cache.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            let sqlite_repo = Arc::new(SqliteRepository::new(&config.sqlite_path).await?);
            let redis_cache = Arc::new(super::connect_redis(config).await?);

            let cached_repo = Arc::new(
                CachedPostRepository::new(sqlite_repo, redis_cache, config.cache_ttl())
                    .with_timeouts(config.cache_timeout(), config.store_timeout()),
            );

            Ok(Self::build(cached_repo.clone(), cached_repo, config))
        }
    }
}

#[cfg(all(feature = "inmemory", feature = "memory"))]
mod inmemory_memory {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::storage::cached::CachedPostRepository;
    use crate::storage::InMemoryRepository;

    impl AppState {
        /// Creates AppState with in-memory storage and cache.
        /// Useful for testing without any external dependencies.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            Ok(Self::inmemory(config))
        }

        fn inmemory(config: &Config) -> Self {
            let inmemory_repo = Arc::new(InMemoryRepository::new());
            let memory_cache = Arc::new(MemoryCache::new(config.cache_max_entries));

            let cached_repo = Arc::new(
                CachedPostRepository::new(inmemory_repo, memory_cache, config.cache_ttl())
                    .with_timeouts(config.cache_timeout(), config.store_timeout()),
            );

            Self::build(cached_repo.clone(), cached_repo, config)
        }
    }

    #[cfg(test)]
    impl Default for AppState {
        /// Creates an AppState with in-memory storage and default config.
        fn default() -> Self {
            Self::inmemory(&Config::default())
        }
    }
}

#[cfg(all(feature = "inmemory", feature = "redis"))]
mod inmemory_redis {
    use super::*;
    use crate::storage::cached::CachedPostRepository;
    use crate::storage::InMemoryRepository;

    impl AppState {
        /// Creates AppState with in-memory storage and Redis cache.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            let inmemory_repo = Arc::new(InMemoryRepository::new());
            let redis_cache = Arc::new(super::connect_redis(config).await?);

            let cached_repo = Arc::new(
                CachedPostRepository::new(inmemory_repo, redis_cache, config.cache_ttl())
                    .with_timeouts(config.cache_timeout(), config.store_timeout()),
            );

            Ok(Self::build(cached_repo.clone(), cached_repo, config))
        }
    }
}


#[cfg(all(test, feature = "inmemory", feature = "redis"))]
mod redis_tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unreachable_redis_still_serves_feeds() {
        let config = Config {
            redis_url: "redis://127.0.0.1:1".to_string(),
            ..Config::default()
        };

        let state = AppState::new(&config).await.unwrap();
        state.seed_demo_data().await.unwrap();
        let app = crate::app::create_app(state);

        let response = app
            .oneshot(Request::builder().uri("/posts").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let feed: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(feed.len(), 6);
    }
}
