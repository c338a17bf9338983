//! Cached repository decorator.
//!
//! Wraps a repository with the cache-aside protocol:
//!
//! - **Reads**: look the feed up in the cache; on anything but a clean hit,
//!   query the store and write the result back with a TTL
//! - **Writes**: commit to the store, then delete every cached feed the
//!   write made stale
//!
//! Cache failures never fail a request. They are logged and the entry is
//! left for its TTL to expire.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let repo = Arc::new(SqliteRepository::new("feedcache.db").await?);
//! let cache = Arc::new(MemoryCache::new(10_000));
//!
//! let cached_repo = CachedPostRepository::new(repo, cache, Duration::from_secs(300));
//! ```

mod post;

pub use post::CachedPostRepository;
