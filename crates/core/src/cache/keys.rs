//! Cache key derivation for feed reads.
//!
//! Keys are grouped into collections, one per [`FeedScope`]. Every limit
//! variant of a scope lives under the same collection prefix so that a write
//! can drop all of them at once:
//!
//! ```text
//! feed:published:top:50
//! feed:published:top:10
//! feed:author:{uuid}:top:50
//! ```

use crate::post::{FeedQuery, FeedScope};

const FEED_PREFIX: &str = "feed:";
const LIMIT_SEGMENT: &str = ":top:";

/// Returns the collection prefix shared by every key of a scope.
pub fn feed_collection(scope: FeedScope) -> String {
    match scope {
        FeedScope::Published => "feed:published".to_string(),
        FeedScope::Author { author_id } => format!("feed:author:{}", author_id),
    }
}

/// Returns the cache key for a feed read.
///
/// The key is a pure function of the descriptor: equal descriptors map to
/// equal keys, and any difference in scope or limit yields a different key.
pub fn feed_key(query: &FeedQuery) -> String {
    format!(
        "{}{}{}",
        feed_collection(query.scope()),
        LIMIT_SEGMENT,
        query.limit()
    )
}

/// Returns the pattern matching every cached variant of a scope.
pub fn feed_collection_pattern(scope: FeedScope) -> String {
    format!("{}:*", feed_collection(scope))
}

/// Returns the set key that tracks the cached keys of a collection.
///
/// Tracking lets backends delete a whole collection without scanning the
/// keyspace.
pub fn collection_tracking_key(collection: &str) -> String {
    format!("{}:_keys", collection)
}

/// Extracts the collection prefix from a feed key.
///
/// Returns `None` for anything that is not a well-formed feed key.
///
/// # Examples
///
/// ```
/// use feedcache_core::cache::collection_of_key;
///
/// assert_eq!(collection_of_key("feed:published:top:50"), Some("feed:published"));
/// assert_eq!(collection_of_key("feed:published:_keys"), None);
/// assert_eq!(collection_of_key("session:123"), None);
/// ```
pub fn collection_of_key(key: &str) -> Option<&str> {
    if !key.starts_with(FEED_PREFIX) {
        return None;
    }
    let (collection, limit) = key.rsplit_once(LIMIT_SEGMENT)?;
    limit.parse::<u32>().ok()?;
    Some(collection)
}

/// Extracts the collection prefix from a collection pattern.
///
/// Only patterns of the exact form `{collection}:*` qualify; a wildcard
/// anywhere inside the collection part yields `None`.
///
/// # Examples
///
/// ```
/// use feedcache_core::cache::collection_of_pattern;
///
/// assert_eq!(collection_of_pattern("feed:published:*"), Some("feed:published"));
/// assert_eq!(collection_of_pattern("feed:*:top:50"), None);
/// ```
pub fn collection_of_pattern(pattern: &str) -> Option<&str> {
    let collection = pattern.strip_suffix(":*")?;
    if !collection.starts_with(FEED_PREFIX) || collection.contains('*') {
        return None;
    }
    Some(collection)
}
