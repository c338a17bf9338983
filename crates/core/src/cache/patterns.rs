//! Glob-style matching for cache key patterns.
//!
//! Only `*` is special; it matches any run of characters, including none.

/// Checks if a cache key matches a glob pattern.
///
/// # Examples
///
/// ```
/// use feedcache_core::cache::pattern_matches;
///
/// assert!(pattern_matches("feed:published:*", "feed:published:top:50"));
/// assert!(pattern_matches("feed:*:top:10", "feed:published:top:10"));
/// assert!(!pattern_matches("feed:published:*", "feed:author:1:top:50"));
/// ```
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    let mut parts = pattern.split('*');
    // `split` always yields at least one item.
    let head = parts.next().unwrap_or_default();
    let Some(mut rest) = key.strip_prefix(head) else {
        return false;
    };

    let tail: Vec<&str> = parts.collect();
    let Some((last, middle)) = tail.split_last() else {
        // No wildcard at all: the head must be the whole key.
        return rest.is_empty();
    };

    for segment in middle {
        match rest.find(segment) {
            Some(pos) => rest = &rest[pos + segment.len()..],
            None => return false,
        }
    }

    rest.ends_with(last)
}
