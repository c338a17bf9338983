use uuid::Uuid;

/// Largest number of items a single feed read may return.
pub const MAX_FEED_LIMIT: u32 = 50;

/// Which published posts a feed read selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedScope {
    /// Every published post.
    Published,
    /// Published posts written by a single author.
    Author { author_id: Uuid },
}

/// Describes a feed read: which posts, and how many of the newest.
///
/// A descriptor holds only what is being asked. Two equal descriptors always
/// select the same rows in the same order, which is what makes the derived
/// cache key safe to share between callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedQuery {
    scope: FeedScope,
    limit: u32,
}

impl FeedQuery {
    /// Creates a descriptor, clamping `limit` to `1..=MAX_FEED_LIMIT`.
    pub fn new(scope: FeedScope, limit: u32) -> Self {
        Self {
            scope,
            limit: limit.clamp(1, MAX_FEED_LIMIT),
        }
    }

    /// The newest published posts across all authors.
    pub fn published(limit: u32) -> Self {
        Self::new(FeedScope::Published, limit)
    }

    /// The newest published posts of one author.
    pub fn by_author(author_id: Uuid, limit: u32) -> Self {
        Self::new(FeedScope::Author { author_id }, limit)
    }

    pub fn scope(&self) -> FeedScope {
        self.scope
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the author filter, if the scope has one.
    pub fn author_id(&self) -> Option<Uuid> {
        match self.scope {
            FeedScope::Published => None,
            FeedScope::Author { author_id } => Some(author_id),
        }
    }
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self::published(MAX_FEED_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(FeedQuery::published(0).limit(), 1);
        assert_eq!(FeedQuery::published(10).limit(), 10);
        assert_eq!(FeedQuery::published(500).limit(), MAX_FEED_LIMIT);
    }

    #[test]
    fn test_default_is_top_published() {
        let query = FeedQuery::default();
        assert_eq!(query.scope(), FeedScope::Published);
        assert_eq!(query.limit(), 50);
        assert_eq!(query.author_id(), None);
    }

    #[test]
    fn test_author_scope() {
        let id = Uuid::new_v4();
        let query = FeedQuery::by_author(id, 5);
        assert_eq!(query.author_id(), Some(id));
        assert_eq!(query.scope(), FeedScope::Author { author_id: id });
    }
}
