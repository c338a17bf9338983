//! Mapping from write operations to the feed collections they make stale.

use uuid::Uuid;

use super::keys::feed_collection_pattern;
use crate::post::{FeedScope, Post};

/// A committed write that may affect cached feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    PostCreated { author_id: Uuid, published: bool },
    PostDeleted { author_id: Uuid, published: bool },
    PostLiked { author_id: Uuid, published: bool },
}

impl Mutation {
    pub fn created(post: &Post) -> Self {
        Mutation::PostCreated {
            author_id: post.author_id,
            published: post.published,
        }
    }

    pub fn deleted(post: &Post) -> Self {
        Mutation::PostDeleted {
            author_id: post.author_id,
            published: post.published,
        }
    }

    /// A like on `post`. The author is the post's author, not the liker.
    pub fn liked(post: &Post) -> Self {
        Mutation::PostLiked {
            author_id: post.author_id,
            published: post.published,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::PostCreated { .. } => "post_created",
            Mutation::PostDeleted { .. } => "post_deleted",
            Mutation::PostLiked { .. } => "post_liked",
        }
    }

    fn parts(&self) -> (Uuid, bool) {
        match *self {
            Mutation::PostCreated {
                author_id,
                published,
            }
            | Mutation::PostDeleted {
                author_id,
                published,
            }
            | Mutation::PostLiked {
                author_id,
                published,
            } => (author_id, published),
        }
    }
}

/// Returns the feed scopes whose cached entries a mutation makes stale.
///
/// Only published posts appear in feeds, so a write to a draft affects
/// nothing. A published post appears in the global feed and in its author's
/// feed; creation, deletion and a changed like count all alter both.
pub fn invalidations_for(mutation: &Mutation) -> Vec<FeedScope> {
    let (author_id, published) = mutation.parts();
    if !published {
        return Vec::new();
    }
    vec![FeedScope::Published, FeedScope::Author { author_id }]
}

/// Returns the key patterns to delete after a mutation commits.
pub fn invalidation_patterns(mutation: &Mutation) -> Vec<String> {
    invalidations_for(mutation)
        .into_iter()
        .map(feed_collection_pattern)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_writes_invalidate_global_and_author_feeds() {
        let post = Post::new(Uuid::new_v4(), "Hello");
        let expected = vec![
            FeedScope::Published,
            FeedScope::Author {
                author_id: post.author_id,
            },
        ];

        for mutation in [
            Mutation::created(&post),
            Mutation::deleted(&post),
            Mutation::liked(&post),
        ] {
            assert_eq!(invalidations_for(&mutation), expected, "{}", mutation.name());
        }
    }

    #[test]
    fn test_draft_writes_invalidate_nothing() {
        let post = Post::new(Uuid::new_v4(), "Draft").draft();

        for mutation in [
            Mutation::created(&post),
            Mutation::deleted(&post),
            Mutation::liked(&post),
        ] {
            assert!(invalidations_for(&mutation).is_empty());
            assert!(invalidation_patterns(&mutation).is_empty());
        }
    }

    #[test]
    fn test_patterns() {
        let author_id = Uuid::nil();
        let post = Post::new(author_id, "Hello");
        assert_eq!(
            invalidation_patterns(&Mutation::created(&post)),
            vec![
                "feed:published:*".to_string(),
                "feed:author:00000000-0000-0000-0000-000000000000:*".to_string(),
            ]
        );
    }

    #[test]
    fn test_names() {
        let post = Post::new(Uuid::nil(), "x");
        assert_eq!(Mutation::created(&post).name(), "post_created");
        assert_eq!(Mutation::deleted(&post).name(), "post_deleted");
        assert_eq!(Mutation::liked(&post).name(), "post_liked");
    }
}
