use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use feedcache_core::post::{Author, Post};

/// Demo content: authors, their posts, and who liked each post.
pub struct DemoData {
    pub authors: Vec<Author>,
    pub posts: Vec<Post>,
    /// `(post_id, liker_id)` pairs.
    pub likes: Vec<(Uuid, Uuid)>,
}

/// Generates demo authors and posts spread over the last days before `now`.
/// One post is a draft so it never shows up in a feed.
pub fn generate_demo_data(now: DateTime<Utc>) -> DemoData {
    let ada = Author::new("ada");
    let grace = Author::new("grace");
    let linus = Author::new("linus");

    let ago = |hours: i64| now - Duration::hours(hours);

    let posts = vec![
        Post::new(ada.id, "Notes on the analytical engine")
            .with_content("Loops, conditionals and a little poetry.")
            .with_created_at(ago(72)),
        Post::new(grace.id, "Why compilers matter").with_created_at(ago(48)),
        Post::new(linus.id, "Just a hobby project").with_created_at(ago(30)),
        Post::new(ada.id, "Bernoulli numbers, step by step").with_created_at(ago(20)),
        Post::new(grace.id, "Finding the first bug")
            .with_content("It was a moth.")
            .with_created_at(ago(6)),
        Post::new(linus.id, "Half-finished thoughts on merging")
            .draft()
            .with_created_at(ago(2)),
        Post::new(ada.id, "Cache-aside in one page").with_created_at(ago(1)),
    ];

    let likes = vec![
        (posts[0].id, grace.id),
        (posts[0].id, linus.id),
        (posts[1].id, ada.id),
        (posts[3].id, grace.id),
        (posts[4].id, ada.id),
        (posts[4].id, linus.id),
        (posts[6].id, grace.id),
    ];

    DemoData {
        authors: vec![ada, grace, linus],
        posts,
        likes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_posts_belong_to_demo_authors() {
        let data = generate_demo_data(Utc::now());
        let authors: HashSet<Uuid> = data.authors.iter().map(|a| a.id).collect();

        assert!(data.posts.iter().all(|p| authors.contains(&p.author_id)));
        assert!(data.likes.iter().all(|(_, liker)| authors.contains(liker)));
    }

    #[test]
    fn test_contains_one_draft() {
        let data = generate_demo_data(Utc::now());
        assert_eq!(data.posts.iter().filter(|p| !p.published).count(), 1);
    }

    #[test]
    fn test_likes_are_unique() {
        let data = generate_demo_data(Utc::now());
        let unique: HashSet<_> = data.likes.iter().collect();
        assert_eq!(unique.len(), data.likes.len());
    }
}
