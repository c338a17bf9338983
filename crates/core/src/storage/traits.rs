use async_trait::async_trait;
use uuid::Uuid;

use crate::post::{Author, FeedQuery, Post, PostSummary};

use super::Result;

/// Repository for posts and the feeds projected from them.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Returns the feed described by `query`.
    ///
    /// Only published posts are returned, newest first (`created_at`
    /// descending, then `id` descending), at most `query.limit()` items.
    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<PostSummary>>;

    /// Gets a post by its ID.
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>>;

    /// Creates a new post. The author must exist.
    async fn create_post(&self, post: &Post) -> Result<()>;

    /// Deletes a post and its likes, returning the removed post.
    async fn delete_post(&self, id: Uuid) -> Result<Post>;

    /// Records a like by `author_id` on a post, returning the liked post.
    async fn like_post(&self, post_id: Uuid, author_id: Uuid) -> Result<Post>;
}

/// Repository for authors.
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Gets an author by their ID.
    async fn get_author(&self, id: Uuid) -> Result<Option<Author>>;

    /// Creates a new author. Usernames are unique.
    async fn create_author(&self, author: &Author) -> Result<()>;
}
