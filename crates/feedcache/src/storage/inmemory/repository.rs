//! In-memory repository implementation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use feedcache_core::post::{Author, FeedQuery, Post, PostSummary};
use feedcache_core::storage::{AuthorRepository, PostRepository, RepositoryError, Result};

#[derive(Debug, Default)]
struct Tables {
    authors: HashMap<Uuid, Author>,
    posts: HashMap<Uuid, Post>,
    /// (post_id, author_id) pairs.
    likes: HashSet<(Uuid, Uuid)>,
}

impl Tables {
    fn like_count(&self, post_id: Uuid) -> u64 {
        self.likes.iter().filter(|(p, _)| *p == post_id).count() as u64
    }
}

/// In-memory storage backend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryRepository {
    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<PostSummary>> {
        let tables = self.tables.read().await;

        let mut posts: Vec<&Post> = tables
            .posts
            .values()
            .filter(|post| post.published)
            .filter(|post| query.author_id().is_none_or(|id| post.author_id == id))
            .collect();

        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        posts.truncate(query.limit() as usize);

        posts
            .into_iter()
            .map(|post| {
                let author = tables.authors.get(&post.author_id).ok_or_else(|| {
                    RepositoryError::InvalidData(format!(
                        "post {} references missing author {}",
                        post.id, post.author_id
                    ))
                })?;
                Ok(PostSummary::project(
                    post,
                    author.username.clone(),
                    tables.like_count(post.id),
                ))
            })
            .collect()
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).cloned())
    }

    async fn create_post(&self, post: &Post) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.authors.contains_key(&post.author_id) {
            return Err(RepositoryError::InvalidData(format!(
                "unknown author {}",
                post.author_id
            )));
        }
        if tables.posts.contains_key(&post.id) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "Post",
                id: post.id.to_string(),
            });
        }
        tables.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> Result<Post> {
        let mut tables = self.tables.write().await;
        let post = tables.posts.remove(&id).ok_or(RepositoryError::NotFound {
            entity_type: "Post",
            id: id.to_string(),
        })?;
        tables.likes.retain(|(post_id, _)| *post_id != id);
        Ok(post)
    }

    async fn like_post(&self, post_id: Uuid, author_id: Uuid) -> Result<Post> {
        let mut tables = self.tables.write().await;
        let post = tables
            .posts
            .get(&post_id)
            .cloned()
            .ok_or(RepositoryError::NotFound {
                entity_type: "Post",
                id: post_id.to_string(),
            })?;
        if !tables.authors.contains_key(&author_id) {
            return Err(RepositoryError::InvalidData(format!(
                "unknown author {}",
                author_id
            )));
        }
        if !tables.likes.insert((post_id, author_id)) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "Like",
                id: format!("{}:{}", post_id, author_id),
            });
        }
        Ok(post)
    }
}

#[async_trait]
impl AuthorRepository for InMemoryRepository {
    async fn get_author(&self, id: Uuid) -> Result<Option<Author>> {
        let tables = self.tables.read().await;
        Ok(tables.authors.get(&id).cloned())
    }

    async fn create_author(&self, author: &Author) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.authors.contains_key(&author.id)
            || tables
                .authors
                .values()
                .any(|existing| existing.username == author.username)
        {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "Author",
                id: author.username.clone(),
            });
        }
        tables.authors.insert(author.id, author.clone());
        Ok(())
    }
}
