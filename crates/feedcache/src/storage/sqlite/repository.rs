//! SQLite repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use tokio_rusqlite::Connection;
use uuid::Uuid;

use feedcache_core::post::{Author, FeedQuery, FeedScope, Post, PostSummary};
use feedcache_core::storage::{AuthorRepository, PostRepository, RepositoryError, Result};

use super::conversions::{format_datetime, row_to_author, row_to_post, row_to_summary};
use super::error::{map_tokio_rusqlite_error, raise};
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// Reads a post inside a `call` closure, raising `NotFound` when absent.
fn select_post(conn: &rusqlite::Connection, id: &str) -> tokio_rusqlite::Result<Post> {
    match conn.query_row(schema::SELECT_POST_BY_ID, [id], row_to_post) {
        Ok(post) => Ok(post),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(raise(RepositoryError::NotFound {
            entity_type: "Post",
            id: id.to_string(),
        })),
        Err(e) => Err(wrap_err(e)),
    }
}

/// SQLite-based repository implementation.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Opens (or creates) a file-based database and applies the schema.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Creates a repository backed by an in-memory database.
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES).map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }
}

#[async_trait]
impl PostRepository for SqliteRepository {
    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<PostSummary>> {
        let scope = query.scope();
        let limit = i64::from(query.limit());

        self.conn
            .call(move |conn| {
                let mut items = Vec::new();
                match scope {
                    FeedScope::Published => {
                        let mut stmt = conn
                            .prepare_cached(schema::SELECT_PUBLISHED_FEED)
                            .map_err(wrap_err)?;
                        let rows = stmt
                            .query_map(rusqlite::params![limit], row_to_summary)
                            .map_err(wrap_err)?;
                        for row_result in rows {
                            items.push(row_result.map_err(wrap_err)?);
                        }
                    }
                    FeedScope::Author { author_id } => {
                        let mut stmt = conn
                            .prepare_cached(schema::SELECT_AUTHOR_FEED)
                            .map_err(wrap_err)?;
                        let rows = stmt
                            .query_map(
                                rusqlite::params![author_id.to_string(), limit],
                                row_to_summary,
                            )
                            .map_err(wrap_err)?;
                        for row_result in rows {
                            items.push(row_result.map_err(wrap_err)?);
                        }
                    }
                }
                Ok(items)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Feed", "feed"))
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                match conn.query_row(schema::SELECT_POST_BY_ID, [&id_str], row_to_post) {
                    Ok(post) => Ok(Some(post)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(wrap_err(e)),
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Post", id.to_string()))
    }

    async fn create_post(&self, post: &Post) -> Result<()> {
        let id = post.id.to_string();
        let author_id = post.author_id.to_string();
        let title = post.title.clone();
        let content = post.content.clone();
        let published = post.published;
        let created_at = format_datetime(&post.created_at);
        let post_id = post.id.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_POST,
                    rusqlite::params![id, author_id, title, content, published, created_at],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Post", post_id))
    }

    async fn delete_post(&self, id: Uuid) -> Result<Post> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let post = select_post(&tx, &id_str)?;
                tx.execute(schema::DELETE_LIKES_FOR_POST, [&id_str])
                    .map_err(wrap_err)?;
                tx.execute(schema::DELETE_POST, [&id_str]).map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(post)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Post", id.to_string()))
    }

    async fn like_post(&self, post_id: Uuid, author_id: Uuid) -> Result<Post> {
        let post_str = post_id.to_string();
        let author_str = author_id.to_string();
        let created_at = format_datetime(&Utc::now());

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let post = select_post(&tx, &post_str)?;
                tx.execute(
                    schema::INSERT_LIKE,
                    rusqlite::params![post_str, author_str, created_at],
                )
                .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(post)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Like", format!("{}:{}", post_id, author_id)))
    }
}

#[async_trait]
impl AuthorRepository for SqliteRepository {
    async fn get_author(&self, id: Uuid) -> Result<Option<Author>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                match conn.query_row(schema::SELECT_AUTHOR_BY_ID, [&id_str], row_to_author) {
                    Ok(author) => Ok(Some(author)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(wrap_err(e)),
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Author", id.to_string()))
    }

    async fn create_author(&self, author: &Author) -> Result<()> {
        let id = author.id.to_string();
        let username = author.username.clone();
        let created_at = format_datetime(&author.created_at);

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_AUTHOR,
                    rusqlite::params![id, username, created_at],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Author", author.username.clone()))
    }
}
