//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and domain types.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;

use feedcache_core::post::{Author, AuthorRef, Post, PostCounts, PostSummary};

/// Convert a SQLite row to an Author.
///
/// Expected columns: id, username, created_at
pub fn row_to_author(row: &Row) -> rusqlite::Result<Author> {
    let id: String = row.get(0)?;
    let username: String = row.get(1)?;
    let created_at: String = row.get(2)?;

    Ok(Author {
        id: parse_uuid(&id)?,
        username,
        created_at: parse_datetime(&created_at)?,
    })
}

/// Convert a SQLite row to a Post.
///
/// Expected columns: id, author_id, title, content, published, created_at
pub fn row_to_post(row: &Row) -> rusqlite::Result<Post> {
    let id: String = row.get(0)?;
    let author_id: String = row.get(1)?;
    let title: String = row.get(2)?;
    let content: Option<String> = row.get(3)?;
    let published: bool = row.get(4)?;
    let created_at: String = row.get(5)?;

    Ok(Post {
        id: parse_uuid(&id)?,
        author_id: parse_uuid(&author_id)?,
        title,
        content,
        published,
        created_at: parse_datetime(&created_at)?,
    })
}

/// Convert a feed query row to a PostSummary.
///
/// Expected columns: id, title, created_at, username, like_count
pub fn row_to_summary(row: &Row) -> rusqlite::Result<PostSummary> {
    let id: String = row.get(0)?;
    let title: String = row.get(1)?;
    let created_at: String = row.get(2)?;
    let username: String = row.get(3)?;
    let like_count: i64 = row.get(4)?;

    Ok(PostSummary {
        id: parse_uuid(&id)?,
        title,
        created_at: parse_datetime(&created_at)?,
        author: AuthorRef { username },
        counts: PostCounts {
            likes: u64::try_from(like_count).unwrap_or_default(),
        },
    })
}

fn parse_uuid(s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_datetime(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Format a DateTime<Utc> for SQLite storage.
///
/// Always `YYYY-MM-DDTHH:MM:SS.ffffffZ`, so lexical and chronological order
/// agree in `ORDER BY created_at`.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}
