//! SQLite schema definitions and SQL query constants.
//!
//! Pure data, no I/O. Timestamps are stored as fixed-width RFC 3339 strings
//! (microsecond precision, `Z` suffix) so that text order is time order.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
PRAGMA foreign_keys = ON;

-- Authors
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- Posts
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    author_id TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT,
    published INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
);

-- One like per (post, author)
CREATE TABLE IF NOT EXISTS likes (
    post_id TEXT NOT NULL,
    author_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (post_id, author_id),
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_posts_feed ON posts(published, created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_posts_author_feed ON posts(author_id, published, created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_likes_post_id ON likes(post_id);
"#;

// Author queries
pub const INSERT_AUTHOR: &str = r#"
INSERT INTO users (id, username, created_at)
VALUES (?1, ?2, ?3)
"#;

pub const SELECT_AUTHOR_BY_ID: &str = r#"
SELECT id, username, created_at
FROM users
WHERE id = ?1
"#;

// Post queries
pub const INSERT_POST: &str = r#"
INSERT INTO posts (id, author_id, title, content, published, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub const SELECT_POST_BY_ID: &str = r#"
SELECT id, author_id, title, content, published, created_at
FROM posts
WHERE id = ?1
"#;

pub const DELETE_POST: &str = r#"
DELETE FROM posts
WHERE id = ?1
"#;

// Feed queries: published only, newest first, bounded.
pub const SELECT_PUBLISHED_FEED: &str = r#"
SELECT p.id, p.title, p.created_at, u.username,
       (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count
FROM posts p
INNER JOIN users u ON u.id = p.author_id
WHERE p.published = 1
ORDER BY p.created_at DESC, p.id DESC
LIMIT ?1
"#;

pub const SELECT_AUTHOR_FEED: &str = r#"
SELECT p.id, p.title, p.created_at, u.username,
       (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count
FROM posts p
INNER JOIN users u ON u.id = p.author_id
WHERE p.published = 1 AND p.author_id = ?1
ORDER BY p.created_at DESC, p.id DESC
LIMIT ?2
"#;

// Like queries
pub const INSERT_LIKE: &str = r#"
INSERT INTO likes (post_id, author_id, created_at)
VALUES (?1, ?2, ?3)
"#;

pub const DELETE_LIKES_FOR_POST: &str = r#"
DELETE FROM likes
WHERE post_id = ?1
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_valid_sql() {
        assert!(CREATE_TABLES.contains("CREATE TABLE IF NOT EXISTS users"));
        assert!(CREATE_TABLES.contains("CREATE TABLE IF NOT EXISTS posts"));
        assert!(CREATE_TABLES.contains("CREATE TABLE IF NOT EXISTS likes"));
        assert!(CREATE_TABLES.contains("PRAGMA foreign_keys = ON"));
    }

    #[test]
    fn test_feed_queries_are_ordered_filtered_and_bounded() {
        for query in [SELECT_PUBLISHED_FEED, SELECT_AUTHOR_FEED] {
            assert!(query.contains("p.published = 1"));
            assert!(query.contains("ORDER BY p.created_at DESC, p.id DESC"));
            assert!(query.contains("LIMIT"));
        }
        assert!(SELECT_AUTHOR_FEED.contains("p.author_id = ?1"));
    }
}
