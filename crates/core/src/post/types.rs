use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An author who can publish posts and like them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl Author {
    /// Creates a new author with the given username.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            created_at: Utc::now(),
        }
    }

    /// Sets a specific ID for this author (useful for testing).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }
}

/// A post as stored in the persistent store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Creates a new published post.
    pub fn new(author_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            title: title.into(),
            content: None,
            published: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Marks the post as a draft, keeping it out of every feed.
    pub fn draft(mut self) -> Self {
        self.published = false;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// The author fields projected into a feed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorRef {
    pub username: String,
}

/// Aggregated counts projected into a feed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostCounts {
    pub likes: u64,
}

/// A single feed item: the projection of a post returned by feed reads.
///
/// The JSON shape is the public wire format of `GET /posts` and also the
/// cached representation, so both paths serialize through this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorRef,
    #[serde(rename = "_count")]
    pub counts: PostCounts,
}

impl PostSummary {
    /// Projects a post together with its author's username and like count.
    pub fn project(post: &Post, username: impl Into<String>, likes: u64) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            created_at: post.created_at,
            author: AuthorRef {
                username: username.into(),
            },
            counts: PostCounts { likes },
        }
    }
}
