//! API request types for post mutations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::serde::{deserialize_default_true, deserialize_optional_string};

use super::error::ValidationError;
use super::types::Post;

/// Maximum title length, in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum content length, in characters.
pub const MAX_CONTENT_LEN: usize = 10_000;

fn default_published() -> bool {
    true
}

/// Request payload for creating a post (`POST /posts`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
    pub author_id: Uuid,
    pub title: String,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<String>,
    #[serde(
        default = "default_published",
        deserialize_with = "deserialize_default_true"
    )]
    pub published: bool,
}

impl NewPost {
    /// Create a published post request.
    pub fn new(author_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            author_id,
            title: title.into(),
            content: None,
            published: true,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }

    /// Validate the payload and convert it into a new post.
    ///
    /// The title is trimmed before the length checks.
    pub fn into_post(self) -> Result<Post, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let title_len = title.chars().count();
        if title_len > MAX_TITLE_LEN {
            return Err(ValidationError::TitleTooLong {
                len: title_len,
                max: MAX_TITLE_LEN,
            });
        }

        if let Some(content) = &self.content {
            let content_len = content.chars().count();
            if content_len > MAX_CONTENT_LEN {
                return Err(ValidationError::ContentTooLong {
                    len: content_len,
                    max: MAX_CONTENT_LEN,
                });
            }
        }

        let mut post = Post::new(self.author_id, title);
        post.content = self.content;
        post.published = self.published;
        Ok(post)
    }
}

/// Request payload for liking a post (`POST /posts/{id}/likes`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LikePost {
    pub author_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_post_trims_title() {
        let author_id = Uuid::new_v4();
        let post = NewPost::new(author_id, "  Hello world  ")
            .with_content("body")
            .into_post()
            .unwrap();

        assert_eq!(post.title, "Hello world");
        assert_eq!(post.author_id, author_id);
        assert_eq!(post.content.as_deref(), Some("body"));
        assert!(post.published);
    }

    #[test]
    fn test_into_post_keeps_draft_flag() {
        let post = NewPost::new(Uuid::new_v4(), "Draft")
            .unpublished()
            .into_post()
            .unwrap();
        assert!(!post.published);
    }

    #[test]
    fn test_blank_title_rejected() {
        let result = NewPost::new(Uuid::new_v4(), "   ").into_post();
        assert_eq!(result.unwrap_err(), ValidationError::EmptyTitle);
    }

    #[test]
    fn test_long_title_rejected() {
        let title = "x".repeat(MAX_TITLE_LEN + 1);
        let result = NewPost::new(Uuid::new_v4(), title).into_post();
        assert!(matches!(
            result,
            Err(ValidationError::TitleTooLong { len: 201, max: 200 })
        ));
    }

    #[test]
    fn test_long_content_rejected() {
        let result = NewPost::new(Uuid::new_v4(), "ok")
            .with_content("y".repeat(MAX_CONTENT_LEN + 1))
            .into_post();
        assert!(matches!(
            result,
            Err(ValidationError::ContentTooLong { .. })
        ));
    }

    #[test]
    fn test_json_payload_defaults() {
        let json = r#"{"author_id": "00000000-0000-0000-0000-000000000000", "title": "Hi", "content": ""}"#;
        let payload: NewPost = serde_json::from_str(json).unwrap();

        assert!(payload.published);
        assert!(payload.content.is_none());
    }
}
