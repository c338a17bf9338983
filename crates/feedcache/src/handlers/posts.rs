//! Post feed and mutation handlers.
//!
//! Handlers only talk to the repository trait objects in [`AppState`]. The
//! cached decorator behind them serves feeds from the cache and invalidates
//! the affected feeds after each committed write.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use feedcache_core::post::{FeedQuery, LikePost, NewPost, PostSummary};

use crate::{
    handlers::{error::error_body, AppError},
    state::AppState,
};

/// Rejects a malformed JSON body with a 400, whatever the rejection kind.
fn bad_request(rejection: JsonRejection) -> Response {
    let message = rejection.body_text();
    tracing::warn!(message = %message, "Malformed request body");
    (
        StatusCode::BAD_REQUEST,
        error_body(StatusCode::BAD_REQUEST, message),
    )
        .into_response()
}

/// Query parameters for listing posts.
#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    /// Number of newest posts to return, clamped to `1..=50`.
    pub limit: Option<u32>,
    /// Restrict the feed to one author.
    pub author: Option<Uuid>,
}

impl ListPostsQuery {
    fn into_feed_query(self, default_limit: u32) -> FeedQuery {
        let limit = self.limit.unwrap_or(default_limit);
        match self.author {
            Some(author_id) => FeedQuery::by_author(author_id, limit),
            None => FeedQuery::published(limit),
        }
    }
}

/// List the newest published posts (GET /posts).
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Vec<PostSummary>>, AppError> {
    let feed_query = query.into_feed_query(state.feed_limit);
    let posts = state.post_repo.list_feed(&feed_query).await?;
    Ok(Json(posts))
}

/// Create a post (POST /posts).
pub async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<NewPost>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return Ok(bad_request(rejection)),
    };

    let post = payload.into_post()?;
    state.post_repo.create_post(&post).await?;

    tracing::info!(post_id = %post.id, author_id = %post.author_id, "Created post");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "id": post.id })),
    )
        .into_response())
}

/// Delete a post and its likes (DELETE /posts/{id}).
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.post_repo.delete_post(id).await?;
    tracing::info!(post_id = %id, "Deleted post");
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Like a post (POST /posts/{id}/likes).
pub async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<LikePost>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(LikePost { author_id }) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return Ok(bad_request(rejection)),
    };

    state.post_repo.like_post(id, author_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true })),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedcache_core::post::FeedScope;

    #[test]
    fn test_query_defaults_to_published_feed() {
        let query = ListPostsQuery::default().into_feed_query(50);
        assert_eq!(query, FeedQuery::published(50));
    }

    #[test]
    fn test_query_with_author_and_limit() {
        let author_id = Uuid::new_v4();
        let query = ListPostsQuery {
            limit: Some(10),
            author: Some(author_id),
        }
        .into_feed_query(50);

        assert_eq!(query.scope(), FeedScope::Author { author_id });
        assert_eq!(query.limit(), 10);
    }

    #[test]
    fn test_query_limit_is_clamped() {
        let query = ListPostsQuery {
            limit: Some(1_000),
            author: None,
        }
        .into_feed_query(50);
        assert_eq!(query.limit(), 50);
    }
}
