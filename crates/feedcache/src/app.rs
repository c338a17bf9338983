use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    handlers::{
        health::{health, livez},
        posts::{create_post, delete_post, like_post, list_posts},
    },
    middleware::rate_limit,
    state::AppState,
};

/// Headers added to every response that does not already carry them.
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("referrer-policy", "no-referrer"),
    ("x-dns-prefetch-control", "off"),
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("x-xss-protection", "0"),
];

/// Builds the CORS layer for the configured origin. `*` allows any origin;
/// an origin that is not a valid header value allows none.
fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    if origin == "*" {
        return cors.allow_origin(Any);
    }

    match HeaderValue::from_str(origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(err) => {
            tracing::warn!(origin, error = %err, "Invalid CORS origin, cross-origin requests disabled");
            cors
        }
    }
}

fn with_security_headers(router: Router) -> Router {
    SECURITY_HEADERS.iter().fold(router, |router, &(name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ))
    })
}

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health))
        .route("/livez", get(livez))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}", delete(delete_post))
        .route("/posts/{id}/likes", post(like_post))
        .layer(from_fn_with_state(state.rate_limiter.clone(), rate_limit))
        .layer(cors_layer(&state.allowed_origin))
        .with_state(state);

    with_security_headers(routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
}

#[cfg(all(test, feature = "inmemory", feature = "memory"))]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    use feedcache_core::post::Author;

    use async_trait::async_trait;
    use feedcache_core::post::{FeedQuery, Post, PostSummary};
    use feedcache_core::storage::{AuthorRepository, PostRepository, RepositoryError};
    use std::sync::Arc;

    use crate::cache::MemoryCache;
    use crate::config::Config;
    use crate::middleware::RateLimiter;
    use crate::storage::cached::CachedPostRepository;

    /// A store that cannot be reached. When `delay` is set, every call
    /// stalls that long before failing.
    #[derive(Default)]
    struct DownStore {
        delay: Option<Duration>,
    }

    impl DownStore {
        async fn fail<T>(&self) -> feedcache_core::storage::Result<T> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Err(RepositoryError::ConnectionFailed("connection refused".to_string()))
        }
    }

    #[async_trait]
    impl PostRepository for DownStore {
        async fn list_feed(&self, _query: &FeedQuery) -> feedcache_core::storage::Result<Vec<PostSummary>> {
            self.fail().await
        }

        async fn get_post(&self, _id: Uuid) -> feedcache_core::storage::Result<Option<Post>> {
            self.fail().await
        }

        async fn create_post(&self, _post: &Post) -> feedcache_core::storage::Result<()> {
            self.fail().await
        }

        async fn delete_post(&self, _id: Uuid) -> feedcache_core::storage::Result<Post> {
            self.fail().await
        }

        async fn like_post(&self, _post_id: Uuid, _author_id: Uuid) -> feedcache_core::storage::Result<Post> {
            self.fail().await
        }
    }

    #[async_trait]
    impl AuthorRepository for DownStore {
        async fn get_author(&self, _id: Uuid) -> feedcache_core::storage::Result<Option<Author>> {
            self.fail().await
        }

        async fn create_author(&self, _author: &Author) -> feedcache_core::storage::Result<()> {
            self.fail().await
        }
    }

    fn state_over(repo: Arc<CachedPostRepository<DownStore, MemoryCache>>) -> AppState {
        AppState::build(repo.clone(), repo, &Config::default())
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn state_with_author(username: &str) -> (AppState, Author) {
        let state = AppState::default();
        let author = Author::new(username);
        state.author_repo.create_author(&author).await.unwrap();
        (state, author)
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_app(AppState::default());

        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["uptime"].as_f64().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn test_livez() {
        let app = create_app(AppState::default());
        let response = app.oneshot(get_request("/livez")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_posts_empty() {
        let app = create_app(AppState::default());

        let response = app.oneshot(get_request("/posts")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_create_post_then_read_includes_it() {
        let (state, author) = state_with_author("ada").await;
        let app = create_app(state);

        // Warm the cache with the empty feed.
        let response = app.clone().oneshot(get_request("/posts")).await.unwrap();
        assert_eq!(body_json(response).await, serde_json::json!([]));

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/posts",
                serde_json::json!({ "author_id": author.id, "title": "Hello" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["success"], true);
        let id = created["id"].as_str().unwrap().to_string();

        let response = app.oneshot(get_request("/posts")).await.unwrap();
        let feed = body_json(response).await;
        assert_eq!(feed.as_array().unwrap().len(), 1);
        assert_eq!(feed[0]["id"], id);
        assert_eq!(feed[0]["title"], "Hello");
        assert_eq!(feed[0]["author"]["username"], "ada");
        assert_eq!(feed[0]["_count"]["likes"], 0);
        assert!(feed[0]["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_author_feed_and_limit() {
        let (state, author) = state_with_author("ada").await;
        let other = Author::new("grace");
        state.author_repo.create_author(&other).await.unwrap();
        let app = create_app(state);

        for (author_id, title) in [(author.id, "a1"), (other.id, "g1"), (author.id, "a2")] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/posts",
                    serde_json::json!({ "author_id": author_id, "title": title }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .clone()
            .oneshot(get_request(&format!("/posts?author={}", author.id)))
            .await
            .unwrap();
        let feed = body_json(response).await;
        let titles: Vec<&str> = feed
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.iter().all(|t| t.starts_with('a')));

        let response = app.oneshot(get_request("/posts?limit=1")).await.unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_query_is_400() {
        let app = create_app(AppState::default());
        let response = app.oneshot(get_request("/posts?limit=many")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_post_validation_errors_are_400() {
        let (state, author) = state_with_author("ada").await;
        let app = create_app(state);

        let cases = [
            serde_json::json!({ "author_id": author.id, "title": "   " }),
            serde_json::json!({ "author_id": Uuid::new_v4(), "title": "Unknown author" }),
            serde_json::json!({ "title": "Missing author" }),
        ];

        for body in cases {
            let response = app
                .clone()
                .oneshot(json_request("POST", "/posts", body.clone()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        }
    }

    #[tokio::test]
    async fn test_delete_post() {
        let (state, author) = state_with_author("ada").await;
        let app = create_app(state);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/posts",
                serde_json::json!({ "author_id": author.id, "title": "Short-lived" }),
            ))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app.clone().oneshot(get_request("/posts")).await.unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

        let delete_request = |id: &str| {
            Request::builder()
                .method("DELETE")
                .uri(format!("/posts/{id}"))
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(delete_request(&id)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.clone().oneshot(get_request("/posts")).await.unwrap();
        assert_eq!(body_json(response).await, serde_json::json!([]));

        let response = app.oneshot(delete_request(&id)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_like_post() {
        let (state, author) = state_with_author("ada").await;
        let fan = Author::new("grace");
        state.author_repo.create_author(&fan).await.unwrap();
        let app = create_app(state);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/posts",
                serde_json::json!({ "author_id": author.id, "title": "Likeable" }),
            ))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_str().unwrap().to_string();
        let uri = format!("/posts/{id}/likes");
        let like = serde_json::json!({ "author_id": fan.id });

        // Cache the feed before the like.
        let response = app.clone().oneshot(get_request("/posts")).await.unwrap();
        assert_eq!(body_json(response).await[0]["_count"]["likes"], 0);

        let response = app
            .clone()
            .oneshot(json_request("POST", &uri, like.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request("POST", &uri, like))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/posts/{}/likes", Uuid::new_v4()),
                serde_json::json!({ "author_id": fan.id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(get_request("/posts")).await.unwrap();
        assert_eq!(body_json(response).await[0]["_count"]["likes"], 1);
    }

    #[tokio::test]
    async fn test_security_headers() {
        let app = create_app(AppState::default());
        let response = app.oneshot(get_request("/posts")).await.unwrap();

        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
        assert_eq!(headers["referrer-policy"], "no-referrer");
        assert_eq!(headers["x-xss-protection"], "0");
        assert!(headers.contains_key("strict-transport-security"));
    }

    #[tokio::test]
    async fn test_cors_uses_configured_origin() {
        let mut state = AppState::default();
        state.allowed_origin = "https://app.example.com".to_string();
        let app = create_app(state);

        let request = Request::builder()
            .uri("/posts")
            .header(header::ORIGIN, "https://app.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.com"
        );
    }

    #[tokio::test]
    async fn test_rate_limit_applies_to_every_route() {
        let mut state = AppState::default();
        state.rate_limiter = RateLimiter::new(Duration::from_secs(60), 2);
        let app = create_app(state);

        for _ in 0..2 {
            let response = app.clone().oneshot(get_request("/health")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.oneshot(get_request("/posts")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");

        let json = body_json(response).await;
        assert_eq!(json["statusCode"], 429);
    }

    #[tokio::test]
    async fn test_unreachable_store_is_retryable_503() {
        let repo = CachedPostRepository::new(
            Arc::new(DownStore::default()),
            Arc::new(MemoryCache::new(100)),
            Duration::from_secs(300),
        );
        let app = create_app(state_over(Arc::new(repo)));

        let response = app.clone().oneshot(get_request("/posts")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
        assert_eq!(body_json(response).await["statusCode"], 503);

        let response = app
            .oneshot(json_request(
                "POST",
                "/posts",
                serde_json::json!({ "author_id": Uuid::new_v4(), "title": "Lost" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }

    #[tokio::test]
    async fn test_slow_store_times_out_as_retryable_503() {
        let repo = CachedPostRepository::new(
            Arc::new(DownStore {
                delay: Some(Duration::from_millis(500)),
            }),
            Arc::new(MemoryCache::new(100)),
            Duration::from_secs(300),
        )
        .with_timeouts(Duration::from_millis(50), Duration::from_millis(20));
        let app = create_app(state_over(Arc::new(repo)));

        let response = app.oneshot(get_request("/posts")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }
}
