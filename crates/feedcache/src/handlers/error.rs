use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use feedcache_core::post::ValidationError;
use feedcache_core::storage::{repository_error_to_status_code, RepositoryError};

/// Seconds a client should wait before retrying after a 503.
const RETRY_AFTER_SECS: u64 = 1;

/// Handler error. Any error converts into it with `?`; the status is picked
/// by downcasting to the domain error types.
pub struct AppError(pub anyhow::Error);

impl AppError {
    fn status_code(&self) -> StatusCode {
        if let Some(repo_error) = self.0.downcast_ref::<RepositoryError>() {
            let code = repository_error_to_status_code(repo_error);
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        } else if self.0.downcast_ref::<ValidationError>().is_some() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// JSON error body shared by handlers and middleware.
pub fn error_body(status: StatusCode, message: impl Into<String>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "statusCode": status.as_u16(),
        "error": status.canonical_reason().unwrap_or("Error"),
        "message": message.into(),
    }))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server-side details stay in the logs.
        let message = if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Request failed");
            status.canonical_reason().unwrap_or("Error").to_string()
        } else {
            tracing::warn!(status = %status, error = %self.0, "Request rejected");
            self.0.to_string()
        };

        let retryable = self
            .0
            .downcast_ref::<RepositoryError>()
            .is_some_and(RepositoryError::is_unavailable);

        let mut response = (status, error_body(status, message)).into_response();
        if retryable {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
        }
        response
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::time::Duration;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_store_unavailable_is_retryable_503() {
        let response = AppError::from(RepositoryError::Timeout(Duration::from_secs(5))).into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");

        let json = body_json(response).await;
        assert_eq!(json["statusCode"], 503);
        assert_eq!(json["message"], "Service Unavailable");
    }

    #[tokio::test]
    async fn test_not_found_keeps_message() {
        let err = RepositoryError::NotFound {
            entity_type: "Post",
            id: "abc".to_string(),
        };
        let response = AppError::from(err).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
        let json = body_json(response).await;
        assert!(json["message"].as_str().unwrap().contains("abc"));
    }

    #[test]
    fn test_validation_error_is_400() {
        let err = AppError::from(ValidationError::EmptyTitle);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unknown_error_is_500() {
        let err = AppError(anyhow::anyhow!("boom"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_query_failure_is_not_retryable() {
        let response = AppError::from(RepositoryError::QueryFailed("syntax".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }
}
