//! Per-client fixed-window rate limiting.
//!
//! Each client IP gets a counter that resets when its window elapses. Once a
//! client has used `max_requests` in the current window, further requests are
//! rejected with `429 Too Many Requests` and a `retry-after` header holding the
//! seconds left in the window.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::handlers::error::error_body;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Result of counting one request against a client's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the client's window resets.
    pub reset_after: Duration,
}

impl Decision {
    /// Whole seconds until the window resets, never less than one.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        let rounded = if self.reset_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        };
        rounded.max(1)
    }
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    windows: Arc<DashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            windows: Arc::new(DashMap::new()),
        }
    }

    /// Counts a request from `client` and decides whether it may proceed.
    pub fn check(&self, client: &str) -> Decision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> Decision {
        let mut entry = self
            .windows
            .entry(client.to_string())
            .or_insert(Window {
                started_at: now,
                count: 0,
            });

        if now.duration_since(entry.started_at) >= self.window {
            entry.started_at = now;
            entry.count = 0;
        }

        let reset_after = self
            .window
            .saturating_sub(now.duration_since(entry.started_at));

        if entry.count >= self.max_requests {
            return Decision {
                allowed: false,
                remaining: 0,
                reset_after,
            };
        }

        entry.count += 1;
        Decision {
            allowed: true,
            remaining: self.max_requests - entry.count,
            reset_after,
        }
    }

    /// Drops windows that have already elapsed. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.duration_since(w.started_at) < self.window);
        before.saturating_sub(self.windows.len())
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Identifies the client by peer address. Requests served without connect
/// info (such as router tests) share one bucket.
fn client_key(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn rate_limited(limiter: &RateLimiter, decision: &Decision) -> Response {
    let retry_after = decision.retry_after_secs();
    let status = StatusCode::TOO_MANY_REQUESTS;
    let body = error_body(
        status,
        format!("Rate limit exceeded, retry in {retry_after} seconds"),
    );

    let mut response = (status, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    headers.insert(LIMIT_HEADER, HeaderValue::from(limiter.limit()));
    headers.insert(REMAINING_HEADER, HeaderValue::from(0u32));
    response
}

/// Middleware applying a [`RateLimiter`] to every request.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_key(&request);
    let decision = limiter.check(&client);

    if !decision.allowed {
        tracing::warn!(client = %client, "rate limit exceeded");
        return rate_limited(&limiter, &decision);
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(LIMIT_HEADER, HeaderValue::from(limiter.limit()));
    headers.insert(REMAINING_HEADER, HeaderValue::from(decision.remaining));
    response
}
