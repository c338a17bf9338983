//! Health check endpoints.
//!
//! - `/health` - Status and process uptime
//! - `/livez` - Basic liveness check (immediate 200, no checks)
//!
//! Neither touches the cache or the store.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    /// Seconds since the server state was built.
    pub uptime: f64,
}

/// GET /health - Status and uptime.
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        uptime: state.uptime().as_secs_f64(),
    })
}

/// GET /livez - Basic liveness check.
///
/// Returns 200 immediately. Used to check if the server is accepting connections.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}
