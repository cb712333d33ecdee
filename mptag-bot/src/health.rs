//! Health check endpoint
//!
//! Minimal HTTP surface so hosting platforms (and the keep-alive ping)
//! have something to probe.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::time::Instant;

/// State for the health endpoint
#[derive(Debug, Clone)]
pub struct HealthState {
    startup_time: Instant,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            startup_time: Instant::now(),
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status (always "ok" while the process answers)
    pub status: String,
    /// Module name ("mptag-bot")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
}

/// GET /health
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "mptag-bot".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.startup_time.elapsed().as_secs(),
    })
}

/// Build health check routes
pub fn health_routes(state: HealthState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .with_state(state)
}
