//! Health check endpoint
//!
//! Reports uptime, build identification, pipeline counters and store size.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::StatsSnapshot;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" while accepting work, "stopping" once cancelled
    pub status: String,
    pub module: String,
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
    pub build_profile: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    pub pipeline: PipelineHealth,
    pub store: StoreHealth,
}

#[derive(Debug, Serialize)]
pub struct PipelineHealth {
    pub queue_depth: usize,
    pub queue_capacity: usize,
    pub workers: usize,
    #[serde(flatten)]
    pub stats: StatsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub records: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let engine = &state.engine;
    let status = if engine.is_running() { "ok" } else { "stopping" };

    Json(HealthResponse {
        status: status.to_string(),
        module: "acm-ingest".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("ACM_GIT_HASH").to_string(),
        build_timestamp: env!("ACM_BUILD_TIMESTAMP").to_string(),
        build_profile: env!("ACM_BUILD_PROFILE").to_string(),
        uptime_seconds,
        pipeline: PipelineHealth {
            queue_depth: engine.queue_depth(),
            queue_capacity: engine.config().queue_capacity,
            workers: engine.config().worker_count,
            stats: engine.stats(),
        },
        store: StoreHealth {
            records: state.store.len(),
        },
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
