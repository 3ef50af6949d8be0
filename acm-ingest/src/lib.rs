//! acm-ingest library interface
//!
//! Audio chunk ingestion: chunks arrive over HTTP or a WebSocket, pass
//! through a bounded pipeline that derives their metadata, and the metadata
//! is kept in an in-memory store queryable by chunk id and by user.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod store;
pub mod transform;

pub use crate::error::{ApiError, ApiResult, Error, Result};

use acm_common::EventBus;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use pipeline::PipelineEngine;
use services::Ingestor;
use std::sync::Arc;
use store::MetadataStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Chunk submission shared by `/upload` and `/ws`
    pub ingestor: Ingestor,
    pub store: Arc<MetadataStore>,
    pub engine: Arc<PipelineEngine>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(ingestor: Ingestor, event_bus: EventBus) -> Self {
        Self {
            store: Arc::clone(ingestor.store()),
            engine: Arc::clone(ingestor.engine()),
            ingestor,
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::upload_routes())
        .merge(api::chunk_routes())
        .route("/ws", get(api::ws_handler))
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
