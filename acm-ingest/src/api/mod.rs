//! HTTP and WebSocket adapters for acm-ingest

pub mod chunks;
pub mod health;
pub mod sse;
pub mod upload;
pub mod ws;

pub use chunks::chunk_routes;
pub use health::health_routes;
pub use sse::event_stream;
pub use upload::upload_routes;
pub use ws::ws_handler;

use serde::Deserialize;

/// `?user_id=&session_id=` as accepted by `/upload` and `/ws`
///
/// Both default to the empty string when absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitterQuery {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub session_id: String,
}
