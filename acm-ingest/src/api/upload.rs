//! POST /upload
//!
//! The raw request body is one chunk. Responds with the chunk's metadata
//! once the pipeline has processed it and the store holds it.

use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use tracing::info;

use super::SubmitterQuery;
use crate::error::ApiResult;
use crate::models::Metadata;
use crate::AppState;

/// POST /upload?user_id=&session_id=
pub async fn upload_chunk(
    State(state): State<AppState>,
    Query(query): Query<SubmitterQuery>,
    body: Bytes,
) -> ApiResult<Json<Metadata>> {
    let metadata = state
        .ingestor
        .ingest(&query.user_id, &query.session_id, body.to_vec())
        .await?;

    info!(
        chunk_id = %metadata.chunk_id,
        user_id = %metadata.submitter_id,
        bytes = body.len(),
        "Chunk uploaded"
    );

    Ok(Json(metadata))
}

pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload_chunk))
}
