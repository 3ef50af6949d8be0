//! Metadata lookup endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::{ApiError, ApiResult};
use crate::models::Metadata;
use crate::AppState;

/// GET /chunks/:id
///
/// An id that is not a UUID cannot name a stored chunk, so it is reported
/// as not found like any other unknown id.
pub async fn get_chunk(
    State(state): State<AppState>,
    Path(chunk_id): Path<String>,
) -> ApiResult<Json<Metadata>> {
    let id = acm_common::uuid_utils::parse(&chunk_id)
        .map_err(|_| ApiError::NotFound(format!("chunk {}", chunk_id)))?;

    let metadata = state.store.get(&id)?;
    Ok(Json(metadata))
}

/// GET /sessions/:user_id
///
/// Every chunk submitted by `user_id`; an empty array when there are none.
pub async fn list_user_chunks(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<Metadata>> {
    Json(state.store.list_by_submitter(&user_id))
}

pub fn chunk_routes() -> Router<AppState> {
    Router::new()
        .route("/chunks/:id", get(get_chunk))
        .route("/sessions/:user_id", get(list_user_chunks))
}
