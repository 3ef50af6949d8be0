//! GET /events - SSE stream of pipeline events

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    acm_common::sse::pipeline_event_stream(&state.event_bus, "acm-ingest")
}
