//! GET /ws - streaming ingestion over a WebSocket
//!
//! Every text or binary message is one chunk for the `user_id`/`session_id`
//! given in the upgrade query. Messages on one connection are processed one
//! at a time, each answered with an ack frame:
//!
//! ```json
//! {"ack":true,"chunk_id":"...","metadata":{...},"transcript":"..."}
//! ```
//!
//! A failed chunk is answered with `{"ack":false,"error":"..."}`. When the
//! pipeline is shutting down the connection is closed after that frame.

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::SubmitterQuery;
use crate::error::Error;
use crate::models::Metadata;
use crate::services::Ingestor;
use crate::AppState;

/// Reply frame for one inbound message
#[derive(Debug, Clone, Serialize)]
pub struct WsReply {
    pub ack: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Connection must close after this frame
    #[serde(skip)]
    pub(crate) close: bool,
}

impl WsReply {
    fn ack(metadata: Metadata) -> Self {
        Self {
            ack: true,
            chunk_id: Some(metadata.chunk_id),
            transcript: Some(metadata.transcript.clone()),
            metadata: Some(metadata),
            error: None,
            close: false,
        }
    }

    fn failed(err: &Error) -> Self {
        Self {
            ack: false,
            chunk_id: None,
            metadata: None,
            transcript: None,
            error: Some(err.to_string()),
            close: matches!(err, Error::Shutdown),
        }
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<SubmitterQuery>,
) -> impl IntoResponse {
    let cancel = state.engine.cancellation_token().clone();
    ws.on_upgrade(move |socket| handle_socket(socket, state.ingestor, query, cancel))
}

/// Ingest one inbound payload and build its reply frame
pub async fn handle_message(
    ingestor: &Ingestor,
    query: &SubmitterQuery,
    payload: Vec<u8>,
) -> WsReply {
    match ingestor
        .ingest(&query.user_id, &query.session_id, payload)
        .await
    {
        Ok(metadata) => WsReply::ack(metadata),
        Err(e) => WsReply::failed(&e),
    }
}

async fn handle_socket(
    mut socket: WebSocket,
    ingestor: Ingestor,
    query: SubmitterQuery,
    cancel: CancellationToken,
) {
    info!(user_id = %query.user_id, session_id = %query.session_id, "WebSocket connected");
    let mut processed = 0u64;

    loop {
        let msg = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                close(&mut socket, "server shutting down").await;
                break;
            }
            msg = socket.recv() => msg,
        };

        let payload = match msg {
            Some(Ok(Message::Text(text))) => text.into_bytes(),
            Some(Ok(Message::Binary(data))) => data,
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(e)) => {
                debug!("WebSocket read failed: {}", e);
                break;
            }
        };

        let reply = handle_message(&ingestor, &query, payload).await;
        let closing = reply.close;

        let frame = match serde_json::to_string(&reply) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize WebSocket reply: {}", e);
                break;
            }
        };
        if socket.send(Message::Text(frame)).await.is_err() {
            // client disconnected
            break;
        }
        if reply.ack {
            processed += 1;
        }

        if closing {
            close(&mut socket, "server shutting down").await;
            break;
        }
    }

    info!(user_id = %query.user_id, processed, "WebSocket disconnected");
}

async fn close(socket: &mut WebSocket, reason: &'static str) {
    let frame = CloseFrame {
        code: close_code::AWAY,
        reason: reason.into(),
    };
    if socket.send(Message::Close(Some(frame))).await.is_err() {
        debug!("WebSocket already closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{PipelineConfig, PipelineEngine};
    use crate::store::MetadataStore;
    use crate::transform::Transformer;
    use acm_common::EventBus;
    use std::sync::Arc;

    fn ingestor() -> Ingestor {
        let engine = Arc::new(
            PipelineEngine::new(
                PipelineConfig::default(),
                Transformer::placeholder(),
                CancellationToken::new(),
                EventBus::new(8),
            )
            .unwrap(),
        );
        engine.start();
        Ingestor::new(engine, Arc::new(MetadataStore::new()))
    }

    fn query() -> SubmitterQuery {
        SubmitterQuery {
            user_id: "user1".to_string(),
            session_id: "sess1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_ack_frame_shape() {
        let ingestor = ingestor();

        let reply = handle_message(&ingestor, &query(), b"hello".to_vec()).await;
        let json = serde_json::to_value(&reply).unwrap();

        assert_eq!(json["ack"], true);
        assert_eq!(json["transcript"], "Hello World");
        assert_eq!(json["chunk_id"], json["metadata"]["chunk_id"]);
        assert_eq!(json["metadata"]["user_id"], "user1");
        assert_eq!(json["metadata"]["session_id"], "sess1");
        assert!(json.get("error").is_none());
        assert!(!reply.close);
    }

    #[tokio::test]
    async fn test_shutdown_reply_closes_connection() {
        let ingestor = ingestor();
        ingestor.engine().shutdown().await;

        let reply = handle_message(&ingestor, &query(), b"x".to_vec()).await;
        let json = serde_json::to_value(&reply).unwrap();

        assert_eq!(json["ack"], false);
        assert!(json["error"].as_str().unwrap().contains("shutting down"));
        assert!(json.get("metadata").is_none());
        assert!(json.get("close").is_none());
        assert!(reply.close);
    }
}
