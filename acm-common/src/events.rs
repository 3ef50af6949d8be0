//! Event types for the ACM event system
//!
//! The pipeline publishes lifecycle events on an [`EventBus`]. Publishing is
//! lossy: no subscriber, or a lagging subscriber, never slows the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Pipeline lifecycle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// Chunk accepted into the work queue
    ChunkQueued {
        chunk_id: Uuid,
        user_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Worker produced metadata for a chunk
    ChunkProcessed {
        chunk_id: Uuid,
        user_id: String,
        checksum: String,
        worker: usize,
        /// Time spent in the queue before a worker picked the job up
        queue_wait_ms: u64,
        /// Time spent in the transformation stage
        processing_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Transformation faulted; the job resolves with an error
    ChunkFailed {
        chunk_id: Uuid,
        worker: usize,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Workers stopped; `abandoned` queued jobs were never processed
    PipelineStopped {
        abandoned: usize,
        timestamp: DateTime<Utc>,
    },
}

impl PipelineEvent {
    /// SSE `event:` field value
    pub fn event_type(&self) -> &'static str {
        match self {
            PipelineEvent::ChunkQueued { .. } => "ChunkQueued",
            PipelineEvent::ChunkProcessed { .. } => "ChunkProcessed",
            PipelineEvent::ChunkFailed { .. } => "ChunkFailed",
            PipelineEvent::PipelineStopped { .. } => "PipelineStopped",
        }
    }
}

/// Broadcast bus for [`PipelineEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered per subscriber before the
    /// oldest are dropped for a lagging receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PipelineEvent) {
        let _ = self.tx.send(event);
    }
}
