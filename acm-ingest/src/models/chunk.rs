//! Submitted audio chunk
//!
//! A chunk is minted exactly once by an ingestion adapter: the identifier and
//! timestamp are fixed at construction and there are no setters. The payload
//! is never serialized.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// One submitted binary segment plus its provenance
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    chunk_id: Uuid,
    submitter_id: String,
    session_id: String,
    submitted_at: DateTime<Utc>,
    payload: Vec<u8>,
}

impl Chunk {
    pub fn new(
        chunk_id: Uuid,
        submitter_id: impl Into<String>,
        session_id: impl Into<String>,
        submitted_at: DateTime<Utc>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            chunk_id,
            submitter_id: submitter_id.into(),
            session_id: session_id.into(),
            submitted_at,
            payload: payload.into(),
        }
    }

    pub fn chunk_id(&self) -> Uuid {
        self.chunk_id
    }

    pub fn submitter_id(&self) -> &str {
        &self.submitter_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

// Payload bytes stay out of logs
impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("chunk_id", &self.chunk_id)
            .field("submitter_id", &self.submitter_id)
            .field("session_id", &self.session_id)
            .field("submitted_at", &self.submitted_at)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}
