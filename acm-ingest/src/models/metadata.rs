//! Derived chunk metadata
//!
//! JSON field names follow the public wire format: the submitter is
//! `user_id`, the submission time is `timestamp` and the spectral summary is
//! `fft`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Descriptive record produced from one chunk, never mutated after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Identifier of the originating chunk (unique across the store)
    pub chunk_id: Uuid,

    /// Submitter of the chunk
    #[serde(rename = "user_id")]
    pub submitter_id: String,

    pub session_id: String,

    /// Submission time of the chunk
    #[serde(rename = "timestamp")]
    pub submitted_at: DateTime<Utc>,

    /// Lowercase hex SHA-256 of the payload
    pub checksum: String,

    #[serde(rename = "fft")]
    pub spectral_summary: String,

    pub transcript: String,
}
