//! Transformation stage
//!
//! Turns a [`Chunk`] into its [`Metadata`]:
//! - **checksum**: lowercase hex SHA-256 of the payload (deterministic)
//! - **spectral summary**: produced by an injected [`SpectralAnalyzer`]
//! - **transcript**: produced by an injected [`Transcriber`]
//!
//! Provenance fields are copied unchanged from the chunk. The stage never
//! fails and keeps no reference to the payload once it returns.

pub mod spectral;
pub mod transcript;

pub use spectral::{PlaceholderSpectrum, SpectralAnalyzer};
pub use transcript::{FixedTranscript, Transcriber};

use crate::models::{Chunk, Metadata};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Hex-encoded SHA-256 of `payload`
pub fn checksum(payload: &[u8]) -> String {
    format!("{:x}", Sha256::digest(payload))
}

/// Chunk → Metadata with pluggable derived fields
#[derive(Clone)]
pub struct Transformer {
    spectral: Arc<dyn SpectralAnalyzer>,
    transcriber: Arc<dyn Transcriber>,
}

impl Transformer {
    pub fn new(spectral: Arc<dyn SpectralAnalyzer>, transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            spectral,
            transcriber,
        }
    }

    /// Production defaults: random peak placeholder and fixed transcript
    pub fn placeholder() -> Self {
        Self::new(
            Arc::new(PlaceholderSpectrum),
            Arc::new(FixedTranscript::default()),
        )
    }

    pub fn transform(&self, chunk: &Chunk) -> Metadata {
        let payload = chunk.payload();

        Metadata {
            chunk_id: chunk.chunk_id(),
            submitter_id: chunk.submitter_id().to_string(),
            session_id: chunk.session_id().to_string(),
            submitted_at: chunk.submitted_at(),
            checksum: checksum(payload),
            spectral_summary: self.spectral.summarize(payload),
            transcript: self.transcriber.transcribe(payload),
        }
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("spectral", &self.spectral.name())
            .field("transcriber", &self.transcriber.name())
            .finish()
    }
}
