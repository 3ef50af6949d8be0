//! Data models for acm-ingest
//!
//! - `Chunk`: one submitted payload plus provenance, consumed once by a worker
//! - `Metadata`: the immutable record derived from a chunk

pub mod chunk;
pub mod metadata;

pub use chunk::Chunk;
pub use metadata::Metadata;
