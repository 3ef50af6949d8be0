//! Chunk ingestion
//!
//! The steps both adapters share: mint a chunk (fresh id, current time),
//! hand it to the pipeline, wait for its metadata and save it to the store.
//! The adapters only translate their transport to and from these calls.

use crate::error::Result;
use crate::models::{Chunk, Metadata};
use crate::pipeline::PipelineEngine;
use crate::store::MetadataStore;
use acm_common::time::{Clock, SystemClock};
use acm_common::uuid_utils::{IdGenerator, RandomIds};
use std::sync::Arc;
use tracing::{debug, warn};

/// Submits chunks and records their metadata
#[derive(Clone)]
pub struct Ingestor {
    engine: Arc<PipelineEngine>,
    store: Arc<MetadataStore>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Ingestor {
    /// Ingestor with random v4 ids and the system clock
    pub fn new(engine: Arc<PipelineEngine>, store: Arc<MetadataStore>) -> Self {
        Self::with_sources(engine, store, Arc::new(RandomIds), Arc::new(SystemClock))
    }

    pub fn with_sources(
        engine: Arc<PipelineEngine>,
        store: Arc<MetadataStore>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            store,
            ids,
            clock,
        }
    }

    /// Build a chunk stamped with a fresh id and the current time
    pub fn mint_chunk(&self, submitter_id: &str, session_id: &str, payload: Vec<u8>) -> Chunk {
        Chunk::new(
            self.ids.next_id(),
            submitter_id,
            session_id,
            self.clock.now(),
            payload,
        )
    }

    /// Process one payload end to end and return its stored metadata
    pub async fn ingest(
        &self,
        submitter_id: &str,
        session_id: &str,
        payload: Vec<u8>,
    ) -> Result<Metadata> {
        let chunk = self.mint_chunk(submitter_id, session_id, payload);
        let chunk_id = chunk.chunk_id();
        debug!(%chunk_id, submitter_id, bytes = chunk.payload().len(), "Ingesting chunk");

        let metadata = match self.engine.process(chunk).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(%chunk_id, "Ingestion failed: {}", e);
                return Err(e);
            }
        };

        self.store.save(metadata.clone());
        Ok(metadata)
    }

    pub fn store(&self) -> &Arc<MetadataStore> {
        &self.store
    }

    pub fn engine(&self) -> &Arc<PipelineEngine> {
        &self.engine
    }
}
