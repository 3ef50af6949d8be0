//! In-memory metadata store
//!
//! Maps chunk id → [`Metadata`] with a secondary index by submitter. Both
//! maps sit behind one readers-writer lock, so a `save` is never observed
//! half-applied and readers run concurrently with each other. Nothing is
//! persisted; the store lives as long as the process.

use crate::error::{Error, Result};
use crate::models::Metadata;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
struct StoreInner {
    records: HashMap<Uuid, Metadata>,
    /// submitter id → chunk ids; always consistent with `records`
    by_submitter: HashMap<String, HashSet<Uuid>>,
}

/// Concurrent repository of chunk metadata
#[derive(Debug, Default)]
pub struct MetadataStore {
    inner: RwLock<StoreInner>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the maps half-updated
    // (every mutation below is a complete insert/remove), so poisoning is
    // recovered rather than propagated.
    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or overwrite the record keyed by `metadata.chunk_id`
    pub fn save(&self, metadata: Metadata) {
        let chunk_id = metadata.chunk_id;
        let submitter = metadata.submitter_id.clone();

        let mut inner = self.write();

        if let Some(previous) = inner.records.insert(chunk_id, metadata) {
            if previous.submitter_id != submitter {
                if let Some(ids) = inner.by_submitter.get_mut(&previous.submitter_id) {
                    ids.remove(&chunk_id);
                    if ids.is_empty() {
                        inner.by_submitter.remove(&previous.submitter_id);
                    }
                }
            }
        }

        inner
            .by_submitter
            .entry(submitter)
            .or_default()
            .insert(chunk_id);

        debug!(%chunk_id, records = inner.records.len(), "Metadata saved");
    }

    /// Exact-key lookup
    pub fn get(&self, chunk_id: &Uuid) -> Result<Metadata> {
        self.read()
            .records
            .get(chunk_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("chunk {}", chunk_id)))
    }

    /// All records submitted by `submitter_id`, in no particular order
    pub fn list_by_submitter(&self, submitter_id: &str) -> Vec<Metadata> {
        let inner = self.read();
        inner
            .by_submitter
            .get(submitter_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.records.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
