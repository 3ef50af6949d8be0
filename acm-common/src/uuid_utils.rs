//! UUID utilities
//!
//! Chunk identifiers are minted through an [`IdGenerator`]; production uses
//! random v4 UUIDs.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse UUID from string
pub fn parse(s: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}

/// Source of unique identifiers, called once per chunk
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Random UUIDv4 identifiers
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> Uuid {
        generate()
    }
}

/// Predictable identifiers `00000000-0000-0000-0000-000000000001`, `...02`, ...
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> Uuid {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(n as u128)
    }
}
