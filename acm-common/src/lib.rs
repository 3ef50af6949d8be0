//! # ACM Common Library
//!
//! Shared code for the audio chunk metadata services:
//! - Error type (`Error`, `Result`)
//! - TOML configuration loading and config file resolution
//! - Clock and identifier sources used when chunks are minted
//! - Pipeline event types and the broadcast `EventBus`
//! - Server-Sent Events helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use events::{EventBus, PipelineEvent};
