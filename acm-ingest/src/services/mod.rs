//! Transport-agnostic services used by the HTTP and WebSocket adapters

pub mod ingestor;

pub use ingestor::Ingestor;
