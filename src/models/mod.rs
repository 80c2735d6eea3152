// src/models/mod.rs

//! Domain models for the harvester application.

mod config;
mod record;
mod source;

// Re-export all public types
pub use config::{ApiConfig, ChunkingConfig, Config, HttpConfig, SyncConfig};
pub use record::Record;
pub use source::Source;
