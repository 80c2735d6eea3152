//! Storage abstractions for record persistence.
//!
//! The store keeps one reconciled document per source:
//!
//! ```text
//! {root}/
//! └── sources/
//!     ├── support.json
//!     ├── faq.json
//!     └── ...
//! ```
//!
//! Each primitive stands alone; there is no multi-statement transaction.
//! Callers must serialize writes per source (the collection runner never
//! reconciles the same source twice concurrently).

pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Record, Source};

// Re-export for convenience
pub use local::LocalStore;
pub use memory::MemoryStore;
#[cfg(feature = "s3")]
pub use s3::S3Store;

/// On-disk document for one source's reconciled record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceData {
    /// ISO 8601 timestamp of last update
    pub updated_at: DateTime<Utc>,
    /// Total record count
    pub count: usize,
    /// The records array
    pub records: Vec<Record>,
}

impl SourceData {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: records.len(),
            records,
        }
    }
}

/// Trait for record storage backends.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read the full set of content identifiers persisted for a source.
    ///
    /// One bulk read regardless of set size; the sync engine diffs against
    /// this snapshot.
    async fn list_ids(&self, source: Source) -> Result<HashSet<String>>;

    /// Insert a batch of records for a source.
    ///
    /// Best-effort: a failure may leave earlier records inserted. Re-running
    /// converges because identifiers are content-addressed.
    async fn bulk_insert(&self, source: Source, records: &[Record]) -> Result<()>;

    /// Delete a single record by identifier. Deleting an identifier that is
    /// no longer present is not an error.
    async fn delete(&self, source: Source, content_id: &str) -> Result<()>;

    /// Load all records persisted for a source.
    async fn load(&self, source: Source) -> Result<Vec<Record>>;
}

/// Storage key for a source document, shared by the file and S3 backends.
pub(crate) fn source_key(source: Source) -> String {
    format!("sources/{}.json", source.as_str())
}
