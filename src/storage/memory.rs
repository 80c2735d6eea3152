//! In-memory storage implementation.
//!
//! Backs engine and runner tests, and embedding scenarios where persistence
//! is handled elsewhere. Same contract as the durable backends.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Record, Source};
use crate::storage::ContentStore;

/// In-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Source, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Source, Vec<Record>>>> {
        self.records
            .lock()
            .map_err(|_| AppError::store("memory store poisoned"))
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list_ids(&self, source: Source) -> Result<HashSet<String>> {
        let records = self.lock()?;
        Ok(records
            .get(&source)
            .map(|rs| rs.iter().map(|r| r.content_id.clone()).collect())
            .unwrap_or_default())
    }

    async fn bulk_insert(&self, source: Source, batch: &[Record]) -> Result<()> {
        let mut records = self.lock()?;
        records
            .entry(source)
            .or_default()
            .extend(batch.iter().cloned());
        Ok(())
    }

    async fn delete(&self, source: Source, content_id: &str) -> Result<()> {
        let mut records = self.lock()?;
        if let Some(rs) = records.get_mut(&source) {
            rs.retain(|r| r.content_id != content_id);
        }
        Ok(())
    }

    async fn load(&self, source: Source) -> Result<Vec<Record>> {
        let records = self.lock()?;
        Ok(records.get(&source).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryStore::new();
        let record = Record::new(Source::Courses, "Intro course", "Basics.");

        store.bulk_insert(Source::Courses, &[record.clone()]).await.unwrap();
        assert!(
            store
                .list_ids(Source::Courses)
                .await
                .unwrap()
                .contains(&record.content_id)
        );

        store.delete(Source::Courses, &record.content_id).await.unwrap();
        assert!(store.load(Source::Courses).await.unwrap().is_empty());
    }
}
