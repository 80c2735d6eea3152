//! Local filesystem storage implementation.
//!
//! Keeps one JSON document per source under `{root}/sources/`. Writes are
//! atomic (write to temp file, then rename) so a crashed run never leaves a
//! half-written document behind.

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Record, Source};
use crate::storage::{ContentStore, SourceData, source_key};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Create a new LocalStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn read_records(&self, source: Source) -> Result<Vec<Record>> {
        match self.read_json::<SourceData>(&source_key(source)).await? {
            Some(data) => Ok(data.records),
            None => Ok(Vec::new()),
        }
    }

    async fn write_records(&self, source: Source, records: Vec<Record>) -> Result<()> {
        self.write_json(&source_key(source), &SourceData::new(records))
            .await
    }
}

#[async_trait]
impl ContentStore for LocalStore {
    async fn list_ids(&self, source: Source) -> Result<HashSet<String>> {
        let records = self.read_records(source).await?;
        Ok(records.into_iter().map(|r| r.content_id).collect())
    }

    async fn bulk_insert(&self, source: Source, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut existing = self.read_records(source).await?;
        existing.extend(records.iter().cloned());
        self.write_records(source, existing).await
    }

    async fn delete(&self, source: Source, content_id: &str) -> Result<()> {
        let mut records = self.read_records(source).await?;
        let before = records.len();
        records.retain(|r| r.content_id != content_id);

        if records.len() == before {
            // Already gone; nothing to rewrite.
            return Ok(());
        }
        self.write_records(source, records).await
    }

    async fn load(&self, source: Source) -> Result<Vec<Record>> {
        self.read_records(source).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(title: &str) -> Record {
        Record::new(Source::Faq, title, "body")
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.write_bytes("test.txt", b"hello").await.unwrap();
        let data = store.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let data = store.read_bytes("nope.txt").await.unwrap();
        assert!(data.is_none());
    }

    #[tokio::test]
    async fn test_missing_source_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        assert!(store.list_ids(Source::Support).await.unwrap().is_empty());
        assert!(store.load(Source::Support).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_then_list() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let records = vec![record("one"), record("two")];
        store.bulk_insert(Source::Faq, &records).await.unwrap();

        let ids = store.list_ids(Source::Faq).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&records[0].content_id));
        assert!(ids.contains(&records[1].content_id));
    }

    #[tokio::test]
    async fn test_delete_one() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let records = vec![record("keep"), record("drop")];
        store.bulk_insert(Source::Faq, &records).await.unwrap();
        store
            .delete(Source::Faq, &records[1].content_id)
            .await
            .unwrap();

        let remaining = store.load(Source::Faq).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "keep");
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_ok() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        assert!(store.delete(Source::Faq, "no-such-id").await.is_ok());
    }

    #[tokio::test]
    async fn test_sources_are_isolated() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.bulk_insert(Source::Faq, &[record("a")]).await.unwrap();
        assert!(store.list_ids(Source::Support).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_source_document_has_header() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.bulk_insert(Source::Faq, &[record("a")]).await.unwrap();
        let data: SourceData = store
            .read_json(&source_key(Source::Faq))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(data.count, 1);
        assert_eq!(data.records.len(), 1);
    }
}
