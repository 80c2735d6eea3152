//! AWS S3 storage implementation.
//!
//! Stores each source document at `{prefix}/sources/{source}.json`. Used by
//! the Lambda deployment; the document format matches the local backend so
//! the two are interchangeable.

use std::collections::HashSet;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::models::{Record, Source};
use crate::storage::{ContentStore, SourceData, source_key};

/// S3-based record storage.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Store {
    /// Create a new S3 store.
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Create an S3 store from environment configuration.
    pub async fn from_env() -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);

        let bucket = std::env::var("S3_BUCKET").unwrap_or_else(|_| "zephyr-content".to_string());
        let prefix = std::env::var("S3_PREFIX").unwrap_or_else(|_| "harvester".to_string());

        Ok(Self::new(client, bucket, prefix))
    }

    fn key(&self, relative: &str) -> String {
        format!("{}/{}", self.prefix.trim_end_matches('/'), relative)
    }

    /// Read an object, returning None if the key does not exist.
    pub async fn read_bytes_optional(&self, relative: &str) -> Result<Option<Vec<u8>>> {
        let key = self.key(relative);
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(AppError::store)?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::info!("No existing data at s3://{}/{}", self.bucket, key);
                    Ok(None)
                } else {
                    Err(AppError::store(service_err))
                }
            }
        }
    }

    async fn write_bytes(&self, relative: &str, bytes: Vec<u8>) -> Result<()> {
        let key = self.key(relative);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| AppError::store(e.into_service_error()))?;
        Ok(())
    }

    async fn read_records(&self, source: Source) -> Result<Vec<Record>> {
        match self.read_bytes_optional(&source_key(source)).await? {
            Some(bytes) => {
                let data: SourceData = serde_json::from_slice(&bytes)?;
                Ok(data.records)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn write_records(&self, source: Source, records: Vec<Record>) -> Result<()> {
        let data = SourceData::new(records);
        let bytes = serde_json::to_vec_pretty(&data)?;
        self.write_bytes(&source_key(source), bytes).await?;
        log::info!(
            "Wrote {} records to s3://{}/{}",
            data.count,
            self.bucket,
            self.key(&source_key(source))
        );
        Ok(())
    }
}

#[async_trait]
impl ContentStore for S3Store {
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
            return Ok(());
        }
        self.write_records(source, records).await
    }

    async fn load(&self, source: Source) -> Result<Vec<Record>> {
        self.read_records(source).await
    }
}
