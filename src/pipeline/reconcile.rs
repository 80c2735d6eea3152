//! Incremental synchronization engine.
//!
//! Reconciles a freshly scraped batch against the persisted set for the
//! same source: records whose content identifier is new are inserted,
//! persisted identifiers missing from the batch are deleted, and the
//! intersection is left untouched. Because identifiers are
//! content-addressed, re-running against unchanged upstream content is a
//! no-op, and any edit shows up as a delete plus an insert.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Record, Source};
use crate::pipeline::guard::{DeletionGuard, GuardDecision};
use crate::storage::ContentStore;

/// Counts for one reconcile call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Records inserted this run
    pub inserted: usize,
    /// Records deleted this run
    pub removed: usize,
    /// Exact duplicates dropped within the batch
    pub duplicates: usize,
    /// Per-identifier deletions that failed and were skipped
    pub delete_failures: usize,
    /// True when the deletion guard skipped the delete pass
    pub deletions_deferred: bool,
}

impl SyncSummary {
    /// Whether the call mutated the store.
    pub fn has_changes(&self) -> bool {
        self.inserted > 0 || self.removed > 0
    }
}

/// Engine reconciling scraped batches into a content store.
///
/// At most one reconcile call per source may be in flight at a time;
/// concurrent calls for different sources are safe.
#[derive(Debug, Clone, Default)]
pub struct SyncEngine {
    guard: DeletionGuard,
}

impl SyncEngine {
    /// Create an engine with the default deletion guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a custom deletion guard.
    pub fn with_guard(guard: DeletionGuard) -> Self {
        Self { guard }
    }

    /// Reconcile a batch of records against the persisted set for `source`.
    ///
    /// All records in the batch must carry the given source tag and a
    /// populated `content_id`. Aborts without mutation if the bulk read of
    /// existing identifiers fails; insert failures propagate after their
    /// partial effect (re-running converges); individual delete failures
    /// are logged, counted, and skipped.
    pub async fn reconcile(
        &self,
        store: &dyn ContentStore,
        source: Source,
        batch: Vec<Record>,
    ) -> Result<SyncSummary> {
        debug_assert!(batch.iter().all(|r| r.source == source));

        let mut summary = SyncSummary::default();

        // Within-batch dedup, first-seen wins on input order.
        let mut seen = HashSet::with_capacity(batch.len());
        let mut deduped = Vec::with_capacity(batch.len());
        for record in batch {
            if seen.insert(record.content_id.clone()) {
                deduped.push(record);
            } else {
                summary.duplicates += 1;
            }
        }

        // One bulk read; an incomplete view must never drive mutations.
        let existing = store.list_ids(source).await?;

        let to_insert: Vec<&Record> = deduped
            .iter()
            .filter(|r| !existing.contains(&r.content_id))
            .collect();
        let to_delete: Vec<&String> = existing
            .iter()
            .filter(|id| !seen.contains(*id))
            .collect();

        if !to_insert.is_empty() {
            let records: Vec<Record> = to_insert.iter().map(|r| (*r).clone()).collect();
            store.bulk_insert(source, &records).await?;
            summary.inserted = records.len();
        }

        let decision = self.guard.check(deduped.len(), existing.len());
        if let GuardDecision::Deferred {
            batch_count,
            existing_count,
            drop_percent,
        } = &decision
        {
            log::warn!(
                "[{source}] batch shrank {existing_count} -> {batch_count} \
                 ({drop_percent:.1}% drop); deferring {} deletions",
                to_delete.len()
            );
            summary.deletions_deferred = true;
        } else {
            for content_id in to_delete {
                match store.delete(source, content_id).await {
                    Ok(()) => summary.removed += 1,
                    Err(e) => {
                        summary.delete_failures += 1;
                        log::warn!("[{source}] failed to delete {content_id}: {e}");
                    }
                }
            }
        }

        log::info!(
            "[{source}] reconciled: {} inserted, {} removed, {} unchanged",
            summary.inserted,
            summary.removed,
            deduped.len() - summary.inserted
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::AppError;
    use crate::pipeline::guard::GuardConfig;
    use crate::storage::MemoryStore;

    fn record(title: &str, body: &str) -> Record {
        Record::new(Source::Faq, title, body)
    }

    async fn seed(store: &MemoryStore, records: &[Record]) {
        store.bulk_insert(Source::Faq, records).await.unwrap();
    }

    #[tokio::test]
    async fn test_cold_start_inserts_everything() {
        let store = MemoryStore::new();
        let engine = SyncEngine::new();

        let batch = vec![record("q1", "a1"), record("q2", "a2")];
        let summary = engine
            .reconcile(&store, Source::Faq, batch.clone())
            .await
            .unwrap();

        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.removed, 0);

        let ids = store.list_ids(Source::Faq).await.unwrap();
        let batch_ids: HashSet<String> =
            batch.iter().map(|r| r.content_id.clone()).collect();
        assert_eq!(ids, batch_ids);
    }

    #[tokio::test]
    async fn test_idempotent_second_run() {
        let store = MemoryStore::new();
        let engine = SyncEngine::new();
        let batch = vec![record("q1", "a1"), record("q2", "a2")];

        engine
            .reconcile(&store, Source::Faq, batch.clone())
            .await
            .unwrap();
        let second = engine.reconcile(&store, Source::Faq, batch).await.unwrap();

        assert_eq!(second.inserted, 0);
        assert_eq!(second.removed, 0);
        assert!(!second.has_changes());
    }

    #[tokio::test]
    async fn test_overlap_scenario() {
        // Persisted {h1, h2}, batch {h2, h3}: insert h3, delete h1, leave
        // h2 alone.
        let store = MemoryStore::new();
        let engine = SyncEngine::new();

        let r1 = record("one", "first");
        let r2 = record("two", "second");
        let r3 = record("three", "third");
        seed(&store, &[r1.clone(), r2.clone()]).await;

        let summary = engine
            .reconcile(&store, Source::Faq, vec![r2.clone(), r3.clone()])
            .await
            .unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.removed, 1);

        let ids = store.list_ids(Source::Faq).await.unwrap();
        assert!(!ids.contains(&r1.content_id));
        assert!(ids.contains(&r2.content_id));
        assert!(ids.contains(&r3.content_id));
    }

    #[tokio::test]
    async fn test_unchanged_record_not_rewritten() {
        let store = MemoryStore::new();
        let engine = SyncEngine::new();

        let original = record("stable", "content");
        seed(&store, &[original.clone()]).await;

        // Same content scraped later gets a fresh collected_at.
        let rescraped = record("stable", "content");
        engine
            .reconcile(&store, Source::Faq, vec![rescraped])
            .await
            .unwrap();

        let persisted = store.load(Source::Faq).await.unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].collected_at, original.collected_at);
    }

    #[tokio::test]
    async fn test_in_batch_duplicates_collapse() {
        let store = MemoryStore::new();
        let engine = SyncEngine::new();

        let batch = vec![record("q", "a"), record("q", "a"), record("q", "a")];
        let summary = engine.reconcile(&store, Source::Faq, batch).await.unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.duplicates, 2);
        assert_eq!(store.load(Source::Faq).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_is_delete_then_insert() {
        let store = MemoryStore::new();
        let engine = SyncEngine::new();

        let old = record("guide", "version A");
        seed(&store, &[old.clone()]).await;

        let new = record("guide", "version B");
        let summary = engine
            .reconcile(&store, Source::Faq, vec![new.clone()])
            .await
            .unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.removed, 1);

        let ids = store.list_ids(Source::Faq).await.unwrap();
        assert!(ids.contains(&new.content_id));
        assert!(!ids.contains(&old.content_id));
    }

    #[tokio::test]
    async fn test_guard_defers_deletions_but_inserts() {
        let store = MemoryStore::new();
        let engine = SyncEngine::with_guard(DeletionGuard::with_config(GuardConfig {
            max_drop_percent: 20,
            min_baseline: 5,
        }));

        let persisted: Vec<Record> = (0..10)
            .map(|i| record(&format!("q{i}"), "answer"))
            .collect();
        seed(&store, &persisted).await;

        // A half-failed scrape: only two old records plus one new one.
        let batch = vec![
            persisted[0].clone(),
            persisted[1].clone(),
            record("brand new", "answer"),
        ];
        let summary = engine.reconcile(&store, Source::Faq, batch).await.unwrap();

        assert!(summary.deletions_deferred);
        assert_eq!(summary.removed, 0);
        assert_eq!(summary.inserted, 1);
        assert_eq!(store.load(Source::Faq).await.unwrap().len(), 11);
    }

    /// Store wrapper that injects failures for specific operations.
    struct FlakyStore {
        inner: MemoryStore,
        fail_list: bool,
        fail_delete_ids: Mutex<HashSet<String>>,
    }

    impl FlakyStore {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                fail_list: false,
                fail_delete_ids: Mutex::new(HashSet::new()),
            }
        }
    }

    #[async_trait]
    impl ContentStore for FlakyStore {
        async fn list_ids(&self, source: Source) -> Result<HashSet<String>> {
            if self.fail_list {
                return Err(AppError::store("store unreachable"));
            }
            self.inner.list_ids(source).await
        }

        async fn bulk_insert(&self, source: Source, records: &[Record]) -> Result<()> {
            self.inner.bulk_insert(source, records).await
        }

        async fn delete(&self, source: Source, content_id: &str) -> Result<()> {
            if self.fail_delete_ids.lock().unwrap().contains(content_id) {
                return Err(AppError::store("delete rejected"));
            }
            self.inner.delete(source, content_id).await
        }

        async fn load(&self, source: Source) -> Result<Vec<Record>> {
            self.inner.load(source).await
        }
    }

    #[tokio::test]
    async fn test_list_failure_aborts_without_mutation() {
        let mut store = FlakyStore::new(MemoryStore::new());
        store
            .inner
            .bulk_insert(Source::Faq, &[record("kept", "safe")])
            .await
            .unwrap();
        store.fail_list = true;

        let engine = SyncEngine::new();
        let result = engine
            .reconcile(&store, Source::Faq, vec![record("new", "data")])
            .await;

        assert!(result.is_err());
        assert_eq!(store.inner.load(Source::Faq).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failures_are_skipped_and_counted() {
        let store = FlakyStore::new(MemoryStore::new());
        let stale_a = record("stale a", "x");
        let stale_b = record("stale b", "y");
        let kept = record("kept", "z");
        store
            .inner
            .bulk_insert(Source::Faq, &[stale_a.clone(), stale_b.clone(), kept.clone()])
            .await
            .unwrap();
        store
            .fail_delete_ids
            .lock()
            .unwrap()
            .insert(stale_a.content_id.clone());

        let engine = SyncEngine::new();
        let summary = engine
            .reconcile(&store, Source::Faq, vec![kept.clone()])
            .await
            .unwrap();

        // One delete failed and was skipped; the other went through.
        assert_eq!(summary.delete_failures, 1);
        assert_eq!(summary.removed, 1);

        let ids = store.inner.list_ids(Source::Faq).await.unwrap();
        assert!(ids.contains(&stale_a.content_id));
        assert!(!ids.contains(&stale_b.content_id));
    }
}
