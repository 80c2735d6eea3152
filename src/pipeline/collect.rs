//! Collection runner.
//!
//! Runs every scraper as a uniform async task, groups the collected
//! records by source, and reconciles each source exactly once per run.
//! One source failing never blocks the others, and a failed scraper never
//! produces an empty batch — its sources are simply not reconciled, so a
//! broken fetch can never masquerade as "everything was removed upstream".

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Record, Source};
use crate::pipeline::reconcile::{SyncEngine, SyncSummary};
use crate::services::{ContentScraper, ScrapeContext};
use crate::storage::ContentStore;

/// Outcome for one source within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: Source,
    /// Records collected before reconciliation (0 when the scrape failed)
    pub collected: usize,
    /// Sync counts, absent when the source was not reconciled
    pub summary: Option<SyncSummary>,
    /// Scrape or reconcile error, verbatim
    pub error: Option<String>,
}

/// Aggregate result of one collection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    pub fn total_inserted(&self) -> usize {
        self.sources
            .iter()
            .filter_map(|s| s.summary.as_ref())
            .map(|s| s.inserted)
            .sum()
    }

    pub fn total_removed(&self) -> usize {
        self.sources
            .iter()
            .filter_map(|s| s.summary.as_ref())
            .map(|s| s.removed)
            .sum()
    }

    /// Sources that failed to scrape or reconcile.
    pub fn failed_sources(&self) -> Vec<Source> {
        self.sources
            .iter()
            .filter(|s| s.error.is_some())
            .map(|s| s.source)
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.sources.iter().any(|s| s.error.is_some())
    }
}

/// Run the given scrapers and reconcile their output per source.
pub async fn run_collection(
    ctx: &ScrapeContext,
    store: &dyn ContentStore,
    engine: &SyncEngine,
    scrapers: &[Box<dyn ContentScraper>],
) -> Result<RunReport> {
    let started_at = Utc::now();
    log::info!("Starting collection run with {} scrapers", scrapers.len());

    // Await all scraper tasks together; each failure is contained.
    let outcomes = join_all(scrapers.iter().map(|scraper| async move {
        let result = scraper.collect(ctx).await;
        (scraper.name(), scraper.sources(), result)
    }))
    .await;

    let mut batches: BTreeMap<Source, Vec<Record>> = BTreeMap::new();
    let mut failures: BTreeMap<Source, String> = BTreeMap::new();

    for (name, sources, result) in outcomes {
        match result {
            Ok(records) => {
                log::info!("Scraper '{name}' collected {} records", records.len());
                // A scraper may legitimately return nothing for one of its
                // sources; an empty batch still reconciles (the deletion
                // guard bounds the damage if the emptiness was a failure).
                for source in sources {
                    batches.entry(*source).or_default();
                }
                for record in records {
                    batches.entry(record.source).or_default().push(record);
                }
            }
            Err(e) => {
                log::error!("Scraper '{name}' failed: {e}");
                for source in sources {
                    failures.insert(*source, e.to_string());
                }
            }
        }
    }

    let mut reports = Vec::new();

    // Sequential per source: the same source is never reconciled twice
    // concurrently.
    for (source, batch) in batches {
        let collected = batch.len();
        match engine.reconcile(store, source, batch).await {
            Ok(summary) => reports.push(SourceReport {
                source,
                collected,
                summary: Some(summary),
                error: None,
            }),
            Err(e) => {
                log::error!("Reconcile failed for {source}: {e}");
                reports.push(SourceReport {
                    source,
                    collected,
                    summary: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    for (source, error) in failures {
        reports.push(SourceReport {
            source,
            collected: 0,
            summary: None,
            error: Some(error),
        });
    }

    reports.sort_by_key(|r| r.source);

    let report = RunReport {
        started_at,
        finished_at: Utc::now(),
        sources: reports,
    };

    log::info!(
        "Collection run finished: {} inserted, {} removed, {} failed sources",
        report.total_inserted(),
        report.total_removed(),
        report.failed_sources().len()
    );

    Ok(report)
}
