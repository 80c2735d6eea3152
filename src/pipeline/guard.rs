//! Deletion guard for reconciliation.
//!
//! Under content-addressed sync the batch is truth: anything persisted but
//! absent from the batch gets deleted. A scrape that only partially
//! completed would therefore wipe records for content that still exists
//! upstream. The guard compares the batch size against the persisted count
//! and defers the delete pass when the drop looks like a failed scrape
//! rather than a real removal. Inserts are never blocked; they are
//! idempotent and always safe.

use serde::{Deserialize, Serialize};

use crate::models::SyncConfig;

/// Guard configuration.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Maximum allowed shrink percentage (0-100). Default: 20%
    pub max_drop_percent: u8,
    /// Minimum persisted count before the guard applies.
    /// Below this threshold deletions always proceed (cold starts and
    /// near-empty sources reconcile freely).
    pub min_baseline: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_drop_percent: 20,
            min_baseline: 10,
        }
    }
}

impl From<&SyncConfig> for GuardConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            max_drop_percent: config.max_drop_percent,
            min_baseline: config.min_baseline,
        }
    }
}

/// Outcome of the guard check for one reconcile call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GuardDecision {
    /// Safe to delete
    Allow,
    /// Persisted set below baseline; deletions proceed unconditionally
    ColdStart,
    /// Batch shrank too far; skip the delete pass this run
    Deferred {
        batch_count: usize,
        existing_count: usize,
        drop_percent: f64,
    },
}

impl GuardDecision {
    /// Whether the delete pass may run.
    pub fn deletions_allowed(&self) -> bool {
        !matches!(self, GuardDecision::Deferred { .. })
    }
}

/// Guard deciding whether a batch is complete enough to drive deletions.
#[derive(Debug, Clone, Default)]
pub struct DeletionGuard {
    config: GuardConfig,
}

impl DeletionGuard {
    /// Create a guard with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a guard with custom configuration.
    pub fn with_config(config: GuardConfig) -> Self {
        Self { config }
    }

    /// Check a deduplicated batch against the persisted count.
    pub fn check(&self, batch_count: usize, existing_count: usize) -> GuardDecision {
        if existing_count < self.config.min_baseline {
            return GuardDecision::ColdStart;
        }

        if batch_count < existing_count {
            let drop = existing_count - batch_count;
            let drop_percent = (drop as f64 / existing_count as f64) * 100.0;

            if drop_percent > self.config.max_drop_percent as f64 {
                return GuardDecision::Deferred {
                    batch_count,
                    existing_count,
                    drop_percent,
                };
            }
        }

        GuardDecision::Allow
    }
}
