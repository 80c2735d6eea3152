//! Pipeline entry points for harvester operations.
//!
//! - `guard`: completeness policy for the delete pass
//! - `reconcile`: the incremental synchronization engine
//! - `collect`: one full collection run across all scrapers

pub mod collect;
pub mod guard;
pub mod reconcile;

pub use collect::{RunReport, SourceReport, run_collection};
pub use guard::{DeletionGuard, GuardConfig, GuardDecision};
pub use reconcile::{SyncEngine, SyncSummary};
