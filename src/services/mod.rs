//! Source scrapers.
//!
//! Every scraper is a uniform async task: fetch one source family,
//! normalize the payload, and return a finite batch of records. Scrapers
//! may fail partially (fewer records than the source holds) without
//! signaling a fatal error; a fatal error means the whole batch is absent
//! and the source is skipped for the run.

mod courses;
mod downloads;
mod faqs;
mod info;
mod partners;
mod products;
mod support;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::{Config, Record, Source};

pub use courses::CourseScraper;
pub use downloads::DownloadsScraper;
pub use faqs::FaqScraper;
pub use info::GeneralInfoScraper;
pub use partners::PartnerScraper;
pub use products::ProductScraper;
pub use support::SupportScraper;

/// Shared dependencies handed to every scraper.
#[derive(Clone)]
pub struct ScrapeContext {
    /// API client with the vendor headers attached
    pub client: Client,
    pub config: Arc<Config>,
}

impl ScrapeContext {
    pub fn new(client: Client, config: Arc<Config>) -> Self {
        Self { client, config }
    }
}

/// A scraper for one source family.
#[async_trait]
pub trait ContentScraper: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// The sources this scraper emits records for.
    fn sources(&self) -> &'static [Source];

    /// Fetch and normalize the full batch for this run.
    async fn collect(&self, ctx: &ScrapeContext) -> Result<Vec<Record>>;
}

/// All scrapers, in run order.
pub fn all_scrapers() -> Vec<Box<dyn ContentScraper>> {
    vec![
        Box::new(SupportScraper),
        Box::new(FaqScraper),
        Box::new(DownloadsScraper),
        Box::new(CourseScraper),
        Box::new(PartnerScraper),
        Box::new(GeneralInfoScraper),
        Box::new(ProductScraper),
    ]
}
