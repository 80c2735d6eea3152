//! FAQ scraper.
//!
//! Fetches every FAQ group and pages through its questions. The question
//! is the record title, the flattened answer the body.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::models::{Record, Source};
use crate::services::{ContentScraper, ScrapeContext};
use crate::utils::{http, text};

pub struct FaqScraper;

#[derive(Debug, Deserialize)]
struct GroupsResponse {
    body: GroupsBody,
}

#[derive(Debug, Deserialize)]
struct GroupsBody {
    groups: Vec<FaqGroup>,
}

#[derive(Debug, Deserialize)]
struct FaqGroup {
    name: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct FaqsResponse {
    body: FaqsBody,
}

#[derive(Debug, Deserialize)]
struct FaqsBody {
    faqs: FaqPage,
}

#[derive(Debug, Deserialize)]
struct FaqPage {
    last_page: u32,
    #[serde(default)]
    data: Vec<Faq>,
}

#[derive(Debug, Deserialize)]
struct Faq {
    question: String,
    #[serde(default)]
    answer: String,
}

/// Normalize one page of questions into records.
fn build_faq_records(faqs: Vec<Faq>) -> Vec<Record> {
    faqs.into_iter()
        .filter_map(|faq| {
            let title = text::collapse_whitespace(&faq.question);
            let body = text::flatten_html(&faq.answer);
            if title.is_empty() || body.is_empty() {
                return None;
            }
            Some(Record::new(Source::Faq, title, body))
        })
        .collect()
}

#[async_trait]
impl ContentScraper for FaqScraper {
    fn name(&self) -> &'static str {
        "faqs"
    }

    fn sources(&self) -> &'static [Source] {
        &[Source::Faq]
    }

    async fn collect(&self, ctx: &ScrapeContext) -> Result<Vec<Record>> {
        let api = &ctx.config.api;
        let delay = Duration::from_millis(ctx.config.http.request_delay_ms);
        let faqs_url = api.endpoint("docs/faqs");

        let groups: GroupsResponse =
            http::fetch_json(&ctx.client, &api.endpoint("docs/faq-groups")).await?;

        let mut records = Vec::new();
        for group in groups.body.groups {
            log::debug!("Fetching FAQ group '{}'", group.name);

            let first: FaqsResponse = http::fetch_json_with_query(
                &ctx.client,
                &faqs_url,
                &[("group", group.reference.clone()), ("page", "1".to_string())],
            )
            .await?;

            let last_page = first.body.faqs.last_page;
            records.extend(build_faq_records(first.body.faqs.data));

            for page in 2..=last_page {
                let response: FaqsResponse = http::fetch_json_with_query(
                    &ctx.client,
                    &faqs_url,
                    &[("group", group.reference.clone()), ("page", page.to_string())],
                )
                .await?;
                records.extend(build_faq_records(response.body.faqs.data));

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Ok(records)
    }
}
