//! Documentation catalog scraper.
//!
//! Walks the docs API three levels deep: the configured catalog lists its
//! sections, each section lists units, each unit lists entries whose
//! descriptions are HTML. Entries normalize to one record each, titled by
//! their `section / unit / entry` path.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Record, Source};
use crate::services::{ContentScraper, ScrapeContext};
use crate::utils::{http, text};

pub struct SupportScraper;

#[derive(Debug, Deserialize)]
struct CatalogsResponse {
    body: CatalogsBody,
}

#[derive(Debug, Deserialize)]
struct CatalogsBody {
    catalogs: CatalogList,
}

#[derive(Debug, Deserialize)]
struct CatalogList {
    data: Vec<Catalog>,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    iso: String,
    #[serde(default)]
    sections: Vec<SectionRef>,
}

#[derive(Debug, Deserialize)]
struct SectionRef {
    name: String,
    iso: String,
}

#[derive(Debug, Deserialize)]
struct SectionResponse {
    body: SectionBody,
}

#[derive(Debug, Deserialize)]
struct SectionBody {
    section: Section,
}

#[derive(Debug, Deserialize)]
struct Section {
    #[serde(default)]
    units: Vec<Unit>,
}

#[derive(Debug, Deserialize)]
struct Unit {
    name: String,
    #[serde(default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    name: String,
    #[serde(default)]
    description: String,
}

/// Normalize one section's units into records.
fn build_section_records(section_name: &str, section: Section) -> Vec<Record> {
    let mut records = Vec::new();
    for unit in section.units {
        for entry in unit.entries {
            let body = text::flatten_html(&entry.description);
            if body.is_empty() {
                continue;
            }
            let title = format!("{} / {} / {}", section_name, unit.name, entry.name);
            records.push(Record::new(Source::Support, title, body));
        }
    }
    records
}

#[async_trait]
impl ContentScraper for SupportScraper {
    fn name(&self) -> &'static str {
        "support"
    }

    fn sources(&self) -> &'static [Source] {
        &[Source::Support]
    }

    async fn collect(&self, ctx: &ScrapeContext) -> Result<Vec<Record>> {
        let api = &ctx.config.api;
        let delay = Duration::from_millis(ctx.config.http.request_delay_ms);

        let response: CatalogsResponse =
            http::fetch_json(&ctx.client, &api.endpoint("docs/catalogs")).await?;

        let catalog = response
            .body
            .catalogs
            .data
            .into_iter()
            .find(|c| c.iso == api.catalog_iso)
            .ok_or_else(|| {
                AppError::scrape("support", format!("catalog '{}' not found", api.catalog_iso))
            })?;

        let mut records = Vec::new();
        for section_ref in catalog.sections {
            let url = api.endpoint(&format!("docs/sections/{}", section_ref.iso));
            let response: SectionResponse = http::fetch_json(&ctx.client, &url).await?;
            records.extend(build_section_records(
                &section_ref.name,
                response.body.section,
            ));

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTION_JSON: &str = r#"
    {
        "body": {
            "section": {
                "units": [
                    {
                        "name": "Thermostats",
                        "entries": [
                            {
                                "name": "Pairing",
                                "description": "<h2>Steps</h2><ul><li>Open the app</li><li>Tap pair</li></ul>"
                            },
                            {
                                "name": "Empty entry",
                                "description": ""
                            }
                        ]
                    }
                ]
            }
        }
    }
    "#;

    #[test]
    fn test_build_section_records() {
        let response: SectionResponse = serde_json::from_str(SECTION_JSON).unwrap();
        let records = build_section_records("Control units", response.body.section);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, Source::Support);
        assert_eq!(records[0].title, "Control units / Thermostats / Pairing");
        assert_eq!(records[0].body, "Steps: 1) Open the app 2) Tap pair");
    }

    #[test]
    fn test_catalog_listing_parses() {
        let json = r#"
        {
            "body": {
                "catalogs": {
                    "data": [
                        {
                            "iso": "KB_CLOUD",
                            "sections": [
                                { "name": "Control units", "iso": "SEC_CTRL" }
                            ]
                        }
                    ]
                }
            }
        }
        "#;
        let response: CatalogsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.body.catalogs.data[0].iso, "KB_CLOUD");
        assert_eq!(response.body.catalogs.data[0].sections[0].iso, "SEC_CTRL");
    }
}
