//! Shop product scraper.
//!
//! Walks the public shop in three hops: the catalog index lists product
//! lines per category, each line page lists product tiles, and each
//! product page carries a description plus optional FAQs. Line and product
//! pages are fetched concurrently, bounded by `http.max_concurrent`; a
//! failed page is logged and skipped, never aborting the batch.
//!
//! Long descriptions and answers are split into overlapping chunks; every
//! chunk is its own record.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use regex::Regex;
use scraper::Html;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ChunkingConfig, Record, Source};
use crate::services::{ContentScraper, ScrapeContext};
use crate::utils::{http, parse_selector, resolve_url, text};

pub struct ProductScraper;

const CATEGORY_SELECTOR: &str = "section.product-category";
const CATEGORY_TITLE_SELECTOR: &str = "h3";
const LINE_LINK_SELECTOR: &str = "ul.lines li.line a";
const PRODUCT_TILE_SELECTOR: &str = "div.product-tile";
const TILE_LINK_SELECTOR: &str = "a";
const TILE_NAME_SELECTOR: &str = "h2";
const DESCRIPTION_SELECTOR: &str = "div[itemprop=\"description\"]";
const FAQ_QUESTION_SELECTOR: &str = "h3.faq";
const FAQ_ANSWER_SELECTOR: &str = "div.faq-answer";

/// A product line page discovered on the catalog index.
#[derive(Debug, Clone)]
struct ProductLine {
    category: String,
    name: String,
    url: String,
}

/// A product page discovered on a line page.
#[derive(Debug, Clone)]
struct ProductLink {
    name: String,
    url: String,
}

/// Extract product lines from the catalog index page.
fn parse_catalog_lines(html: &str, page_url: &str) -> Result<Vec<ProductLine>> {
    let document = Html::parse_document(html);
    let category_sel = parse_selector(CATEGORY_SELECTOR)?;
    let title_sel = parse_selector(CATEGORY_TITLE_SELECTOR)?;
    let link_sel = parse_selector(LINE_LINK_SELECTOR)?;
    let base = Url::parse(page_url)?;

    let mut lines = Vec::new();
    for category in document.select(&category_sel) {
        let category_name = category
            .select(&title_sel)
            .next()
            .map(|t| text::collapse_whitespace(&t.text().collect::<Vec<_>>().join(" ")))
            .unwrap_or_default();
        if category_name.is_empty() {
            continue;
        }

        for link in category.select(&link_sel) {
            let name = text::collapse_whitespace(&link.text().collect::<Vec<_>>().join(" "));
            // "View all" entries just repeat the line listings.
            if name.is_empty() || name.contains("View all") {
                continue;
            }
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            lines.push(ProductLine {
                category: category_name.clone(),
                name,
                url: resolve_url(&base, href),
            });
        }
    }
    Ok(lines)
}

/// Extract product tiles from a line page.
fn parse_product_links(html: &str, page_url: &str) -> Result<Vec<ProductLink>> {
    let document = Html::parse_document(html);
    let tile_sel = parse_selector(PRODUCT_TILE_SELECTOR)?;
    let link_sel = parse_selector(TILE_LINK_SELECTOR)?;
    let name_sel = parse_selector(TILE_NAME_SELECTOR)?;
    let base = Url::parse(page_url)?;

    let mut links = Vec::new();
    for tile in document.select(&tile_sel) {
        let Some(href) = tile
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        let name = tile
            .select(&name_sel)
            .next()
            .map(|n| text::collapse_whitespace(&n.text().collect::<Vec<_>>().join(" ")))
            .unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        links.push(ProductLink {
            name,
            url: resolve_url(&base, href),
        });
    }
    Ok(links)
}

/// Normalize one product page into description and FAQ chunk records.
fn build_product_records(
    product_name: &str,
    html: &str,
    chunking: &ChunkingConfig,
) -> Result<Vec<Record>> {
    let document = Html::parse_document(html);
    let mut records = Vec::new();

    let description_sel = parse_selector(DESCRIPTION_SELECTOR)?;
    if let Some(description) = document.select(&description_sel).next() {
        let flat = text::flatten_html(&description.inner_html());
        for chunk in text::split_into_chunks(&flat, chunking.chunk_size, chunking.chunk_overlap) {
            records.push(Record::new(Source::Products, product_name, chunk));
        }
    }

    let question_sel = parse_selector(FAQ_QUESTION_SELECTOR)?;
    let answer_sel = parse_selector(FAQ_ANSWER_SELECTOR)?;
    let table_sel = parse_selector("table")?;
    let number_prefix = Regex::new(r"^\d+\.\s*")
        .map_err(|e| AppError::scrape("products", format!("bad question regex: {e}")))?;

    let questions: Vec<String> = document
        .select(&question_sel)
        .map(|q| {
            let raw: String = q.text().collect::<Vec<_>>().join(" ");
            text::collapse_whitespace(&number_prefix.replace(raw.trim(), ""))
        })
        .filter(|q| !q.is_empty())
        .collect();

    let answers: Vec<_> = document.select(&answer_sel).collect();

    for (question, answer) in questions.iter().zip(answers) {
        // Answers rendered as tables carry no usable prose.
        if answer.select(&table_sel).next().is_some() {
            continue;
        }
        let flat = text::flatten_html(&answer.inner_html());
        for chunk in text::split_into_chunks(&flat, chunking.chunk_size, chunking.chunk_overlap) {
            records.push(Record::new(Source::ProductFaq, question.clone(), chunk));
        }
    }

    Ok(records)
}

#[async_trait]
impl ContentScraper for ProductScraper {
    fn name(&self) -> &'static str {
        "products"
    }

    fn sources(&self) -> &'static [Source] {
        &[Source::Products, Source::ProductFaq]
    }

    async fn collect(&self, ctx: &ScrapeContext) -> Result<Vec<Record>> {
        let config = &ctx.config;
        let delay = Duration::from_millis(config.http.request_delay_ms);
        let concurrency = config.http.max_concurrent.max(1);

        let index_url = config.api.shop_endpoint("products/");
        let index_html = http::fetch_html(&ctx.client, &index_url).await?;
        let lines = parse_catalog_lines(&index_html, &index_url)?;
        log::info!("Found {} product lines in the catalog", lines.len());

        // Stage 1: fetch all line pages concurrently, bounded.
        let mut line_failures = 0usize;
        let mut product_links: Vec<ProductLink> = Vec::new();
        let mut line_stream = stream::iter(lines)
            .map(|line| {
                let client = ctx.client.clone();
                async move {
                    let result = http::fetch_html(&client, &line.url).await;
                    (line, result)
                }
            })
            .buffer_unordered(concurrency);

        while let Some((line, result)) = line_stream.next().await {
            match result.and_then(|html| parse_product_links(&html, &line.url)) {
                Ok(links) => product_links.extend(links),
                Err(error) => {
                    line_failures += 1;
                    log::warn!(
                        "Failed to fetch line {} / {} ({}): {}",
                        line.category,
                        line.name,
                        line.url,
                        error
                    );
                }
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        // The same product can appear under several lines.
        let mut seen = HashSet::new();
        let deduped: Vec<ProductLink> = product_links
            .into_iter()
            .filter(|link| seen.insert(link.url.clone()))
            .collect();
        log::info!("Fetching {} product pages", deduped.len());

        // Stage 2: fetch product pages concurrently, bounded.
        let mut product_failures = 0usize;
        let mut records = Vec::new();
        let mut product_stream = stream::iter(deduped)
            .map(|link| {
                let client = ctx.client.clone();
                async move {
                    let result = http::fetch_html(&client, &link.url).await;
                    (link, result)
                }
            })
            .buffer_unordered(concurrency);

        while let Some((link, result)) = product_stream.next().await {
            match result.and_then(|html| build_product_records(&link.name, &html, &config.chunking))
            {
                Ok(product_records) => records.extend(product_records),
                Err(error) => {
                    product_failures += 1;
                    log::warn!("Failed to fetch product {} ({}): {}", link.name, link.url, error);
                }
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        if line_failures > 0 || product_failures > 0 {
            log::warn!(
                "Product scrape finished with {line_failures} line and \
                 {product_failures} product page failures"
            );
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunking() -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }

    const INDEX_HTML: &str = r#"
    <html><body><div class="catalog">
        <section class="product-category">
            <h3>Heating</h3>
            <ul class="lines">
                <li class="line"><a href="/products/heating/thermostats"><span>Thermostats</span></a></li>
                <li class="line"><a href="/products/heating/all"><span>View all</span></a></li>
            </ul>
        </section>
        <section class="product-category">
            <h3>Cooling</h3>
            <ul class="lines">
                <li class="line"><a href="/products/cooling/dampers"><span>Dampers</span></a></li>
            </ul>
        </section>
    </div></body></html>
    "#;

    #[test]
    fn test_parse_catalog_lines() {
        let lines =
            parse_catalog_lines(INDEX_HTML, "https://shop.zephyrclimate.com/products/").unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].category, "Heating");
        assert_eq!(lines[0].name, "Thermostats");
        assert_eq!(
            lines[0].url,
            "https://shop.zephyrclimate.com/products/heating/thermostats"
        );
        assert_eq!(lines[1].category, "Cooling");
    }

    #[test]
    fn test_parse_product_links() {
        let html = r#"
        <div class="product-list">
            <div class="product-tile">
                <a href="/products/p/101"><h2>Wall Thermostat Pro</h2></a>
            </div>
            <div class="product-tile">
                <a href="/products/p/102"><h2>  Duct   Damper </h2></a>
            </div>
        </div>
        "#;
        let links =
            parse_product_links(html, "https://shop.zephyrclimate.com/products/heating").unwrap();

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].name, "Wall Thermostat Pro");
        assert_eq!(links[0].url, "https://shop.zephyrclimate.com/products/p/101");
        assert_eq!(links[1].name, "Duct Damper");
    }

    #[test]
    fn test_build_product_records() {
        let html = r#"
        <html><body>
            <div itemprop="description">
                <p>Smart zoning thermostat.</p>
                <ul><li>Touch screen</li><li>Wireless</li></ul>
            </div>
            <h3 class="faq">1. How do I pair it?</h3>
            <div class="faq-answer"><p>Hold the dial for five seconds.</p></div>
            <h3 class="faq">2. Status codes</h3>
            <div class="faq-answer"><table><tr><td>E1</td></tr></table></div>
        </body></html>
        "#;
        let records = build_product_records("Wall Thermostat Pro", html, &chunking()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source, Source::Products);
        assert_eq!(records[0].title, "Wall Thermostat Pro");
        assert_eq!(
            records[0].body,
            "Smart zoning thermostat. 1) Touch screen 2) Wireless"
        );

        assert_eq!(records[1].source, Source::ProductFaq);
        assert_eq!(records[1].title, "How do I pair it?");
        assert_eq!(records[1].body, "Hold the dial for five seconds.");
    }

    #[test]
    fn test_long_description_chunks_share_title() {
        let body = format!(
            "<div itemprop=\"description\"><p>{}</p></div>",
            "Zoning keeps every room comfortable. ".repeat(60)
        );
        let config = ChunkingConfig {
            chunk_size: 400,
            chunk_overlap: 80,
        };
        let records = build_product_records("Zone Hub", &body, &config).unwrap();

        assert!(records.len() > 1);
        assert!(records.iter().all(|r| r.title == "Zone Hub"));
        // Chunks differ, so each gets its own identity.
        let ids: HashSet<_> = records.iter().map(|r| r.content_id.clone()).collect();
        assert_eq!(ids.len(), records.len());
    }
}
