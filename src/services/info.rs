//! Company information scraper.
//!
//! Three pieces feed the `general-info` source: the "about" paragraphs
//! from the translations API, the market contact sheet, and the legal
//! pages published on the shop site.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Node};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::{Record, Source};
use crate::services::{ContentScraper, ScrapeContext};
use crate::utils::{http, parse_selector, text};

pub struct GeneralInfoScraper;

/// Legal pages on the shop site: display name and path.
const LEGAL_PAGES: [(&str, &str); 4] = [
    ("Privacy policy", "privacy-policy"),
    ("Terms of use", "terms-of-use"),
    ("Legal notice", "legal-notice"),
    ("Cookie policy", "cookie-policy"),
];

#[derive(Debug, Deserialize)]
struct TranslationsResponse {
    body: TranslationsBody,
}

#[derive(Debug, Deserialize)]
struct TranslationsBody {
    about: Option<AboutSection>,
}

#[derive(Debug, Deserialize)]
struct AboutSection {
    title: String,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct MarketResponse {
    body: MarketBody,
}

#[derive(Debug, Deserialize)]
struct MarketBody {
    market: Market,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Market {
    commercial_contact: String,
    bank_name: String,
    bank_account: String,
    company: Company,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Company {
    name: String,
    address: String,
    city: String,
    postal_code: String,
    phone: String,
    tax_id: String,
    web: String,
}

/// Join the about section's `paragraphN` values in numeric order.
fn about_record(about: AboutSection) -> Option<Record> {
    let mut paragraphs: Vec<(u32, &str)> = about
        .extra
        .iter()
        .filter_map(|(key, value)| {
            let number: u32 = key.strip_prefix("paragraph")?.parse().ok()?;
            Some((number, value.as_str()?))
        })
        .collect();
    paragraphs.sort_by_key(|(number, _)| *number);

    let body = text::collapse_whitespace(
        &paragraphs
            .iter()
            .map(|(_, p)| *p)
            .collect::<Vec<_>>()
            .join(" "),
    );
    if body.is_empty() {
        return None;
    }
    Some(Record::new(Source::GeneralInfo, about.title, body))
}

/// One record per non-empty contact field.
fn market_records(market: Market) -> Vec<Record> {
    let company = market.company;
    let fields = [
        ("Commercial contact", market.commercial_contact),
        ("Bank", market.bank_name),
        ("Bank account", market.bank_account),
        ("Company", company.name),
        ("Address", company.address),
        ("City", company.city),
        ("Postal code", company.postal_code),
        ("Phone", company.phone),
        ("Tax ID", company.tax_id),
        ("Web", company.web),
    ];

    fields
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| {
            Record::new(
                Source::GeneralInfo,
                format!("Contact / {label}"),
                text::collapse_whitespace(&value),
            )
        })
        .collect()
}

/// Extract `(section name, flattened body)` pairs from a legal page.
fn parse_legal_sections(html: &str) -> Result<Vec<(String, String)>> {
    let document = Html::parse_document(html);
    let section_sel = parse_selector("div.legal-content section")?;

    let mut sections = Vec::new();
    for section in document.select(&section_sel) {
        let mut name: Option<String> = None;
        let mut inner = String::new();

        for child in section.children() {
            if let Some(element) = ElementRef::wrap(child) {
                if element.value().name() == "h2" {
                    let heading: String = element.text().collect::<Vec<_>>().join(" ");
                    name = Some(text::collapse_whitespace(&heading));
                } else {
                    inner.push_str(&element.html());
                }
            } else if let Node::Text(t) = child.value() {
                inner.push_str(t);
            }
        }

        let Some(name) = name.filter(|n| !n.is_empty()) else {
            continue;
        };
        let body = text::flatten_html(&inner);
        if !body.is_empty() {
            sections.push((name, body));
        }
    }

    Ok(sections)
}

#[async_trait]
impl ContentScraper for GeneralInfoScraper {
    fn name(&self) -> &'static str {
        "general-info"
    }

    fn sources(&self) -> &'static [Source] {
        &[Source::GeneralInfo]
    }

    async fn collect(&self, ctx: &ScrapeContext) -> Result<Vec<Record>> {
        let api = &ctx.config.api;
        let mut records = Vec::new();

        let translations_url = api.endpoint(&format!("press/translations/{}", api.locale));
        let translations: TranslationsResponse =
            http::fetch_json(&ctx.client, &translations_url).await?;
        if let Some(about) = translations.body.about {
            records.extend(about_record(about));
        }

        let market: MarketResponse =
            http::fetch_json(&ctx.client, &api.endpoint("market/current")).await?;
        records.extend(market_records(market.body.market));

        for (page_name, path) in LEGAL_PAGES {
            let html = http::fetch_html(&ctx.client, &api.shop_endpoint(path)).await?;
            for (section, body) in parse_legal_sections(&html)? {
                let title = format!("{page_name} / {section}");
                records.push(Record::new(Source::GeneralInfo, title, body));
            }
        }

        Ok(records)
    }
}
