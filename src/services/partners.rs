//! Partner directory scraper.
//!
//! One request against the CRM API. Each partner becomes a record titled
//! `category / name`, with a normalized contact card as the body so any
//! change in contact details re-identifies the record.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::models::{Record, Source};
use crate::services::{ContentScraper, ScrapeContext};
use crate::utils::{http, text};

pub struct PartnerScraper;

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    body: CategoriesBody,
}

#[derive(Debug, Deserialize)]
struct CategoriesBody {
    categories: CategoryList,
}

#[derive(Debug, Deserialize)]
struct CategoryList {
    data: Vec<PartnerCategory>,
}

#[derive(Debug, Deserialize)]
struct PartnerCategory {
    name: String,
    #[serde(default)]
    partners: Vec<Partner>,
}

#[derive(Debug, Deserialize)]
struct Partner {
    company_type: NamedRef,
    name: String,
    #[serde(default)]
    alias: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    postal_code: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
}

/// Compose the contact card body, skipping fields the CRM left blank.
fn contact_card(partner: &Partner) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !partner.company_type.name.is_empty() {
        parts.push(partner.company_type.name.clone());
    }

    let locality = [
        partner.address.as_str(),
        partner.postal_code.as_str(),
        partner.city.as_str(),
    ]
    .iter()
    .filter(|s| !s.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(", ");
    if !locality.is_empty() {
        parts.push(locality);
    }

    if !partner.phone.is_empty() {
        parts.push(format!("Tel: {}", partner.phone));
    }
    if !partner.email.is_empty() {
        parts.push(format!("Email: {}", partner.email));
    }
    if !partner.alias.is_empty() {
        parts.push(format!("Alias: {}", partner.alias));
    }

    text::collapse_whitespace(&parts.join(". "))
}

fn build_partner_records(categories: Vec<PartnerCategory>) -> Vec<Record> {
    let mut records = Vec::new();
    for category in categories {
        for partner in category.partners {
            let body = contact_card(&partner);
            if body.is_empty() {
                continue;
            }
            let title = text::collapse_whitespace(&format!("{} / {}", category.name, partner.name));
            records.push(Record::new(Source::Partners, title, body));
        }
    }
    records
}

#[async_trait]
impl ContentScraper for PartnerScraper {
    fn name(&self) -> &'static str {
        "partners"
    }

    fn sources(&self) -> &'static [Source] {
        &[Source::Partners]
    }

    async fn collect(&self, ctx: &ScrapeContext) -> Result<Vec<Record>> {
        let url = ctx.config.api.endpoint("crm/partners/categories");
        let response: CategoriesResponse = http::fetch_json(&ctx.client, &url).await?;
        Ok(build_partner_records(response.body.categories.data))
    }
}
