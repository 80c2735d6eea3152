//! Downloadable media scraper.
//!
//! Lists the media groups, then each group's classes and resources. A
//! resource record's title is its `group / class / name [kind]` path and
//! its body is the download URL, so a re-published file (new URL) shows up
//! as changed content.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::models::{Record, Source};
use crate::services::{ContentScraper, ScrapeContext};
use crate::utils::{http, text};

pub struct DownloadsScraper;

#[derive(Debug, Deserialize)]
struct GroupsResponse {
    body: GroupsBody,
}

#[derive(Debug, Deserialize)]
struct GroupsBody {
    media_groups: Vec<GroupRef>,
}

#[derive(Debug, Deserialize)]
struct GroupRef {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct GroupResponse {
    body: GroupBody,
}

#[derive(Debug, Deserialize)]
struct GroupBody {
    media_group: MediaGroup,
}

#[derive(Debug, Deserialize)]
struct MediaGroup {
    #[serde(default)]
    classes: Vec<MediaClass>,
}

#[derive(Debug, Deserialize)]
struct MediaClass {
    name: String,
    #[serde(default)]
    resources: Vec<MediaResource>,
}

#[derive(Debug, Deserialize)]
struct MediaResource {
    name: String,
    #[serde(default)]
    kind: String,
    url: String,
}

/// Normalize one group's classes into records.
fn build_group_records(group_name: &str, group: MediaGroup) -> Vec<Record> {
    let mut records = Vec::new();
    for class in group.classes {
        for resource in class.resources {
            if resource.url.is_empty() {
                continue;
            }
            let title = text::collapse_whitespace(&format!(
                "{} / {} / {} [{}]",
                group_name, class.name, resource.name, resource.kind
            ));
            records.push(Record::new(Source::Downloads, title, resource.url));
        }
    }
    records
}

#[async_trait]
impl ContentScraper for DownloadsScraper {
    fn name(&self) -> &'static str {
        "downloads"
    }

    fn sources(&self) -> &'static [Source] {
        &[Source::Downloads]
    }

    async fn collect(&self, ctx: &ScrapeContext) -> Result<Vec<Record>> {
        let api = &ctx.config.api;
        let delay = Duration::from_millis(ctx.config.http.request_delay_ms);

        let groups: GroupsResponse =
            http::fetch_json(&ctx.client, &api.endpoint("media/groups")).await?;

        let mut records = Vec::new();
        for group_ref in groups.body.media_groups {
            let url = api.endpoint(&format!("media/groups/{}", group_ref.id));
            let response: GroupResponse = http::fetch_json(&ctx.client, &url).await?;
            records.extend(build_group_records(
                &group_ref.name,
                response.body.media_group,
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

    #[test]
    fn test_build_group_records() {
        let json = r#"
        {
            "body": {
                "media_group": {
                    "classes": [
                        {
                            "name": "Manuals",
                            "resources": [
                                {
                                    "name": "Wall thermostat",
                                    "kind": "PDF",
                                    "url": "https://cdn.example.com/manuals/wall-thermostat.pdf"
                                },
                                {
                                    "name": "Broken entry",
                                    "kind": "PDF",
                                    "url": ""
                                }
                            ]
                        }
                    ]
                }
            }
        }
        "#;
        let response: GroupResponse = serde_json::from_str(json).unwrap();
        let records = build_group_records("Documentation", response.body.media_group);

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].title,
            "Documentation / Manuals / Wall thermostat [PDF]"
        );
        assert_eq!(
            records[0].body,
            "https://cdn.example.com/manuals/wall-thermostat.pdf"
        );
    }

    #[test]
    fn test_republished_url_changes_identity() {
        let resource = |url: &str| MediaGroup {
            classes: vec![MediaClass {
                name: "Manuals".into(),
                resources: vec![MediaResource {
                    name: "Guide".into(),
                    kind: "PDF".into(),
                    url: url.into(),
                }],
            }],
        };

        let a = build_group_records("Docs", resource("https://cdn.example.com/v1.pdf"));
        let b = build_group_records("Docs", resource("https://cdn.example.com/v2.pdf"));
        assert_ne!(a[0].content_id, b[0].content_id);
    }
}
