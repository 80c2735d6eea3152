//! Training course scraper.
//!
//! One request against the academy API. Course descriptions open with a
//! promotional paragraph (bold signup blurb) that is dropped before
//! normalization, and webinar listings prefix their description with the
//! word "Webinar", which is stripped as well.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Node};
use serde::Deserialize;

use crate::error::Result;
use crate::models::{Record, Source};
use crate::services::{ContentScraper, ScrapeContext};
use crate::utils::{http, parse_selector, text};

pub struct CourseScraper;

#[derive(Debug, Deserialize)]
struct CoursesResponse {
    body: CoursesBody,
}

#[derive(Debug, Deserialize)]
struct CoursesBody {
    #[serde(default)]
    courses: Vec<Course>,
}

#[derive(Debug, Deserialize)]
struct Course {
    title: String,
    category: CourseTag,
    profile: CourseTag,
    mode: CourseTag,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct CourseTag {
    iso: String,
}

/// Flatten a course description, dropping the leading promo paragraph.
fn course_description(html: &str) -> Result<String> {
    let fragment = Html::parse_fragment(html);
    let strong = parse_selector("strong")?;

    let mut kept = String::new();
    let mut promo_skipped = false;
    for node in fragment.root_element().children() {
        if let Some(element) = ElementRef::wrap(node) {
            if !promo_skipped
                && element.value().name() == "p"
                && element.select(&strong).next().is_some()
            {
                promo_skipped = true;
                continue;
            }
            kept.push_str(&element.html());
        } else if let Node::Text(t) = node.value() {
            kept.push_str(t);
        }
    }

    let flattened = text::flatten_html(&kept);
    let cleaned = flattened
        .strip_prefix("Webinar")
        .map(str::trim_start)
        .unwrap_or(&flattened);
    Ok(cleaned.to_string())
}

fn build_course_records(courses: Vec<Course>) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for course in courses {
        let body = course_description(&course.description)?;
        if body.is_empty() {
            continue;
        }
        let title = format!(
            "{} ({}, {}, {})",
            text::collapse_whitespace(&course.title),
            course.category.iso.to_lowercase(),
            course.profile.iso.to_lowercase(),
            course.mode.iso.to_lowercase()
        );
        records.push(Record::new(Source::Courses, title, body));
    }
    Ok(records)
}

#[async_trait]
impl ContentScraper for CourseScraper {
    fn name(&self) -> &'static str {
        "courses"
    }

    fn sources(&self) -> &'static [Source] {
        &[Source::Courses]
    }

    async fn collect(&self, ctx: &ScrapeContext) -> Result<Vec<Record>> {
        let url = ctx.config.api.endpoint("academy/courses");
        let response: CoursesResponse = http::fetch_json(&ctx.client, &url).await?;
        build_course_records(response.body.courses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promo_paragraph_dropped() {
        let html = "<p><strong>Sign up today!</strong></p><p>Learn zoning basics.</p>";
        assert_eq!(course_description(html).unwrap(), "Learn zoning basics.");
    }

    #[test]
    fn test_webinar_prefix_stripped() {
        let html = "<p>Webinar covering installation.</p>";
        assert_eq!(course_description(html).unwrap(), "covering installation.");
    }

    #[test]
    fn test_build_course_records() {
        let json = r#"
        {
            "body": {
                "courses": [
                    {
                        "title": "Zoning fundamentals",
                        "category": { "iso": "INSTALLER" },
                        "profile": { "iso": "PRO" },
                        "mode": { "iso": "ONLINE" },
                        "description": "<p>Learn how zoning works.</p>"
                    },
                    {
                        "title": "Empty course",
                        "category": { "iso": "X" },
                        "profile": { "iso": "Y" },
                        "mode": { "iso": "Z" },
                        "description": ""
                    }
                ]
            }
        }
        "#;
        let response: CoursesResponse = serde_json::from_str(json).unwrap();
        let records = build_course_records(response.body.courses).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Zoning fundamentals (installer, pro, online)");
        assert_eq!(records[0].body, "Learn how zoning works.");
    }
}
