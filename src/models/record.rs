//! Record data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity;
use crate::models::Source;

/// A normalized unit of scraped content.
///
/// Records are immutable value objects: they are built once per scrape run
/// and either inserted into the store, left untouched (identical content
/// already persisted), or retired when the content disappears upstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Content-addressed identifier, derived from title and body
    pub content_id: String,

    /// Origin of the record
    pub source: Source,

    /// Short label; identity-bearing
    pub title: String,

    /// Free text; identity-bearing
    pub body: String,

    /// Capture timestamp; not identity-bearing. The persisted value is the
    /// time the content was first inserted, since unchanged records are
    /// never rewritten.
    pub collected_at: DateTime<Utc>,
}

impl Record {
    /// Build a record and attach its content-addressed identifier.
    ///
    /// `title` and `body` must already be normalized (trimmed, whitespace
    /// collapsed, markup stripped); the identifier hashes them as given.
    pub fn new(source: Source, title: impl Into<String>, body: impl Into<String>) -> Self {
        let title = title.into();
        let body = body.into();
        let content_id = identity::content_id([title.as_str(), body.as_str()]);

        Self {
            content_id,
            source,
            title,
            body,
            collected_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_matches_hasher() {
        let record = Record::new(Source::Faq, "How do I pair the thermostat?", "Hold set for 5s.");
        assert_eq!(
            record.content_id,
            identity::content_id(["How do I pair the thermostat?", "Hold set for 5s."])
        );
    }

    #[test]
    fn test_same_content_same_id_across_sources() {
        // The source tag is not identity-bearing; stores are partitioned
        // per source instead.
        let a = Record::new(Source::Faq, "title", "body");
        let b = Record::new(Source::Support, "title", "body");
        assert_eq!(a.content_id, b.content_id);
    }

    #[test]
    fn test_edit_changes_id() {
        let a = Record::new(Source::Support, "Install guide", "Version A");
        let b = Record::new(Source::Support, "Install guide", "Version B");
        assert_ne!(a.content_id, b.content_id);
    }
}
