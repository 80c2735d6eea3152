//! Content source tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Origin of a scraped record.
///
/// Every record carries exactly one source tag, and the persisted store
/// keeps one reconciled set per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Documentation catalog entries from the support API
    Support,
    /// Questions and answers from the FAQ API
    Faq,
    /// Downloadable media resources
    Downloads,
    /// Training course listings from the academy API
    Courses,
    /// Partner directory entries
    Partners,
    /// Company, contact and legal information
    GeneralInfo,
    /// Product description chunks from the shop
    Products,
    /// Per-product FAQ chunks from the shop
    ProductFaq,
}

impl Source {
    /// All known sources, in reconciliation order.
    pub const ALL: [Source; 8] = [
        Source::Support,
        Source::Faq,
        Source::Downloads,
        Source::Courses,
        Source::Partners,
        Source::GeneralInfo,
        Source::Products,
        Source::ProductFaq,
    ];

    /// Stable identifier used for store keys and CLI arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Support => "support",
            Source::Faq => "faq",
            Source::Downloads => "downloads",
            Source::Courses => "courses",
            Source::Partners => "partners",
            Source::GeneralInfo => "general-info",
            Source::Products => "products",
            Source::ProductFaq => "product-faq",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown source '{s}'")))
    }
}
