//! Utility functions and helpers.

pub mod http;
pub mod text;

use scraper::Selector;
use url::Url;

use crate::error::{AppError, Result};

/// Parse a CSS selector, mapping failures into the application error type.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("div.product-tile").is_ok());
        assert!(parse_selector("section:has(h2)").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
    }

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://shop.example.com/products/").unwrap();
        assert_eq!(
            resolve_url(&base, "heating/thermostats"),
            "https://shop.example.com/products/heating/thermostats"
        );
        assert_eq!(
            resolve_url(&base, "/support"),
            "https://shop.example.com/support"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }
}
