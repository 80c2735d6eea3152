// src/utils/text.rs

//! Text normalization helpers.
//!
//! Scraped payloads carry HTML fragments and inconsistent whitespace. All
//! normalization happens here, before records are hashed: the identity
//! hasher operates on exactly the strings it is given.

use scraper::{ElementRef, Html, Node};
use unicode_segmentation::UnicodeSegmentation;

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace(" .", ".")
}

/// Strip all markup from an HTML fragment, keeping only its text.
pub fn strip_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Flatten an HTML fragment into readable prose.
///
/// Headings become `Heading: `, list items are numbered `1) `, links and
/// emphasis are quoted, paragraphs and bare text are kept as-is. Nested
/// structure beyond one list level is flattened to its text.
pub fn flatten_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();

    for node in fragment.root_element().children() {
        match node.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push_str(trimmed);
                    out.push(' ');
                }
            }
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(node) {
                    flatten_element(&element, &mut out);
                }
            }
            _ => {}
        }
    }

    collapse_whitespace(&out)
}

fn flatten_element(element: &ElementRef, out: &mut String) {
    let text = || {
        element
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    };

    match element.value().name() {
        "h1" | "script" | "style" => {}
        "h2" | "h3" | "h4" => {
            let heading = text();
            if !heading.is_empty() {
                out.push_str(&heading);
                out.push_str(": ");
            }
        }
        "ul" | "ol" => {
            let mut item_number = 1;
            for child in element.children() {
                let Some(li) = ElementRef::wrap(child) else {
                    continue;
                };
                if li.value().name() != "li" {
                    continue;
                }
                let item: String = li
                    .text()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if !item.is_empty() {
                    out.push_str(&format!("{item_number}) {item} "));
                    item_number += 1;
                }
            }
        }
        "a" | "em" => {
            let inner = text();
            if !inner.is_empty() {
                out.push_str(&format!("\"{inner}\" "));
            }
        }
        _ => {
            let inner = text();
            if !inner.is_empty() {
                out.push_str(&inner);
                out.push(' ');
            }
        }
    }
}

/// Split text into overlapping chunks of at most `chunk_size` grapheme
/// clusters. Consecutive chunks share `chunk_overlap` clusters so that
/// sentences cut at a boundary stay retrievable.
pub fn split_into_chunks(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    debug_assert!(chunk_overlap < chunk_size);

    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= chunk_size {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }

    let step = chunk_size - chunk_overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < graphemes.len() {
        let end = (start + chunk_size).min(graphemes.len());
        let chunk = graphemes[start..end].concat().trim().to_string();
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        if end == graphemes.len() {
            break;
        }
        start += step;
    }

    chunks
}
