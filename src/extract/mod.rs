pub mod detail;
pub mod links;

pub use detail::{degrade, DetailExtractor};
pub use links::LinkExtractor;

use once_cell::sync::Lazy;
use regex::Regex;

static HTML_DOCUMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(!doctype\s+html|html[\s>]|body[\s>])")
        .expect("Failed to compile html document regex")
});

/// Whether a payload is a raw HTML document rather than reader-proxy text.
pub fn is_html_document(text: &str) -> bool {
    HTML_DOCUMENT_REGEX.is_match(text)
}

/// Visible text of an HTML document: body text nodes outside of
/// script/style/noscript, joined by single spaces.
pub fn visible_text(html: &str) -> String {
    let document = scraper::Html::parse_document(html);
    let body_selector = scraper::Selector::parse("body").expect("static selector");

    let root = match document.select(&body_selector).next() {
        Some(body) => body,
        None => document.root_element(),
    };

    let mut parts = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|el| el.name()))
            .is_some_and(|name| matches!(name, "script" | "style" | "noscript" | "template"));
        if hidden {
            continue;
        }

        let text = text.trim();
        if !text.is_empty() {
            parts.push(text);
        }
    }

    parts.join(" ")
}
