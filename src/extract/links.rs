use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Config;
use crate::patterns::{dedupe_by_url, PatternLink};

static WHITESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));

/// Collapses whitespace, drops a trailing "| <site name>" and trims.
pub fn sanitize_title(title: &str, site_suffix: &Regex) -> String {
    let collapsed = WHITESPACE_REGEX.replace_all(title, " ");
    site_suffix.replace(collapsed.trim(), "").trim().to_string()
}

fn site_suffix_regex(site_name: &str) -> Regex {
    Regex::new(&format!(r"(?i)\s*\|\s*{}$", regex::escape(site_name.trim())))
        .expect("escaped site name is a valid regex")
}

/// Finds pattern links on a listing page.
pub struct LinkExtractor {
    markdown_link: Regex,
    site_suffix: Regex,
    product_prefix: String,
    base_url: Option<url::Url>,
}

impl LinkExtractor {
    /// `product_prefix` is the product URL without scheme, e.g. `www.example.com/en/products/`.
    pub fn new(product_prefix: &str, site_name: &str, base_url: Option<&str>) -> Self {
        let markdown_link = Regex::new(&format!(
            r"(?i)\[(.*?)\]\((https?://{}[^)]+)\)",
            regex::escape(product_prefix)
        ))
        .expect("escaped product prefix is a valid regex");

        Self {
            markdown_link,
            site_suffix: site_suffix_regex(site_name),
            product_prefix: product_prefix.to_lowercase(),
            base_url: base_url.and_then(|u| url::Url::parse(u).ok()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.product_prefix,
            &config.site_name,
            Some(&config.listing_url),
        )
    }

    pub fn sanitize_title(&self, title: &str) -> String {
        sanitize_title(title, &self.site_suffix)
    }

    /// Markdown links and, when the payload is a raw document, HTML anchors,
    /// in order of appearance. Deduplicated by URL in first-seen order.
    pub fn extract(&self, text: &str) -> Vec<PatternLink> {
        let mut found: Vec<(usize, PatternLink)> = self
            .markdown_link
            .captures_iter(text)
            .filter_map(|caps| {
                let start = caps.get(0)?.start();
                let link = PatternLink {
                    title: self.sanitize_title(&caps[1]),
                    url: caps[2].to_string(),
                };
                Some((start, link))
            })
            .collect();

        if super::is_html_document(text) {
            found.extend(self.extract_anchors(text));
        }

        found.sort_by_key(|(offset, _)| *offset);
        dedupe_by_url(found.into_iter().map(|(_, link)| link).collect())
    }

    /// Product anchors with the offset of their `href` value in `html`.
    fn extract_anchors(&self, html: &str) -> Vec<(usize, PatternLink)> {
        let document = scraper::Html::parse_document(html);
        let anchor_selector = scraper::Selector::parse("a[href]").expect("static selector");

        let mut links = Vec::new();
        let mut cursor = 0;
        for anchor in document.select(&anchor_selector) {
            let raw_href = anchor.attr("href").unwrap_or_default();

            // Anchors come in document order, so each href is searched after the previous one.
            if let Some(pos) = html[cursor..].find(raw_href) {
                cursor += pos;
            }

            let Some(url) = self.resolve(raw_href.trim()) else {
                continue;
            };
            if !self.is_product_url(&url) {
                continue;
            }

            let text = anchor.text().collect::<Vec<_>>().join(" ");
            let label = if text.trim().is_empty() {
                anchor.attr("title").unwrap_or_default().to_string()
            } else {
                text
            };

            links.push((
                cursor,
                PatternLink {
                    title: self.sanitize_title(&label),
                    url,
                },
            ));
        }

        links
    }

    fn resolve(&self, href: &str) -> Option<String> {
        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let resolved = match &self.base_url {
            Some(base) => base.join(href).ok()?,
            None => url::Url::parse(href).ok()?,
        };

        match resolved.scheme() {
            "http" | "https" => Some(resolved.to_string()),
            _ => None,
        }
    }

    fn is_product_url(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        let rest = lower
            .strip_prefix("https://")
            .or_else(|| lower.strip_prefix("http://"))
            .unwrap_or(&lower);
        rest.len() > self.product_prefix.len() && rest.starts_with(&self.product_prefix)
    }
}
