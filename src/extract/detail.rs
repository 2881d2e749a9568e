use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ExtractionFailure;
use crate::patterns::{
    AmountUnit, Confidence, PatternLink, PatternRecord, UNKNOWN, YARN_TYPES, YARN_WEIGHTS,
};

// ASCII digits only; the unit must not run on into another ASCII word character.
static GRAMS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([0-9]{2,4})\s*(grams|gram|g)(?:[^a-z0-9_]|$)")
        .expect("Failed to compile grams regex")
});

static METERS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([0-9]{2,4})\s*(meters|metres|m)(?:[^a-z0-9_]|$)")
        .expect("Failed to compile meters regex")
});

const NOTE_PARSED: &str = "Live details parsed from pattern page text.";
const NOTE_NO_AMOUNT: &str = "Amount not found in live page text; treat as approximate match.";

/// First yarn quantity mentioned on the page. Grams take priority over meters
/// regardless of position.
pub fn find_amount(text: &str) -> Option<(u32, AmountUnit)> {
    let caps = GRAMS_REGEX
        .captures(text)
        .or_else(|| METERS_REGEX.captures(text))?;

    let amount = caps[1].parse::<u32>().ok()?;
    let unit = if caps[2].to_lowercase().starts_with('m') {
        AmountUnit::Meters
    } else {
        AmountUnit::Grams
    };

    Some((amount, unit))
}

/// First term of `vocabulary` (in vocabulary order) found anywhere in `lower_text`.
pub fn find_first<'a>(lower_text: &str, vocabulary: &[&'a str]) -> Option<&'a str> {
    vocabulary
        .iter()
        .copied()
        .find(|term| lower_text.contains(term))
}

/// Infers yarn attributes from a pattern page.
#[derive(Default)]
pub struct DetailExtractor;

impl DetailExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(
        &self,
        page_text: &str,
        link: &PatternLink,
    ) -> Result<PatternRecord, ExtractionFailure> {
        let text = if super::is_html_document(page_text) {
            let visible = super::visible_text(page_text);
            if visible.is_empty() {
                return Err(ExtractionFailure::EmptyPage);
            }
            visible
        } else {
            page_text.to_string()
        };

        let lower = text.to_lowercase();
        let yarn_weight = find_first(&lower, &YARN_WEIGHTS).unwrap_or(UNKNOWN);
        let yarn_type = find_first(&lower, &YARN_TYPES).unwrap_or(UNKNOWN);

        let record = match find_amount(&text) {
            Some((amount_min, amount_unit)) => PatternRecord {
                title: link.title.clone(),
                url: link.url.clone(),
                yarn_type: yarn_type.to_string(),
                yarn_weight: yarn_weight.to_string(),
                amount_min,
                amount_unit,
                notes: NOTE_PARSED.to_string(),
                confidence: Confidence::Medium,
            },
            None => PatternRecord {
                title: link.title.clone(),
                url: link.url.clone(),
                yarn_type: yarn_type.to_string(),
                yarn_weight: yarn_weight.to_string(),
                amount_min: 0,
                amount_unit: AmountUnit::Grams,
                notes: NOTE_NO_AMOUNT.to_string(),
                confidence: Confidence::Low,
            },
        };

        Ok(record)
    }
}

/// Turns a failed candidate into its placeholder record so one bad page never
/// aborts a batch.
pub fn degrade(result: Result<PatternRecord, ExtractionFailure>, link: &PatternLink) -> PatternRecord {
    result.unwrap_or_else(|err| {
        log::warn!("candidate={} outcome=placeholder err={err}", link.url);
        PatternRecord::placeholder(link)
    })
}
