use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "unknown";

/// Yarn weights, coarse to fine. Multi-word terms come first so that
/// "super bulky" wins over "bulky".
pub const YARN_WEIGHTS: [&str; 8] = [
    "super bulky",
    "bulky",
    "aran",
    "worsted",
    "dk",
    "sport",
    "fingering",
    "lace",
];

pub const YARN_TYPES: [&str; 8] = [
    "acrylic", "alpaca", "cashmere", "cotton", "linen", "merino", "mohair", "wool",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AmountUnit {
    #[default]
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "m")]
    Meters,
}

impl AmountUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmountUnit::Grams => "g",
            AmountUnit::Meters => "m",
        }
    }
}

impl fmt::Display for AmountUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AmountUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "g" | "gram" | "grams" => Ok(AmountUnit::Grams),
            "m" | "meter" | "meters" | "metre" | "metres" => Ok(AmountUnit::Meters),
            other => Err(format!("unknown amount unit {other:?}, expected g or m")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    Low,
    Medium,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => f.write_str("low"),
            Confidence::Medium => f.write_str("medium"),
        }
    }
}

/// A candidate pattern found on the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternLink {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRecord {
    pub title: String,
    pub url: String,
    pub yarn_type: String,
    pub yarn_weight: String,
    pub amount_min: u32,
    pub amount_unit: AmountUnit,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub confidence: Confidence,
}

impl PatternRecord {
    /// Stand-in for a candidate whose page could not be fetched or parsed.
    pub fn placeholder(link: &PatternLink) -> Self {
        Self {
            title: link.title.clone(),
            url: link.url.clone(),
            yarn_type: UNKNOWN.to_string(),
            yarn_weight: UNKNOWN.to_string(),
            amount_min: 0,
            amount_unit: AmountUnit::Grams,
            notes: "Could not parse yarn details from live page.".to_string(),
            confidence: Confidence::Low,
        }
    }
}

/// Anything that carries a URL identity.
pub trait HasUrl {
    fn url(&self) -> &str;
}

impl HasUrl for PatternLink {
    fn url(&self) -> &str {
        &self.url
    }
}

impl HasUrl for PatternRecord {
    fn url(&self) -> &str {
        &self.url
    }
}

/// Drops items with an empty or already seen URL, keeping first occurrences in order.
pub fn dedupe_by_url<T: HasUrl>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let url = item.url().trim();
            !url.is_empty() && seen.insert(url.to_string())
        })
        .collect()
}

/// Lower-case trimmed form used for every vocabulary comparison.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
