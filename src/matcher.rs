use std::num::IntErrorKind;

use serde::{Deserialize, Serialize};

use crate::patterns::{normalize, AmountUnit, PatternRecord};

const SCORE_TYPE_EXACT: u32 = 40;
const SCORE_TYPE_PARTIAL: u32 = 24;
const SCORE_WEIGHT_EXACT: u32 = 35;
const SCORE_AMOUNT_ENOUGH: u32 = 25;
const SCORE_AMOUNT_CLOSE: u32 = 8;
const SCORE_AMOUNT_AMBIGUOUS: u32 = 4;
/// Share of the requirement that still counts as "close".
const CLOSE_AMOUNT_RATIO: f64 = 0.8;

/// What the user has on hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    /// `None` when the input was not an integer; such input never earns the amount bonus.
    pub amount: Option<i64>,
    pub amount_unit: AmountUnit,
    pub yarn_type: String,
    pub yarn_weight: String,
}

impl Constraints {
    pub fn new(
        amount: Option<i64>,
        amount_unit: AmountUnit,
        yarn_type: &str,
        yarn_weight: &str,
    ) -> Self {
        Self {
            amount,
            amount_unit,
            yarn_type: normalize(yarn_type),
            yarn_weight: normalize(yarn_weight),
        }
    }

    /// Builds constraints from raw form input.
    pub fn parse(amount: &str, amount_unit: AmountUnit, yarn_type: &str, yarn_weight: &str) -> Self {
        Self::new(parse_amount(amount), amount_unit, yarn_type, yarn_weight)
    }
}

/// Leading integer of the input ("200g" -> 200), `None` if there is none.
/// Values outside the `i64` range saturate.
pub fn parse_amount(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    let end = trimmed
        .char_indices()
        .find(|&(idx, c)| !(c.is_ascii_digit() || (idx == 0 && (c == '-' || c == '+'))))
        .map(|(idx, _)| idx)
        .unwrap_or(trimmed.len());
    match trimmed[..end].parse::<i64>() {
        Ok(amount) => Some(amount),
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPattern {
    pub score: u32,
    #[serde(flatten)]
    pub record: PatternRecord,
}

/// Converts `value` between grams and meters using `grams_to_meters`.
/// Zero and same-unit values pass through unchanged.
pub fn convert_amount(value: u32, from: AmountUnit, to: AmountUnit, grams_to_meters: f64) -> f64 {
    if value == 0 || from == to {
        return f64::from(value);
    }

    match (from, to) {
        (AmountUnit::Grams, AmountUnit::Meters) => (f64::from(value) * grams_to_meters).round(),
        (AmountUnit::Meters, AmountUnit::Grams) => (f64::from(value) / grams_to_meters).round(),
        _ => f64::NAN,
    }
}

/// Scores catalog records against user constraints.
#[derive(Debug, Clone)]
pub struct Matcher {
    grams_to_meters: f64,
    max_results: usize,
}

impl Matcher {
    pub fn new(grams_to_meters: f64, max_results: usize) -> Self {
        Self {
            grams_to_meters,
            max_results,
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.grams_to_meters, config.max_results)
    }

    pub fn score(&self, record: &PatternRecord, input: &Constraints) -> u32 {
        let mut score = 0;

        let yarn_type = normalize(&record.yarn_type);
        let yarn_weight = normalize(&record.yarn_weight);

        if yarn_type == input.yarn_type {
            score += SCORE_TYPE_EXACT;
        } else if yarn_type.contains(&input.yarn_type) || input.yarn_type.contains(&yarn_type) {
            score += SCORE_TYPE_PARTIAL;
        }

        if yarn_weight == input.yarn_weight {
            score += SCORE_WEIGHT_EXACT;
        }

        let converted = convert_amount(
            record.amount_min,
            record.amount_unit,
            input.amount_unit,
            self.grams_to_meters,
        );

        if converted.is_finite() {
            if let Some(amount) = input.amount {
                let amount = amount as f64;
                if amount >= converted {
                    score += SCORE_AMOUNT_ENOUGH;
                } else if amount >= converted * CLOSE_AMOUNT_RATIO {
                    score += SCORE_AMOUNT_CLOSE;
                }
            }
        } else {
            score += SCORE_AMOUNT_AMBIGUOUS;
        }

        score
    }

    /// Records with a positive score, best first, at most `max_results`.
    /// Ties keep catalog order.
    pub fn rank(&self, records: &[PatternRecord], input: &Constraints) -> Vec<ScoredPattern> {
        let mut scored: Vec<ScoredPattern> = records
            .iter()
            .map(|record| ScoredPattern {
                score: self.score(record, input),
                record: record.clone(),
            })
            .filter(|item| item.score > 0)
            .collect();

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(self.max_results);
        scored
    }
}
