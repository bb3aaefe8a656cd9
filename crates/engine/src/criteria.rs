use chrono::NaiveDate;
use concord_core::Money;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::normalize::normalize_entity_name;
use crate::util::levenshtein_distance;

/// Score granted at the outer edge of the date tolerance window. Decays
/// linearly from 1.0 (same day) down to this value.
const DATE_DECAY_FLOOR: f64 = 0.5;

/// Score granted at the outer edge of the amount tolerance band.
const AMOUNT_DECAY_FLOOR: f64 = 0.7;

/// Formats tried in order. Day-first variants come before `%m/%d/%Y`
/// because the upstream documents are predominantly day-first.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d %b %Y", "%d %B %Y", "%Y/%m/%d", "%m/%d/%Y",
];

/// Try each known format in order; `None` on total failure rather than an
/// error, so one bad field degrades only the pairs it participates in.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Hard criterion. Either date missing, or the gap exceeding the tolerance,
/// vetoes the pair outright.
pub fn score_date(
    a: Option<NaiveDate>,
    b: Option<NaiveDate>,
    tolerance_days: i64,
) -> (bool, f64) {
    let (Some(a), Some(b)) = (a, b) else {
        return (false, 0.0);
    };
    let diff = (a - b).num_days().abs();
    if diff == 0 {
        return (true, 1.0);
    }
    if diff > tolerance_days {
        return (false, 0.0);
    }
    let score = 1.0 - (diff as f64 / tolerance_days as f64) * (1.0 - DATE_DECAY_FLOOR);
    (true, score)
}

/// Hard criterion. Zero or absent amounts veto; the percentage difference is
/// computed symmetrically against the average of the two amounts, in decimal
/// arithmetic throughout.
pub fn score_amount(
    a: Option<Money>,
    b: Option<Money>,
    tolerance_percent: Decimal,
) -> (bool, f64) {
    let (Some(a), Some(b)) = (a, b) else {
        return (false, 0.0);
    };
    if a.is_zero() || b.is_zero() {
        return (false, 0.0);
    }
    let Some(pct) = a.pct_difference(b) else {
        return (false, 0.0);
    };
    if pct.is_zero() {
        return (true, 1.0);
    }
    if pct > tolerance_percent || tolerance_percent.is_zero() {
        return (false, 0.0);
    }
    let ratio = (pct / tolerance_percent).to_f64().unwrap_or(1.0);
    (true, 1.0 - ratio * (1.0 - AMOUNT_DECAY_FLOOR))
}

/// Soft criterion in [0, 1]. Never vetoes; an empty normalized name on
/// either side simply contributes nothing.
pub fn score_entity(a: &str, b: &str) -> f64 {
    let a = normalize_entity_name(a);
    let b = normalize_entity_name(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    1.0 - (levenshtein_distance(&a, &b) as f64 / max_len as f64)
}
