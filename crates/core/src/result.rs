use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::candidate::CandidateRef;

/// Confidence band a pairing landed in. `Suggested` results are surfaced for
/// human review and are never treated as auto-accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    High,
    Partial,
    Suggested,
}

impl MatchType {
    pub fn is_auto_accepted(self) -> bool {
        !matches!(self, MatchType::Suggested)
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::Exact => write!(f, "exact"),
            MatchType::High => write!(f, "high"),
            MatchType::Partial => write!(f, "partial"),
            MatchType::Suggested => write!(f, "suggested"),
        }
    }
}

/// Review state of a result. The engine only ever emits `Pending`; the
/// confirmed/rejected transitions belong to the external reviewer, and a
/// rejected result's candidates become eligible again in a future run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Confirmed,
    Rejected,
}

/// Per-criterion scores preserved alongside the composed confidence so a
/// result can be audited and recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionScores {
    pub date_score: f64,
    pub amount_score: f64,
    pub entity_score: f64,
}

/// One accepted pairing between a left-side and a right-side candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Unique within a single run.
    pub id: i64,
    pub left_ref: CandidateRef,
    pub right_ref: CandidateRef,
    pub confidence: f64,
    pub match_type: MatchType,
    pub criterion_scores: CriterionScores,
    pub status: MatchStatus,
    /// Human-readable audit diffs (day delta, percent delta, names as
    /// compared). Never read by scoring logic.
    pub details: BTreeMap<String, String>,
}
