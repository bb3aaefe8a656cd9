use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::candidate::SourceType;
use super::money::Money;

/// Aggregate statistics for one reconciliation run. Always derived from the
/// result set plus the leftover candidates; nothing here is tracked
/// incrementally, so it can always be recomputed and cross-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Candidate counts per source pool, both sides included.
    pub source_counts: BTreeMap<SourceType, usize>,
    pub matched_count: usize,
    pub suggested_count: usize,
    pub unmatched_left: usize,
    pub unmatched_right: usize,
    /// Sum over the left-side amounts of auto-accepted matches.
    pub matched_amount: Money,
    /// Sum over amounts of unmatched candidates on both sides.
    pub unmatched_amount: Money,
    /// Auto-accepted matches over the left (primary) side count; 0 when the
    /// primary side is empty.
    pub match_rate: f64,
}
