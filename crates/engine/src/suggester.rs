use concord_core::MatchCandidate;

/// One proposal from an external suggester: indices into the unmatched
/// slices it was shown, plus whatever confidence it claims. The claimed
/// confidence is informational only; the engine re-scores every proposal
/// through its own criteria before surfacing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuggestedPair {
    pub left_index: usize,
    pub right_index: usize,
    pub confidence: f64,
}

/// Seam for AI-assisted matching. Implementations see only the candidates
/// the deterministic pass could not place, and their output is validated
/// against the same hard-veto criteria. A proposal is never accepted on
/// the suggester's word alone.
pub trait MatchSuggester {
    fn propose(&self, left: &[MatchCandidate], right: &[MatchCandidate]) -> Vec<SuggestedPair>;
}

/// Fixed-answer suggester for tests and offline replay.
pub struct StaticSuggester {
    pairs: Vec<SuggestedPair>,
}

impl StaticSuggester {
    pub fn new(pairs: Vec<SuggestedPair>) -> Self {
        Self { pairs }
    }
}

impl MatchSuggester for StaticSuggester {
    fn propose(&self, _left: &[MatchCandidate], _right: &[MatchCandidate]) -> Vec<SuggestedPair> {
        self.pairs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::matcher::Matcher;
    use chrono::NaiveDate;
    use concord_core::{MatchType, Money, SourceType};

    fn candidate(
        source_type: SourceType,
        source_ref: &str,
        date: (i32, u32, u32),
        amount: i64,
        name: &str,
    ) -> MatchCandidate {
        let mut c = MatchCandidate::new(source_type, source_ref);
        c.transaction_date = NaiveDate::from_ymd_opt(date.0, date.1, date.2);
        c.amount = Some(Money::from_major(amount));
        c.counterparty_name = name.to_string();
        c
    }

    #[test]
    fn validated_proposal_surfaces_as_suggested() {
        // Edge-of-tolerance date plus an unrecognizable bank narrative:
        // confidence 0.65, below the raised suggest floor, so the
        // deterministic pass leaves both sides unmatched.
        let left = vec![candidate(
            SourceType::InvoiceOutbound,
            "inv",
            (2024, 1, 10),
            1_000_000,
            "PT MAJU JAYA",
        )];
        let right = vec![candidate(
            SourceType::BankTransaction,
            "row",
            (2024, 1, 13),
            1_000_000,
            "TRANSFER 88217",
        )];
        let config = MatchConfig { suggest_confidence_floor: 0.66, ..MatchConfig::default() };
        let matcher = Matcher::new(config).unwrap();

        let baseline = matcher.reconcile(&left, &right).unwrap();
        assert!(baseline.results.is_empty() && baseline.suggested.is_empty());

        let suggester = StaticSuggester::new(vec![SuggestedPair {
            left_index: 0,
            right_index: 0,
            confidence: 0.99,
        }]);
        let outcome = matcher.reconcile_with_suggester(&left, &right, &suggester).unwrap();

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.suggested.len(), 1);
        let s = &outcome.suggested[0];
        assert_eq!(s.match_type, MatchType::Suggested);
        // Confidence is the engine's own recomputation, not the claimed 0.99.
        assert!((s.confidence - 0.65).abs() < 1e-9);
        assert!(outcome.unmatched_left.is_empty());
        assert!(outcome.unmatched_right.is_empty());
        assert_eq!(outcome.summary.suggested_count, 1);
    }

    #[test]
    fn proposal_failing_a_hard_veto_is_dropped() {
        let left = vec![candidate(
            SourceType::InvoiceOutbound,
            "inv",
            (2024, 1, 10),
            1_000_000,
            "PT MAJU JAYA",
        )];
        // 20 days out: no deterministic pairing, and the proposal must be
        // rejected by the date veto no matter what confidence it claims.
        let right = vec![candidate(
            SourceType::BankTransaction,
            "row",
            (2024, 1, 30),
            1_000_000,
            "MAJU JAYA TBK",
        )];
        let matcher = Matcher::new(MatchConfig::default()).unwrap();
        let suggester = StaticSuggester::new(vec![SuggestedPair {
            left_index: 0,
            right_index: 0,
            confidence: 1.0,
        }]);
        let outcome = matcher.reconcile_with_suggester(&left, &right, &suggester).unwrap();

        assert!(outcome.results.is_empty());
        assert!(outcome.suggested.is_empty());
        assert_eq!(outcome.unmatched_left.len(), 1);
        assert_eq!(outcome.unmatched_right.len(), 1);
    }

    #[test]
    fn out_of_range_proposal_is_ignored() {
        let left = vec![candidate(
            SourceType::InvoiceOutbound,
            "inv",
            (2024, 1, 10),
            1_000_000,
            "PT MAJU JAYA",
        )];
        let right = vec![candidate(
            SourceType::BankTransaction,
            "row",
            (2024, 1, 30),
            1_000_000,
            "X",
        )];
        let matcher = Matcher::new(MatchConfig::default()).unwrap();
        let suggester = StaticSuggester::new(vec![SuggestedPair {
            left_index: 7,
            right_index: 0,
            confidence: 1.0,
        }]);
        let outcome = matcher.reconcile_with_suggester(&left, &right, &suggester).unwrap();
        assert!(outcome.suggested.is_empty());
    }
}
