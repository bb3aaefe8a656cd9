use std::collections::BTreeMap;

use concord_core::{CriterionScores, MatchCandidate, MatchType};

use crate::config::MatchConfig;
use crate::criteria::{score_amount, score_date, score_entity};

/// The composer's verdict on one candidate pair, before assignment.
#[derive(Debug, Clone)]
pub struct PairEvaluation {
    pub confidence: f64,
    pub scores: CriterionScores,
    pub details: BTreeMap<String, String>,
}

/// Applies the hard vetoes and composes the weighted confidence. A pair
/// failing a hard criterion is discarded outright, never emitted with a
/// zero confidence, which would be indistinguishable from "insufficient
/// information".
pub struct ConfidenceComposer<'a> {
    config: &'a MatchConfig,
}

impl<'a> ConfidenceComposer<'a> {
    pub fn new(config: &'a MatchConfig) -> Self {
        Self { config }
    }

    /// Score plus banding; `None` when a veto fires or the confidence falls
    /// below the suggest floor.
    pub fn evaluate(
        &self,
        left: &MatchCandidate,
        right: &MatchCandidate,
    ) -> Option<(PairEvaluation, MatchType)> {
        let eval = self.score(left, right)?;
        let match_type = self.config.classify(eval.confidence)?;
        Some((eval, match_type))
    }

    /// Hard vetoes and weighted confidence only, no banding. Used for
    /// re-validating external suggestions, which bypass the suggest floor
    /// but never the vetoes.
    pub fn score(&self, left: &MatchCandidate, right: &MatchCandidate) -> Option<PairEvaluation> {
        let (date_ok, date_score) = score_date(
            left.transaction_date,
            right.transaction_date,
            self.config.date_tolerance_days,
        );
        if !date_ok {
            return None;
        }

        let (amount_ok, amount_score) = score_amount(
            left.amount,
            right.amount,
            self.config.amount_tolerance_percent,
        );
        if !amount_ok {
            return None;
        }

        let entity_score = score_entity(&left.counterparty_name, &right.counterparty_name);
        // Below the similarity threshold the entity criterion contributes
        // nothing; the raw score is still recorded for audit.
        let entity_contribution = if entity_score >= self.config.vendor_similarity_threshold {
            entity_score
        } else {
            0.0
        };

        let w = &self.config.weights;
        let confidence =
            w.date * date_score + w.amount * amount_score + w.entity * entity_contribution;

        let mut details = BTreeMap::new();
        if let (Some(a), Some(b)) = (left.transaction_date, right.transaction_date) {
            details.insert("day_delta".to_string(), (a - b).num_days().abs().to_string());
        }
        if let (Some(a), Some(b)) = (left.amount, right.amount) {
            if let Some(pct) = a.pct_difference(b) {
                details.insert("amount_pct_delta".to_string(), format!("{:.4}", pct));
            }
        }
        details.insert("left_name".to_string(), left.counterparty_name.clone());
        details.insert("right_name".to_string(), right.counterparty_name.clone());

        Some(PairEvaluation {
            confidence,
            scores: CriterionScores { date_score, amount_score, entity_score },
            details,
        })
    }
}
