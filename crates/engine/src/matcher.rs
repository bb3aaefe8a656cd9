use std::collections::{HashMap, HashSet};

use concord_core::{
    CandidateRef, MatchCandidate, MatchResult, MatchStatus, MatchType, Money, ReconcileError,
    ReconciliationSummary,
};

use crate::composer::{ConfidenceComposer, PairEvaluation};
use crate::config::{ConfigError, MatchConfig};
use crate::suggester::MatchSuggester;

/// Everything one run produces. Either the whole outcome is returned or the
/// run fails with a `ReconcileError`; there is no partial result.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationOutcome {
    /// Auto-accepted matches (partial band and above), pending review.
    pub results: Vec<MatchResult>,
    /// Suggest-band pairings surfaced for human review, never auto-accepted.
    pub suggested: Vec<MatchResult>,
    pub unmatched_left: Vec<CandidateRef>,
    pub unmatched_right: Vec<CandidateRef>,
    pub summary: ReconciliationSummary,
}

/// Greedy one-to-one assignment between two candidate pools.
///
/// Candidates move `unprocessed -> matched | unmatched`, terminal for the
/// run. The consumed-index set is owned by a single invocation; nothing is
/// shared across runs, so concurrent runs need no coordination.
pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    pub fn new(config: MatchConfig) -> Result<Self, ConfigError> {
        Ok(Self { config: config.validated()? })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn reconcile(
        &self,
        left: &[MatchCandidate],
        right: &[MatchCandidate],
    ) -> Result<ReconciliationOutcome, ReconcileError> {
        self.reconcile_inner(left, right, None)
    }

    /// Like [`reconcile`](Self::reconcile), but consults an external
    /// suggester for the leftovers of the deterministic pass. Every
    /// proposal is re-scored through the same hard-veto criteria; nothing
    /// a suggester says is accepted unconditionally.
    pub fn reconcile_with_suggester(
        &self,
        left: &[MatchCandidate],
        right: &[MatchCandidate],
        suggester: &dyn MatchSuggester,
    ) -> Result<ReconciliationOutcome, ReconcileError> {
        self.reconcile_inner(left, right, Some(suggester))
    }

    /// Two sequential passes: `left` vs `right` under this matcher's config,
    /// then the left-side leftovers vs `third` under `second_pass` (e.g.
    /// invoices vs certificates, then remaining invoices vs bank rows).
    pub fn reconcile_three(
        &self,
        left: &[MatchCandidate],
        right: &[MatchCandidate],
        second_pass: &Matcher,
        third: &[MatchCandidate],
    ) -> Result<(ReconciliationOutcome, ReconciliationOutcome), ReconcileError> {
        let first = self.reconcile(left, right)?;
        let leftover_refs: HashSet<&CandidateRef> = first.unmatched_left.iter().collect();
        let leftovers: Vec<MatchCandidate> = left
            .iter()
            .filter(|c| leftover_refs.contains(&c.candidate_ref()))
            .cloned()
            .collect();
        let second = second_pass.reconcile(&leftovers, third)?;
        Ok((first, second))
    }

    fn reconcile_inner(
        &self,
        left: &[MatchCandidate],
        right: &[MatchCandidate],
        suggester: Option<&dyn MatchSuggester>,
    ) -> Result<ReconciliationOutcome, ReconcileError> {
        validate_collection(left, "left")?;
        validate_collection(right, "right")?;

        let pairs = left.len().saturating_mul(right.len());
        if pairs > self.config.max_pair_evaluations {
            tracing::error!(
                left = left.len(),
                right = right.len(),
                limit = self.config.max_pair_evaluations,
                "refusing oversized reconciliation run"
            );
            return Err(ReconcileError::InputTooLarge {
                left: left.len(),
                right: right.len(),
                limit: self.config.max_pair_evaluations,
            });
        }

        tracing::info!(left = left.len(), right = right.len(), "reconciliation run started");

        let composer = ConfidenceComposer::new(&self.config);
        let mut consumed_left: HashSet<usize> = HashSet::new();
        let mut consumed_right: HashSet<usize> = HashSet::new();
        let mut results = Vec::new();
        let mut suggested = Vec::new();
        let mut next_id = 1i64;

        // Greedy in left input order: an earlier candidate may claim a right
        // record that would have scored higher against a later one.
        for (li, l) in left.iter().enumerate() {
            let mut best: Option<(usize, PairEvaluation, MatchType)> = None;
            for (ri, r) in right.iter().enumerate() {
                if consumed_right.contains(&ri) {
                    continue;
                }
                if let Some((eval, match_type)) = composer.evaluate(l, r) {
                    let better = match &best {
                        None => true,
                        Some((bi, current, _)) => {
                            if (eval.confidence - current.confidence).abs() > f64::EPSILON {
                                eval.confidence > current.confidence
                            } else {
                                // Equal confidence: a shared reference code
                                // breaks the tie; otherwise keep input order.
                                references_match(l, r) && !references_match(l, &right[*bi])
                            }
                        }
                    };
                    if better {
                        best = Some((ri, eval, match_type));
                    }
                }
            }

            if let Some((ri, eval, match_type)) = best {
                // A suggest-band pairing also claims both candidates; the
                // reviewer rejecting it frees them for a future run.
                consumed_left.insert(li);
                consumed_right.insert(ri);
                let result = build_result(next_id, l, &right[ri], match_type, &eval);
                next_id += 1;
                if match_type.is_auto_accepted() {
                    results.push(result);
                } else {
                    suggested.push(result);
                }
            }
        }

        if let Some(suggester) = suggester {
            self.consult_suggester(
                suggester,
                left,
                right,
                &mut consumed_left,
                &mut consumed_right,
                &mut suggested,
                next_id,
            );
        }

        let unmatched_left = unconsumed_refs(left, &consumed_left);
        let unmatched_right = unconsumed_refs(right, &consumed_right);
        let summary =
            summarize(left, right, &results, &suggested, &unmatched_left, &unmatched_right);

        tracing::info!(
            matched = results.len(),
            suggested = suggested.len(),
            unmatched_left = unmatched_left.len(),
            unmatched_right = unmatched_right.len(),
            "reconciliation run finished"
        );

        Ok(ReconciliationOutcome { results, suggested, unmatched_left, unmatched_right, summary })
    }

    #[allow(clippy::too_many_arguments)]
    fn consult_suggester(
        &self,
        suggester: &dyn MatchSuggester,
        left: &[MatchCandidate],
        right: &[MatchCandidate],
        consumed_left: &mut HashSet<usize>,
        consumed_right: &mut HashSet<usize>,
        suggested: &mut Vec<MatchResult>,
        mut next_id: i64,
    ) {
        // The suggester sees only the leftovers; proposals index into those
        // slices and are mapped back to the run's candidate indices here.
        let leftover_left: Vec<usize> =
            (0..left.len()).filter(|i| !consumed_left.contains(i)).collect();
        let leftover_right: Vec<usize> =
            (0..right.len()).filter(|i| !consumed_right.contains(i)).collect();
        if leftover_left.is_empty() || leftover_right.is_empty() {
            return;
        }

        let left_view: Vec<MatchCandidate> =
            leftover_left.iter().map(|&i| left[i].clone()).collect();
        let right_view: Vec<MatchCandidate> =
            leftover_right.iter().map(|&i| right[i].clone()).collect();

        let composer = ConfidenceComposer::new(&self.config);
        for proposal in suggester.propose(&left_view, &right_view) {
            let (Some(&li), Some(&ri)) = (
                leftover_left.get(proposal.left_index),
                leftover_right.get(proposal.right_index),
            ) else {
                tracing::warn!(
                    left_index = proposal.left_index,
                    right_index = proposal.right_index,
                    "suggester proposal out of range, dropped"
                );
                continue;
            };
            if consumed_left.contains(&li) || consumed_right.contains(&ri) {
                continue;
            }
            // Re-validation: the proposal must clear the same hard vetoes
            // as any deterministic pairing; the suggest floor does not
            // apply since everything here goes to human review anyway.
            match composer.score(&left[li], &right[ri]) {
                Some(eval) => {
                    consumed_left.insert(li);
                    consumed_right.insert(ri);
                    suggested.push(build_result(
                        next_id,
                        &left[li],
                        &right[ri],
                        MatchType::Suggested,
                        &eval,
                    ));
                    next_id += 1;
                }
                None => {
                    tracing::warn!(
                        left_ref = %left[li].candidate_ref(),
                        right_ref = %right[ri].candidate_ref(),
                        claimed_confidence = proposal.confidence,
                        "suggester proposal failed hard criteria, dropped"
                    );
                }
            }
        }
    }
}

/// Tie-break hint only: reference codes never affect scores, just which of
/// two equally-confident pairings wins.
fn references_match(l: &MatchCandidate, r: &MatchCandidate) -> bool {
    match (&l.reference_code, &r.reference_code) {
        (Some(a), Some(b)) => !a.is_empty() && a == b,
        _ => false,
    }
}

fn build_result(
    id: i64,
    left: &MatchCandidate,
    right: &MatchCandidate,
    match_type: MatchType,
    eval: &PairEvaluation,
) -> MatchResult {
    MatchResult {
        id,
        left_ref: left.candidate_ref(),
        right_ref: right.candidate_ref(),
        confidence: eval.confidence,
        match_type,
        criterion_scores: eval.scores,
        status: MatchStatus::Pending,
        details: eval.details.clone(),
    }
}

fn validate_collection(
    candidates: &[MatchCandidate],
    collection: &'static str,
) -> Result<(), ReconcileError> {
    // An empty collection is a valid (if trivial) run. A non-empty one where
    // every record lacks both date and amount points at a broken extraction
    // upstream and aborts the run.
    if !candidates.is_empty() && candidates.iter().all(|c| !c.is_matchable()) {
        return Err(ReconcileError::Validation {
            collection,
            reason: "no record carries a transaction date or a nonzero amount".to_string(),
        });
    }
    Ok(())
}

fn unconsumed_refs(candidates: &[MatchCandidate], consumed: &HashSet<usize>) -> Vec<CandidateRef> {
    candidates
        .iter()
        .enumerate()
        .filter(|(i, _)| !consumed.contains(i))
        .map(|(_, c)| c.candidate_ref())
        .collect()
}

/// Derive the run summary from the result set and the leftovers. Nothing in
/// here is tracked incrementally, so callers can recompute it at any time
/// and cross-check the stored aggregate.
pub fn summarize(
    left: &[MatchCandidate],
    right: &[MatchCandidate],
    results: &[MatchResult],
    suggested: &[MatchResult],
    unmatched_left: &[CandidateRef],
    unmatched_right: &[CandidateRef],
) -> ReconciliationSummary {
    let mut source_counts = std::collections::BTreeMap::new();
    let amounts: HashMap<CandidateRef, Option<Money>> = left
        .iter()
        .chain(right.iter())
        .map(|c| (c.candidate_ref(), c.amount))
        .collect();
    for c in left.iter().chain(right.iter()) {
        *source_counts.entry(c.source_type).or_insert(0) += 1;
    }

    let matched_amount = results
        .iter()
        .filter_map(|r| amounts.get(&r.left_ref).copied().flatten())
        .fold(Money::zero(), |acc, a| acc + a);
    let unmatched_amount = unmatched_left
        .iter()
        .chain(unmatched_right.iter())
        .filter_map(|r| amounts.get(r).copied().flatten())
        .fold(Money::zero(), |acc, a| acc + a);

    let match_rate = if left.is_empty() {
        0.0
    } else {
        results.len() as f64 / left.len() as f64
    };

    ReconciliationSummary {
        source_counts,
        matched_count: results.len(),
        suggested_count: suggested.len(),
        unmatched_left: unmatched_left.len(),
        unmatched_right: unmatched_right.len(),
        matched_amount,
        unmatched_amount,
        match_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use concord_core::SourceType;

    fn candidate(
        source_type: SourceType,
        source_ref: &str,
        date: Option<(i32, u32, u32)>,
        amount: Option<i64>,
        name: &str,
    ) -> MatchCandidate {
        let mut c = MatchCandidate::new(source_type, source_ref);
        c.transaction_date = date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        c.amount = amount.map(Money::from_major);
        c.counterparty_name = name.to_string();
        c
    }

    fn invoice(source_ref: &str, date: (i32, u32, u32), amount: i64, name: &str) -> MatchCandidate {
        candidate(SourceType::InvoiceOutbound, source_ref, Some(date), Some(amount), name)
    }

    fn bank(source_ref: &str, date: (i32, u32, u32), amount: i64, name: &str) -> MatchCandidate {
        candidate(SourceType::BankTransaction, source_ref, Some(date), Some(amount), name)
    }

    fn matcher() -> Matcher {
        Matcher::new(MatchConfig::default()).unwrap()
    }

    #[test]
    fn close_pair_produces_exactly_one_high_result() {
        let left = vec![invoice("a", (2024, 1, 10), 1_000_000, "PT MAJU JAYA")];
        let right = vec![bank("b", (2024, 1, 11), 1_000_000, "MAJU JAYA TBK")];
        let outcome = matcher().reconcile(&left, &right).unwrap();

        assert_eq!(outcome.results.len(), 1);
        let r = &outcome.results[0];
        assert!(r.confidence >= 0.90);
        assert!(matches!(r.match_type, MatchType::Exact | MatchType::High));
        assert_eq!(r.status, MatchStatus::Pending);
        assert!(outcome.unmatched_left.is_empty());
        assert!(outcome.unmatched_right.is_empty());
    }

    #[test]
    fn date_gap_beyond_tolerance_leaves_both_unmatched() {
        let left = vec![invoice("a", (2024, 1, 10), 1_000_000, "PT MAJU JAYA")];
        let right = vec![bank("b", (2024, 1, 20), 1_000_000, "MAJU JAYA TBK")];
        let outcome = matcher().reconcile(&left, &right).unwrap();

        assert!(outcome.results.is_empty());
        assert!(outcome.suggested.is_empty());
        assert_eq!(outcome.unmatched_left.len(), 1);
        assert_eq!(outcome.unmatched_right.len(), 1);
    }

    #[test]
    fn earlier_left_claims_contested_right() {
        // Greedy order-dependence: the first left candidate takes the only
        // right record even though a later one also wanted it.
        let left = vec![
            invoice("a1", (2024, 1, 10), 1_000_000, "PT MAJU JAYA"),
            invoice("a2", (2024, 1, 12), 1_002_000, "MAJU JAYA"),
        ];
        let right = vec![bank("b", (2024, 1, 10), 1_000_000, "MAJU JAYA TBK")];
        let outcome = matcher().reconcile(&left, &right).unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].left_ref.source_ref, "a1");
        assert_eq!(outcome.unmatched_left.len(), 1);
        assert_eq!(outcome.unmatched_left[0].source_ref, "a2");
    }

    #[test]
    fn zero_amount_side_never_matches() {
        let left = vec![invoice("a", (2024, 1, 10), 0, "PT MAJU JAYA")];
        let right = vec![bank("b", (2024, 1, 10), 1_000_000, "PT MAJU JAYA")];
        let outcome = matcher().reconcile(&left, &right).unwrap();
        assert!(outcome.results.is_empty());
        assert!(outcome.suggested.is_empty());
    }

    #[test]
    fn empty_side_is_a_clean_zero_match_run() {
        let left = vec![invoice("a", (2024, 1, 10), 1_000_000, "PT MAJU JAYA")];
        let outcome = matcher().reconcile(&left, &[]).unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.summary.match_rate, 0.0);
        assert_eq!(outcome.unmatched_left.len(), 1);
    }

    #[test]
    fn no_candidate_is_matched_twice() {
        let left = vec![
            invoice("a1", (2024, 1, 10), 1_000_000, "PT MAJU JAYA"),
            invoice("a2", (2024, 1, 10), 1_000_000, "PT MAJU JAYA"),
        ];
        let right = vec![
            bank("b1", (2024, 1, 10), 1_000_000, "MAJU JAYA"),
            bank("b2", (2024, 1, 10), 1_000_000, "MAJU JAYA"),
        ];
        let outcome = matcher().reconcile(&left, &right).unwrap();

        assert_eq!(outcome.results.len(), 2);
        let mut seen = HashSet::new();
        for r in &outcome.results {
            assert!(seen.insert(r.left_ref.clone()), "left matched twice: {}", r.left_ref);
            assert!(seen.insert(r.right_ref.clone()), "right matched twice: {}", r.right_ref);
        }
    }

    #[test]
    fn same_input_same_config_is_idempotent() {
        let left = vec![
            invoice("a1", (2024, 1, 10), 1_000_000, "PT MAJU JAYA"),
            invoice("a2", (2024, 1, 12), 2_500_000, "SINAR ABADI"),
            invoice("a3", (2024, 2, 1), 750_000, "CV BERKAH"),
        ];
        let right = vec![
            bank("b1", (2024, 1, 11), 1_000_000, "MAJU JAYA TBK"),
            bank("b2", (2024, 1, 12), 2_500_000, "SINAR ABADI"),
            bank("b3", (2024, 3, 1), 750_000, "BERKAH"),
        ];
        let m = matcher();
        let first = m.reconcile(&left, &right).unwrap();
        let second = m.reconcile(&left, &right).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn suggest_band_pairing_is_surfaced_not_auto_accepted() {
        // Date at the tolerance edge and dissimilar names: confidence
        // 0.3*0.5 + 0.5*1.0 = 0.65, inside the suggest band.
        let left = vec![invoice("a", (2024, 1, 10), 1_000_000, "PT MAJU JAYA")];
        let right = vec![bank("b", (2024, 1, 13), 1_000_000, "SINAR ABADI")];
        let outcome = matcher().reconcile(&left, &right).unwrap();

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.suggested.len(), 1);
        assert_eq!(outcome.suggested[0].match_type, MatchType::Suggested);
        // The suggested pairing claims both candidates for this run.
        assert!(outcome.unmatched_left.is_empty());
        assert!(outcome.unmatched_right.is_empty());
        assert_eq!(outcome.summary.matched_count, 0);
        assert_eq!(outcome.summary.suggested_count, 1);
    }

    #[test]
    fn shared_reference_code_breaks_a_confidence_tie() {
        let mut left = invoice("a", (2024, 1, 10), 1_000_000, "PT MAJU JAYA");
        left.reference_code = Some("TRX-7781".to_string());
        let mut b1 = bank("b1", (2024, 1, 10), 1_000_000, "MAJU JAYA");
        b1.reference_code = Some("TRX-1109".to_string());
        let mut b2 = bank("b2", (2024, 1, 10), 1_000_000, "MAJU JAYA");
        b2.reference_code = Some("TRX-7781".to_string());

        let outcome = matcher().reconcile(&[left], &[b1, b2]).unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].right_ref.source_ref, "b2");
    }

    #[test]
    fn structurally_empty_collection_aborts_the_run() {
        let left = vec![invoice("a", (2024, 1, 10), 1_000_000, "PT MAJU JAYA")];
        let right = vec![
            candidate(SourceType::BankTransaction, "b1", None, None, "X"),
            candidate(SourceType::BankTransaction, "b2", None, None, "Y"),
        ];
        let err = matcher().reconcile(&left, &right).unwrap_err();
        assert!(matches!(err, ReconcileError::Validation { collection: "right", .. }));
    }

    #[test]
    fn one_bad_record_degrades_only_itself() {
        let left = vec![
            candidate(SourceType::InvoiceOutbound, "broken", None, Some(1_000_000), "PT X"),
            invoice("ok", (2024, 1, 10), 2_000_000, "PT MAJU JAYA"),
        ];
        let right = vec![bank("b", (2024, 1, 10), 2_000_000, "MAJU JAYA")];
        let outcome = matcher().reconcile(&left, &right).unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].left_ref.source_ref, "ok");
        assert_eq!(outcome.unmatched_left[0].source_ref, "broken");
    }

    #[test]
    fn oversized_input_is_refused() {
        let config = MatchConfig { max_pair_evaluations: 4, ..MatchConfig::default() };
        let m = Matcher::new(config).unwrap();
        let left: Vec<_> = (0..3)
            .map(|i| invoice(&format!("a{i}"), (2024, 1, 10), 1_000_000, "PT X"))
            .collect();
        let right: Vec<_> = (0..2)
            .map(|i| bank(&format!("b{i}"), (2024, 1, 10), 1_000_000, "X"))
            .collect();
        let err = m.reconcile(&left, &right).unwrap_err();
        assert!(matches!(err, ReconcileError::InputTooLarge { left: 3, right: 2, limit: 4 }));
    }

    #[test]
    fn summary_is_derived_from_results_and_leftovers() {
        let left = vec![
            invoice("a1", (2024, 1, 10), 1_000_000, "PT MAJU JAYA"),
            invoice("a2", (2024, 6, 1), 400_000, "CV BERKAH"),
        ];
        let right = vec![bank("b1", (2024, 1, 10), 1_000_000, "MAJU JAYA")];
        let outcome = matcher().reconcile(&left, &right).unwrap();
        let s = &outcome.summary;

        assert_eq!(s.source_counts[&SourceType::InvoiceOutbound], 2);
        assert_eq!(s.source_counts[&SourceType::BankTransaction], 1);
        assert_eq!(s.matched_count, 1);
        assert_eq!(s.unmatched_left, 1);
        assert_eq!(s.unmatched_right, 0);
        assert_eq!(s.matched_amount, Money::from_major(1_000_000));
        assert_eq!(s.unmatched_amount, Money::from_major(400_000));
        assert_eq!(s.match_rate, 0.5);

        // Recomputing from the outcome reproduces the stored summary.
        let recomputed = summarize(
            &left,
            &right,
            &outcome.results,
            &outcome.suggested,
            &outcome.unmatched_left,
            &outcome.unmatched_right,
        );
        assert_eq!(&recomputed, s);
    }

    #[test]
    fn second_pass_matches_first_pass_leftovers_against_third_pool() {
        let invoices = vec![
            invoice("inv1", (2024, 1, 10), 1_000_000, "PT MAJU JAYA"),
            invoice("inv2", (2024, 1, 15), 2_000_000, "SINAR ABADI"),
        ];
        let certificates = vec![candidate(
            SourceType::WithholdingCertificate,
            "cert1",
            Some((2024, 1, 10)),
            Some(1_000_000),
            "MAJU JAYA",
        )];
        let bank_rows = vec![bank("row9", (2024, 1, 17), 2_000_000, "SINAR ABADI")];

        let first_pass = Matcher::new(MatchConfig::invoice_vs_certificate()).unwrap();
        let second_pass = Matcher::new(MatchConfig::invoice_vs_bank()).unwrap();
        let (first, second) = first_pass
            .reconcile_three(&invoices, &certificates, &second_pass, &bank_rows)
            .unwrap();

        assert_eq!(first.results.len(), 1);
        assert_eq!(first.results[0].left_ref.source_ref, "inv1");
        assert_eq!(second.results.len(), 1);
        assert_eq!(second.results[0].left_ref.source_ref, "inv2");
        assert_eq!(second.results[0].right_ref.source_ref, "row9");
    }
}
