pub mod composer;
pub mod config;
pub mod criteria;
pub mod matcher;
pub mod normalize;
pub mod suggester;
pub(crate) mod util;

pub use composer::{ConfidenceComposer, PairEvaluation};
pub use config::{ConfigError, CriterionWeights, MatchConfig};
pub use criteria::{parse_date, score_amount, score_date, score_entity};
pub use matcher::{Matcher, ReconciliationOutcome};
pub use normalize::{normalize_entity_name, normalize_tax_id};
pub use suggester::{MatchSuggester, StaticSuggester, SuggestedPair};

pub mod reconcile {
    use crate::*;
    use concord_core::{MatchCandidate, ReconcileError};

    pub fn invoice_vs_bank_matcher() -> Matcher {
        Matcher::new(MatchConfig::invoice_vs_bank())
            .expect("builtin invoice-vs-bank profile is valid")
    }

    pub fn invoice_vs_certificate_matcher() -> Matcher {
        Matcher::new(MatchConfig::invoice_vs_certificate())
            .expect("builtin invoice-vs-certificate profile is valid")
    }

    pub fn run(
        config: MatchConfig,
        left: &[MatchCandidate],
        right: &[MatchCandidate],
    ) -> Result<ReconciliationOutcome, RunError> {
        let matcher = Matcher::new(config)?;
        Ok(matcher.reconcile(left, right)?)
    }

    #[derive(Debug, thiserror::Error)]
    pub enum RunError {
        #[error(transparent)]
        Config(#[from] ConfigError),
        #[error(transparent)]
        Reconcile(#[from] ReconcileError),
    }
}
