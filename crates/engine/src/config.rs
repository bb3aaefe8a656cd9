use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use concord_core::MatchType;

const WEIGHT_SUM_EPSILON: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("criterion weights must sum to 1.0, got {0}")]
    WeightSum(f64),
    #[error("{name} must be within [0, 1], got {value}")]
    ThresholdRange { name: &'static str, value: f64 },
    #[error("thresholds must be ordered: suggest_confidence_floor <= min_confidence_score <= high_threshold <= exact_threshold")]
    ThresholdOrder,
    #[error("{name} must not be negative, got {value}")]
    NegativeTolerance { name: &'static str, value: String },
    #[error("max_pair_evaluations must be positive")]
    ZeroPairBudget,
    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionWeights {
    pub date: f64,
    pub amount: f64,
    pub entity: f64,
}

impl CriterionWeights {
    pub fn sum(&self) -> f64 {
        self.date + self.amount + self.entity
    }
}

impl Default for CriterionWeights {
    fn default() -> Self {
        Self { date: 0.3, amount: 0.5, entity: 0.2 }
    }
}

/// Tunable surface of one reconciliation profile. Validated once at matcher
/// construction; an invalid config never reaches a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub date_tolerance_days: i64,
    pub amount_tolerance_percent: Decimal,
    /// Entity scores below this contribute nothing to the weighted
    /// confidence. Never a standalone veto.
    pub vendor_similarity_threshold: f64,
    /// Acceptance floor for auto-matches.
    pub min_confidence_score: f64,
    /// Floor for surfacing non-auto "suggested" pairings.
    pub suggest_confidence_floor: f64,
    pub high_threshold: f64,
    pub exact_threshold: f64,
    pub weights: CriterionWeights,
    /// Guard against silently degrading on oversized inputs: a run refuses
    /// to start when |left| * |right| exceeds this.
    pub max_pair_evaluations: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            date_tolerance_days: 3,
            amount_tolerance_percent: Decimal::ONE,
            vendor_similarity_threshold: 0.75,
            min_confidence_score: 0.70,
            suggest_confidence_floor: 0.50,
            high_threshold: 0.85,
            exact_threshold: 0.95,
            weights: CriterionWeights::default(),
            max_pair_evaluations: 4_000_000,
        }
    }
}

impl MatchConfig {
    /// Invoices against bank mutations: payments drift further from the
    /// invoice date and carry bank fees, so both tolerances are wider.
    pub fn invoice_vs_bank() -> Self {
        Self {
            date_tolerance_days: 7,
            amount_tolerance_percent: Decimal::from(2),
            ..Self::default()
        }
    }

    /// Invoices against withholding-tax certificates: issued close together
    /// and amount-exact apart from rounding.
    pub fn invoice_vs_certificate() -> Self {
        Self {
            date_tolerance_days: 3,
            amount_tolerance_percent: Decimal::ONE,
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: MatchConfig = toml::from_str(s)?;
        config.validated()
    }

    pub fn validated(self) -> Result<Self, ConfigError> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::WeightSum(sum));
        }
        for (name, value) in [
            ("vendor_similarity_threshold", self.vendor_similarity_threshold),
            ("min_confidence_score", self.min_confidence_score),
            ("suggest_confidence_floor", self.suggest_confidence_floor),
            ("high_threshold", self.high_threshold),
            ("exact_threshold", self.exact_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdRange { name, value });
            }
        }
        if self.suggest_confidence_floor > self.min_confidence_score
            || self.min_confidence_score > self.high_threshold
            || self.high_threshold > self.exact_threshold
        {
            return Err(ConfigError::ThresholdOrder);
        }
        if self.date_tolerance_days < 0 {
            return Err(ConfigError::NegativeTolerance {
                name: "date_tolerance_days",
                value: self.date_tolerance_days.to_string(),
            });
        }
        if self.amount_tolerance_percent.is_sign_negative() {
            return Err(ConfigError::NegativeTolerance {
                name: "amount_tolerance_percent",
                value: self.amount_tolerance_percent.to_string(),
            });
        }
        if self.max_pair_evaluations == 0 {
            return Err(ConfigError::ZeroPairBudget);
        }
        Ok(self)
    }

    /// Band a composed confidence. `None` below the suggest floor: such a
    /// pair is discarded entirely rather than emitted with a zero score.
    pub fn classify(&self, confidence: f64) -> Option<MatchType> {
        if confidence >= self.exact_threshold {
            Some(MatchType::Exact)
        } else if confidence >= self.high_threshold {
            Some(MatchType::High)
        } else if confidence >= self.min_confidence_score {
            Some(MatchType::Partial)
        } else if confidence >= self.suggest_confidence_floor {
            Some(MatchType::Suggested)
        } else {
            None
        }
    }
}
