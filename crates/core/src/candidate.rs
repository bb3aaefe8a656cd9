use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;

/// Which capture pipeline a record came from. Each reconciliation run pairs
/// records across two (or three) of these pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    InvoiceOutbound,
    InvoiceInbound,
    BankTransaction,
    WithholdingCertificate,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::InvoiceOutbound => write!(f, "invoice_outbound"),
            SourceType::InvoiceInbound => write!(f, "invoice_inbound"),
            SourceType::BankTransaction => write!(f, "bank_transaction"),
            SourceType::WithholdingCertificate => write!(f, "withholding_certificate"),
        }
    }
}

/// Stable handle to one candidate: the originating file/batch/row identifier
/// qualified by its source pool. Used in results and audit output only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateRef {
    pub source_type: SourceType,
    pub source_ref: String,
}

impl fmt::Display for CandidateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_type, self.source_ref)
    }
}

/// One record from one side of a reconciliation. Immutable once constructed
/// for a run; the engine never mutates candidates, only indexes into them.
///
/// `raw_payload` is an opaque audit bag carried through to export. Scoring
/// logic never reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub source_type: SourceType,
    pub source_ref: String,
    pub transaction_date: Option<NaiveDate>,
    pub amount: Option<Money>,
    pub counterparty_name: String,
    pub counterparty_tax_id: String,
    pub reference_code: Option<String>,
    #[serde(default)]
    pub raw_payload: serde_json::Map<String, serde_json::Value>,
}

impl MatchCandidate {
    pub fn new(source_type: SourceType, source_ref: &str) -> Self {
        MatchCandidate {
            source_type,
            source_ref: source_ref.to_string(),
            transaction_date: None,
            amount: None,
            counterparty_name: String::new(),
            counterparty_tax_id: String::new(),
            reference_code: None,
            raw_payload: serde_json::Map::new(),
        }
    }

    pub fn candidate_ref(&self) -> CandidateRef {
        CandidateRef {
            source_type: self.source_type,
            source_ref: self.source_ref.clone(),
        }
    }

    /// A record is matchable when it carries at least a date or a nonzero
    /// amount; records failing this on every row of a collection indicate a
    /// structurally broken extraction upstream.
    pub fn is_matchable(&self) -> bool {
        self.transaction_date.is_some() || self.amount.map(|a| !a.is_zero()).unwrap_or(false)
    }
}
