use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use concord_core::{MatchCandidate, Money, SourceType};

/// One slice of a large multi-page statement, handed to the external
/// extraction service. Slices overlap at page boundaries so no row is lost,
/// which is why merged rows must be deduplicated by content fingerprint.
#[derive(Debug, Clone)]
pub struct StatementChunk {
    pub index: usize,
    pub data: Vec<u8>,
}

/// One bank-statement line as extracted from a chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    pub date: Option<NaiveDate>,
    pub description: String,
    pub debit: Money,
    pub credit: Money,
    pub balance: Money,
}

impl StatementRow {
    /// Content fingerprint over date + debit + credit + balance, the fields
    /// stable across overlapping chunk extractions. The description is
    /// excluded: OCR noise makes it vary between extractions of the same row.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let date = self.date.map(|d| d.to_string()).unwrap_or_default();
        hasher.update(date.as_bytes());
        hasher.update(b"|");
        hasher.update(self.debit.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.credit.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.balance.to_string().as_bytes());
        let hash: [u8; 32] = hasher.finalize().into();
        hash.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Convert to a matching candidate on the bank side. The net amount is
    /// credit minus debit; the balance and raw legs ride along in the audit
    /// payload, never read by scoring.
    pub fn into_candidate(self, source_ref: &str) -> MatchCandidate {
        let mut candidate = MatchCandidate::new(SourceType::BankTransaction, source_ref);
        candidate.transaction_date = self.date;
        candidate.amount = Some(self.credit - self.debit);
        candidate.counterparty_name = self.description.clone();
        candidate.raw_payload.insert("description".to_string(), self.description.into());
        candidate.raw_payload.insert("debit".to_string(), self.debit.to_string().into());
        candidate.raw_payload.insert("credit".to_string(), self.credit.to_string().into());
        candidate.raw_payload.insert("balance".to_string(), self.balance.to_string().into());
        candidate
    }
}
