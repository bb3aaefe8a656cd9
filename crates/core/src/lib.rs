pub mod candidate;
pub mod error;
pub mod money;
pub mod result;
pub mod summary;

pub use candidate::{CandidateRef, MatchCandidate, SourceType};
pub use error::ReconcileError;
pub use money::Money;
pub use result::{CriterionScores, MatchResult, MatchStatus, MatchType};
pub use summary::ReconciliationSummary;
