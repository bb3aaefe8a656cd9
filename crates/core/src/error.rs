use thiserror::Error;

/// Run-level failures. Pair-level parse problems never surface here; they
/// degrade only the affected pair's scores.
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("invalid {collection} collection: {reason}")]
    Validation {
        collection: &'static str,
        reason: String,
    },
    #[error(
        "candidate sets too large: {left} x {right} pair evaluations exceed the limit of {limit}"
    )]
    InputTooLarge {
        left: usize,
        right: usize,
        limit: usize,
    },
}
