use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::chunk::{StatementChunk, StatementRow};

/// Failure of one chunk's extraction. Carries the upstream service's message
/// verbatim; the chunk index is tracked by the merge, not the error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct ExtractError(pub String);

/// External extraction service (OCR + field mapping) behind a stable seam.
/// Implementations are called from a bounded worker pool and must be safe to
/// invoke concurrently.
pub trait ChunkExtractor: Send + Sync {
    fn extract(&self, chunk: &StatementChunk) -> Result<Vec<StatementRow>, ExtractError>;
}

/// Merged statement rows plus the chunks that failed. A failed chunk never
/// blocks the rows the other chunks produced.
#[derive(Debug)]
pub struct MergeOutcome {
    pub rows: Vec<StatementRow>,
    pub failed_chunks: Vec<(usize, ExtractError)>,
}

/// Run every chunk through the extractor with at most `max_workers`
/// simultaneous calls, then merge in chunk-index order, keeping the first
/// occurrence of each content fingerprint. Overlapping chunk boundaries
/// therefore contribute each row exactly once.
pub async fn process_chunks<E: ChunkExtractor + 'static>(
    extractor: Arc<E>,
    chunks: Vec<StatementChunk>,
    max_workers: usize,
) -> MergeOutcome {
    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let mut tasks = JoinSet::new();

    for chunk in chunks {
        let extractor = Arc::clone(&extractor);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return (chunk.index, Err(ExtractError("worker pool closed".to_string())))
                }
            };
            (chunk.index, extractor.extract(&chunk))
        });
    }

    let mut per_chunk = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => {
                per_chunk.insert(index, result);
            }
            Err(e) => {
                tracing::error!("chunk task failed to complete: {e}");
            }
        }
    }

    merge_chunk_results(per_chunk)
}

/// Deterministic merge of per-chunk extraction results. Separated from the
/// async pool so the dedup rule is testable without a runtime.
pub fn merge_chunk_results(
    per_chunk: BTreeMap<usize, Result<Vec<StatementRow>, ExtractError>>,
) -> MergeOutcome {
    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    let mut failed_chunks = Vec::new();

    for (index, result) in per_chunk {
        match result {
            Ok(chunk_rows) => {
                for row in chunk_rows {
                    if seen.insert(row.fingerprint()) {
                        rows.push(row);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(chunk = index, "chunk extraction failed: {e}");
                failed_chunks.push((index, e));
            }
        }
    }

    MergeOutcome { rows, failed_chunks }
}

/// Canned extractor for tests: answers per chunk index, errors on chunks it
/// has no answer for.
pub struct MockExtractor {
    responses: HashMap<usize, Result<Vec<StatementRow>, ExtractError>>,
}

impl MockExtractor {
    pub fn new(responses: HashMap<usize, Result<Vec<StatementRow>, ExtractError>>) -> Self {
        Self { responses }
    }
}

impl ChunkExtractor for MockExtractor {
    fn extract(&self, chunk: &StatementChunk) -> Result<Vec<StatementRow>, ExtractError> {
        self.responses
            .get(&chunk.index)
            .cloned()
            .unwrap_or_else(|| Err(ExtractError(format!("no response for chunk {}", chunk.index))))
    }
}
