pub mod chunk;
pub mod pipeline;

pub use chunk::{StatementChunk, StatementRow};
pub use pipeline::{process_chunks, ChunkExtractor, ExtractError, MergeOutcome, MockExtractor};
