//! Streaming loader
//!
//! Moves one source file into one destination table without holding more
//! than a batch in memory:
//!
//! ```text
//! Init -> Counting -> Streaming(n) -> Committed(n) | BatchFailed(n) -> Streaming(n+1) -> ... -> Done
//! ```
//!
//! Each batch is transformed, projected onto the table's columns, encoded
//! as delimited text and copied inside its own transaction. A failed copy
//! rolls back only that batch.

mod pipeline;
mod streaming;
mod types;

pub use pipeline::{BatchTransform, RecordPipeline};
pub use streaming::StreamingLoader;
pub use types::{BatchOutcome, LoadReport, LoadState};

#[cfg(test)]
mod tests;
