//! Per-batch transformation applied by the loader

use crate::error::Result;
use crate::identifier::IdentifierDeriver;
use crate::transform::{CoercionStats, RecordTransformer};
use arrow::record_batch::RecordBatch;

/// Turns a raw source batch into a destination-ready batch
///
/// Errors returned here are fatal for the file; per-value problems belong in
/// `stats`.
pub trait BatchTransform {
    fn apply(&mut self, batch: &RecordBatch, stats: &mut CoercionStats) -> Result<RecordBatch>;

    /// Repeated native ids seen so far
    fn duplicate_ids(&self) -> u64 {
        0
    }
}

/// Record transformer followed by identifier derivation
///
/// Identifiers are read from the untransformed batch.
#[derive(Debug)]
pub struct RecordPipeline {
    transformer: RecordTransformer,
    deriver: IdentifierDeriver,
}

impl RecordPipeline {
    pub fn new(transformer: RecordTransformer, deriver: IdentifierDeriver) -> Self {
        Self {
            transformer,
            deriver,
        }
    }
}

impl BatchTransform for RecordPipeline {
    fn apply(&mut self, batch: &RecordBatch, stats: &mut CoercionStats) -> Result<RecordBatch> {
        let transformed = self.transformer.transform(batch, stats)?;
        self.deriver.derive_from(batch, &transformed)
    }

    fn duplicate_ids(&self) -> u64 {
        self.deriver.duplicate_ids()
    }
}
