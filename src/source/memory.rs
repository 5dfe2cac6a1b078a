//! In-memory batch source

use super::types::BatchSource;
use crate::error::{Error, Result};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use std::collections::VecDeque;

/// Serves pre-built batches, re-sliced to at most `batch_size` rows
pub struct MemorySource {
    name: String,
    schema: SchemaRef,
    total_rows: u64,
    pending: VecDeque<RecordBatch>,
}

impl MemorySource {
    /// Create a source over `batches`, which must all share `schema`
    pub fn new(
        name: impl Into<String>,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
        batch_size: usize,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::invalid_value("batch_size", "must be greater than zero"));
        }

        let mut pending = VecDeque::new();
        let mut total_rows = 0u64;
        for batch in batches {
            if batch.schema() != schema {
                return Err(Error::validation(
                    "in-memory batches must share one schema",
                ));
            }
            total_rows += batch.num_rows() as u64;

            let mut offset = 0;
            while offset < batch.num_rows() {
                let len = batch_size.min(batch.num_rows() - offset);
                pending.push_back(batch.slice(offset, len));
                offset += len;
            }
        }

        Ok(Self {
            name: name.into(),
            schema,
            total_rows,
            pending,
        })
    }

    /// Create a source from a single batch
    pub fn from_batch(
        name: impl Into<String>,
        batch: RecordBatch,
        batch_size: usize,
    ) -> Result<Self> {
        let schema = batch.schema();
        Self::new(name, schema, vec![batch], batch_size)
    }
}

impl BatchSource for MemorySource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn total_rows(&self) -> u64 {
        self.total_rows
    }

    fn next_batch(&mut self) -> Option<Result<RecordBatch>> {
        self.pending.pop_front().map(Ok)
    }
}
