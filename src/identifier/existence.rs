//! Extension-existence index and duplicate occurrence-id tracking

use super::deriver::value_strings;
use crate::error::{Error, Result};
use crate::source::BatchSource;
use crate::types::RecordType;
use arrow::array::{ArrayRef, BooleanArray};
use std::collections::HashSet;

/// Parent ids present in one extension file
///
/// Holds ids only, never rows, so building it does not load the file.
#[derive(Debug, Clone)]
pub struct ExtensionIndex {
    record_type: RecordType,
    ids: HashSet<String>,
}

impl ExtensionIndex {
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            ids: HashSet::new(),
        }
    }

    /// Scan a source's parent-id column batch by batch
    pub fn build(
        source: &mut dyn BatchSource,
        record_type: RecordType,
        parent_column: &str,
    ) -> Result<Self> {
        let mut index = Self::new(record_type);
        while let Some(batch) = source.next_batch() {
            let batch = batch?;
            let column = batch.column_by_name(parent_column).ok_or_else(|| {
                Error::missing_column(parent_column, source.describe())
            })?;
            index.insert_column(column)?;
        }
        tracing::info!(
            "Indexed {} distinct parent ids from {}",
            index.len(),
            source.describe()
        );
        Ok(index)
    }

    /// Add every non-null id of a column
    pub fn insert_column(&mut self, column: &ArrayRef) -> Result<()> {
        self.ids.extend(value_strings(column)?.into_iter().flatten());
        Ok(())
    }

    pub fn insert(&mut self, id: impl Into<String>) {
        self.ids.insert(id.into());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Existence flag per occurrence id; unmatched and null ids are false
    pub fn flags(&self, ids: &[Option<String>]) -> BooleanArray {
        ids.iter()
            .map(|id| Some(id.as_deref().is_some_and(|id| self.contains(id))))
            .collect()
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Counts occurrence ids seen more than once across a file's batches
#[derive(Debug, Clone, Default)]
pub struct DuplicateTracker {
    seen: HashSet<String>,
    duplicates: u64,
}

impl DuplicateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch of ids; returns how many were already seen
    pub fn observe(&mut self, ids: &[Option<String>]) -> u64 {
        let mut found = 0;
        for id in ids.iter().flatten() {
            if !self.seen.insert(id.clone()) {
                found += 1;
            }
        }
        self.duplicates += found;
        found
    }

    /// Total repeated ids so far
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    /// Distinct ids so far
    pub fn distinct(&self) -> usize {
        self.seen.len()
    }
}
