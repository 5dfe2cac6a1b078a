//! Loader types
//!
//! State machine states, per-batch outcomes and the per-file report.

use crate::transform::CoercionStats;
use serde::Serialize;
use std::fmt;

/// Streaming loader state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Init,
    /// Reading the row count from metadata
    Counting,
    /// Reading, transforming and copying a batch
    Streaming { batch: usize },
    Committed { batch: usize },
    /// The batch's transaction was rolled back
    BatchFailed { batch: usize },
    Done,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Init => f.write_str("init"),
            LoadState::Counting => f.write_str("counting"),
            LoadState::Streaming { batch } => write!(f, "streaming({batch})"),
            LoadState::Committed { batch } => write!(f, "committed({batch})"),
            LoadState::BatchFailed { batch } => write!(f, "batch_failed({batch})"),
            LoadState::Done => f.write_str("done"),
        }
    }
}

impl LoadState {
    /// Whether `next` may follow this state
    pub fn can_transition_to(self, next: LoadState) -> bool {
        use LoadState::*;
        match (self, next) {
            (Init, Counting) | (Counting, Streaming { batch: 0 }) | (Counting, Done) => true,
            (Streaming { batch: a }, Committed { batch: b })
            | (Streaming { batch: a }, BatchFailed { batch: b }) => a == b,
            (Committed { batch: a }, Streaming { batch: b })
            | (BatchFailed { batch: a }, Streaming { batch: b }) => b == a + 1,
            (Streaming { .. }, Done) | (Committed { .. }, Done) | (BatchFailed { .. }, Done) => {
                true
            }
            _ => false,
        }
    }
}

/// What happened to one batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    Committed { batch_index: usize, rows: u64 },
    Failed {
        batch_index: usize,
        rows: u64,
        error: String,
    },
}

impl BatchOutcome {
    pub fn batch_index(&self) -> usize {
        match self {
            BatchOutcome::Committed { batch_index, .. }
            | BatchOutcome::Failed { batch_index, .. } => *batch_index,
        }
    }

    pub fn rows(&self) -> u64 {
        match self {
            BatchOutcome::Committed { rows, .. } | BatchOutcome::Failed { rows, .. } => *rows,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, BatchOutcome::Committed { .. })
    }
}

/// Result of loading one source file into one table
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Destination table
    pub table: String,
    /// Source file description
    pub source: String,
    /// Rows the source metadata declares
    pub rows_expected: u64,
    /// Rows in committed batches
    pub rows_loaded: u64,
    /// Rows in rolled-back batches
    pub rows_failed: u64,
    /// Per-batch outcomes in order
    pub batches: Vec<BatchOutcome>,
    /// Repeated native occurrence ids across the file
    pub duplicate_ids: u64,
    /// Batch columns the destination table does not have
    pub dropped_columns: Vec<String>,
    /// Values nulled by non-strict coercion
    pub coercion: CoercionStats,
    /// Wall-clock duration in milliseconds
    pub elapsed_ms: u64,
}

impl LoadReport {
    pub fn new(table: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            source: source.into(),
            rows_expected: 0,
            rows_loaded: 0,
            rows_failed: 0,
            batches: Vec::new(),
            duplicate_ids: 0,
            dropped_columns: Vec::new(),
            coercion: CoercionStats::new(),
            elapsed_ms: 0,
        }
    }

    /// Record a batch outcome and update the row totals
    pub fn record(&mut self, outcome: BatchOutcome) {
        if outcome.is_committed() {
            self.rows_loaded += outcome.rows();
        } else {
            self.rows_failed += outcome.rows();
        }
        self.batches.push(outcome);
    }

    /// Indexes of rolled-back batches
    pub fn failed_batches(&self) -> Vec<usize> {
        self.batches
            .iter()
            .filter(|b| !b.is_committed())
            .map(BatchOutcome::batch_index)
            .collect()
    }

    /// Committed plus failed rows
    pub fn rows_accounted(&self) -> u64 {
        self.rows_loaded + self.rows_failed
    }

    /// Every expected row was committed
    pub fn is_complete(&self) -> bool {
        self.rows_loaded == self.rows_expected
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} rows loaded into '{}' in {} batches ({} failed) in {}ms",
            self.source,
            self.rows_loaded,
            self.rows_expected,
            self.table,
            self.batches.len(),
            self.failed_batches().len(),
            self.elapsed_ms
        )
    }
}
