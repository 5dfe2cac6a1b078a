//! Transform types

use serde::Serialize;
use std::collections::BTreeMap;

/// Values turned into nulls by non-strict coercion, per column
///
/// Only values that were present before coercion are counted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoercionStats {
    by_column: BTreeMap<String, u64>,
}

impl CoercionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` failed coercions in `column`
    pub fn record(&mut self, column: &str, count: u64) {
        if count > 0 {
            *self.by_column.entry(column.to_string()).or_default() += count;
        }
    }

    /// Add another set of counts into this one
    pub fn merge(&mut self, other: &CoercionStats) {
        for (column, count) in &other.by_column {
            self.record(column, *count);
        }
    }

    /// Failures in one column
    pub fn get(&self, column: &str) -> u64 {
        self.by_column.get(column).copied().unwrap_or(0)
    }

    /// Failures across all columns
    pub fn total(&self) -> u64 {
        self.by_column.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_column.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.by_column.iter().map(|(c, n)| (c.as_str(), *n))
    }
}
