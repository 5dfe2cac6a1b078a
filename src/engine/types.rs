//! Engine types
//!
//! Run reports and the post-load table inventory.

use crate::loader::LoadReport;
use crate::matcher::ColumnMatch;
use crate::types::RecordType;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Column comparison per record type
pub type Comparisons = BTreeMap<RecordType, Vec<ColumnMatch>>;

/// Non-fatal finding of the post-load catalog check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum VerificationWarning {
    /// The destination has no tables at all
    NoTables,
    /// A table's row count differs from what the run committed
    RowCountMismatch {
        table: String,
        expected: u64,
        actual: u64,
    },
}

impl fmt::Display for VerificationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationWarning::NoTables => f.write_str("destination store has no tables"),
            VerificationWarning::RowCountMismatch {
                table,
                expected,
                actual,
            } => write!(
                f,
                "table '{table}' holds {actual} rows, expected {expected}"
            ),
        }
    }
}

/// One destination table as seen after loading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub row_count: u64,
    /// Leading columns in declaration order
    pub columns: Vec<String>,
    /// One row of `columns` as text
    pub sample_row: Option<Vec<Option<String>>>,
}

/// Destination catalog snapshot
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableInventory {
    pub tables: Vec<TableSummary>,
    pub warnings: Vec<VerificationWarning>,
}

impl TableInventory {
    pub fn table(&self, name: &str) -> Option<&TableSummary> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl fmt::Display for TableInventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for table in &self.tables {
            writeln!(f, "{} ({} rows)", table.name, table.row_count)?;
            writeln!(f, "  columns: {}", table.columns.join(", "))?;
            if let Some(row) = &table.sample_row {
                let values: Vec<&str> = row.iter().map(|v| v.as_deref().unwrap_or("NULL")).collect();
                writeln!(f, "  sample:  {}", values.join(" | "))?;
            }
        }
        for warning in &self.warnings {
            writeln!(f, "WARNING: {warning}")?;
        }
        Ok(())
    }
}

/// Result of a whole pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    /// Renames applied across providers
    pub renames: usize,
    /// One report per loaded file, in load order
    pub loads: Vec<LoadReport>,
    pub inventory: TableInventory,
    /// Wall-clock duration in milliseconds
    pub elapsed_ms: u64,
}

impl PipelineReport {
    /// Rows committed per destination table
    pub fn rows_loaded_by_table(&self) -> BTreeMap<String, u64> {
        let mut totals = BTreeMap::new();
        for load in &self.loads {
            *totals.entry(load.table.clone()).or_insert(0) += load.rows_loaded;
        }
        totals
    }

    pub fn rows_loaded(&self) -> u64 {
        self.loads.iter().map(|l| l.rows_loaded).sum()
    }

    pub fn rows_expected(&self) -> u64 {
        self.loads.iter().map(|l| l.rows_expected).sum()
    }

    /// Every file loaded fully and verification found nothing
    pub fn is_complete(&self) -> bool {
        self.loads.iter().all(LoadReport::is_complete) && self.inventory.is_clean()
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for load in &self.loads {
            writeln!(f, "{load}")?;
        }
        writeln!(
            f,
            "Total: {}/{} rows loaded, {} renames, {}ms",
            self.rows_loaded(),
            self.rows_expected(),
            self.renames,
            self.elapsed_ms
        )?;
        write!(f, "{}", self.inventory)
    }
}
