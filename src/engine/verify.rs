//! Post-load verification

use super::types::{TableInventory, TableSummary, VerificationWarning};
use crate::config::VerificationConfig;
use crate::error::Result;
use crate::store::DestinationStore;
use std::collections::BTreeMap;

/// Lists the destination catalog and checks row counts
#[derive(Debug, Clone)]
pub struct Verifier {
    first_n_columns: usize,
}

impl Verifier {
    pub fn new(config: &VerificationConfig) -> Self {
        Self {
            first_n_columns: config.first_n_columns,
        }
    }

    /// Row counts of the named tables; absent tables count as empty
    pub fn row_counts<'a>(
        &self,
        store: &dyn DestinationStore,
        tables: impl IntoIterator<Item = &'a str>,
    ) -> Result<BTreeMap<String, u64>> {
        let mut counts = BTreeMap::new();
        for table in tables {
            let count = match store.table_columns(table)? {
                Some(_) => store.row_count(table)?,
                None => 0,
            };
            counts.insert(table.to_string(), count);
        }
        Ok(counts)
    }

    /// Snapshot every table; `expected` row counts are checked where given
    pub fn inventory(
        &self,
        store: &dyn DestinationStore,
        expected: &BTreeMap<String, u64>,
    ) -> Result<TableInventory> {
        let mut inventory = TableInventory::default();

        for name in store.list_tables()? {
            let row_count = store.row_count(&name)?;
            let columns: Vec<String> = store
                .table_columns(&name)?
                .unwrap_or_default()
                .into_iter()
                .take(self.first_n_columns)
                .collect();
            let sample_row = store.sample_row(&name, &columns)?;

            inventory.tables.push(TableSummary {
                name,
                row_count,
                columns,
                sample_row,
            });
        }

        if inventory.tables.is_empty() {
            inventory.warnings.push(VerificationWarning::NoTables);
        }

        for (table, &expected) in expected {
            let actual = inventory.table(table).map_or(0, |t| t.row_count);
            if actual != expected {
                inventory.warnings.push(VerificationWarning::RowCountMismatch {
                    table: table.clone(),
                    expected,
                    actual,
                });
            }
        }

        for warning in &inventory.warnings {
            tracing::warn!("Verification: {}", warning);
        }
        tracing::info!("Verified {} tables", inventory.tables.len());
        Ok(inventory)
    }
}
