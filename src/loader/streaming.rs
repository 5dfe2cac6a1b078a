//! Streaming loader: one source file into one table, one transaction per batch

use super::pipeline::BatchTransform;
use super::types::{BatchOutcome, LoadReport, LoadState};
use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::source::BatchSource;
use crate::store::{DestinationStore, WireFormat};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

/// Destination table columns, matched case-insensitively
#[derive(Debug, Clone)]
struct TableColumns {
    by_lower: HashMap<String, String>,
}

impl TableColumns {
    fn new(columns: &[String]) -> Self {
        Self {
            by_lower: columns
                .iter()
                .map(|c| (c.to_lowercase(), c.clone()))
                .collect(),
        }
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        self.by_lower.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// Loads a source file batch by batch
///
/// Resident memory is one batch. A batch whose copy fails is rolled back,
/// logged and skipped; read and transform errors abort the file.
#[derive(Debug)]
pub struct StreamingLoader {
    config: LoaderConfig,
    format: WireFormat,
    state: LoadState,
}

impl StreamingLoader {
    pub fn new(config: LoaderConfig) -> Self {
        let format = WireFormat::from_config(&config);
        Self {
            config,
            format,
            state: LoadState::Init,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    fn transition(&mut self, next: LoadState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid loader transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!("Loader {} -> {}", self.state, next);
        self.state = next;
    }

    /// Load every batch of `source` into `table`
    pub fn load(
        &mut self,
        source: &mut dyn BatchSource,
        transform: &mut dyn BatchTransform,
        store: &mut dyn DestinationStore,
        table: &str,
    ) -> Result<LoadReport> {
        let start = Instant::now();
        self.state = LoadState::Init;
        let mut report = LoadReport::new(table, source.describe());

        self.transition(LoadState::Counting);
        report.rows_expected = source.total_rows();

        let columns = store.table_columns(table)?.ok_or_else(|| {
            Error::database(format!(
                "Destination table '{table}' does not exist in {}",
                store.describe()
            ))
        })?;
        let table_columns = TableColumns::new(&columns);

        tracing::info!(
            "Loading {} ({} rows) into '{}'",
            report.source,
            report.rows_expected,
            table
        );

        let mut dropped = BTreeSet::new();
        let mut batch_index = 0;

        while let Some(next) = source.next_batch() {
            self.transition(LoadState::Streaming { batch: batch_index });
            let raw = next?;
            let rows = raw.num_rows() as u64;

            let transformed = transform.apply(&raw, &mut report.coercion)?;
            let projected = self.project(&transformed, &table_columns, &mut dropped)?;

            match self.copy_batch(store, table, &projected, batch_index) {
                Ok(()) => {
                    self.transition(LoadState::Committed { batch: batch_index });
                    tracing::debug!("Committed batch {} ({} rows)", batch_index, rows);
                    report.record(BatchOutcome::Committed { batch_index, rows });
                }
                Err(e) => {
                    self.transition(LoadState::BatchFailed { batch: batch_index });
                    self.log_failure(&e, &projected);
                    report.record(BatchOutcome::Failed {
                        batch_index,
                        rows,
                        error: e.to_string(),
                    });
                }
            }
            batch_index += 1;
        }

        self.transition(LoadState::Done);
        report.duplicate_ids = transform.duplicate_ids();
        report.dropped_columns = dropped.into_iter().collect();
        report.elapsed_ms = start.elapsed().as_millis() as u64;

        if !report.coercion.is_empty() {
            tracing::warn!(
                "{} values nulled by coercion in {}",
                report.coercion.total(),
                report.source
            );
        }
        if report.duplicate_ids > 0 {
            tracing::warn!(
                "{} repeated occurrence ids in {}",
                report.duplicate_ids,
                report.source
            );
        }
        if report.is_complete() {
            tracing::info!("{}", report);
        } else {
            tracing::warn!("{}", report);
        }
        Ok(report)
    }

    /// Keep the batch columns the table has, under the table's casing
    fn project(
        &self,
        batch: &RecordBatch,
        table: &TableColumns,
        dropped: &mut BTreeSet<String>,
    ) -> Result<RecordBatch> {
        let mut fields: Vec<Field> = Vec::with_capacity(batch.num_columns());
        let mut columns = Vec::with_capacity(batch.num_columns());
        let mut seen = BTreeSet::new();
        let mut newly_dropped = Vec::new();

        for (field, column) in batch.schema().fields().iter().zip(batch.columns()) {
            let target = match table.resolve(field.name()) {
                Some(target) => target.to_string(),
                None if self.config.project_to_table => {
                    if dropped.insert(field.name().clone()) {
                        newly_dropped.push(field.name().clone());
                    }
                    continue;
                }
                None => field.name().clone(),
            };
            if !seen.insert(target.to_lowercase()) {
                tracing::warn!(
                    "Column '{}' maps onto '{}' a second time; keeping the first",
                    field.name(),
                    target
                );
                continue;
            }
            fields.push(field.as_ref().clone().with_name(target));
            columns.push(column.clone());
        }

        if !newly_dropped.is_empty() {
            tracing::warn!(
                "Dropping columns absent from the destination table: {}",
                newly_dropped.join(", ")
            );
        }
        if fields.is_empty() {
            return Err(Error::EmptyColumnSet {
                context: "no batch column exists in the destination table".to_string(),
            });
        }
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }

    fn copy_batch(
        &self,
        store: &mut dyn DestinationStore,
        table: &str,
        batch: &RecordBatch,
        batch_index: usize,
    ) -> Result<()> {
        let columns: Vec<String> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        let payload = self
            .format
            .encode(batch)
            .map_err(|e| Error::batch_load(table, batch_index, e.to_string()))?;

        store.begin()?;
        let copied = store
            .copy_delimited(table, &columns, &payload, &self.format)
            .and_then(|_| store.commit());
        if let Err(e) = copied {
            if let Err(rollback) = store.rollback() {
                tracing::error!("Rollback of batch {} failed: {}", batch_index, rollback);
            }
            return Err(Error::batch_load(table, batch_index, e.to_string()));
        }
        Ok(())
    }

    fn log_failure(&self, error: &Error, batch: &RecordBatch) {
        let columns: Vec<&str> = batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect();
        tracing::warn!("{}", error);
        tracing::warn!("Columns: {}", columns.join(", "));

        let sample = batch.slice(0, self.config.sample_rows.min(batch.num_rows()));
        match pretty_format_batches(&[sample]) {
            Ok(table) => tracing::warn!("Sample rows:\n{}", table),
            Err(e) => tracing::warn!("Could not render sample rows: {}", e),
        }
    }
}
