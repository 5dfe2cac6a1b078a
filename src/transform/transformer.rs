//! Record transformer: raw provider batch → canonical batch

use super::coerce::{
    bool_to_int32, cast_to_int64, flatten, is_text, parse_datetime_column, split_interval_column,
};
use super::types::CoercionStats;
use crate::align::RenameMap;
use crate::config::TransformConfig;
use crate::error::{Error, Result};
use crate::types::Provider;
use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::collections::HashSet;
use std::sync::Arc;

/// A column being rewritten
struct Column {
    name: String,
    array: ArrayRef,
}

/// Canonicalizes one provider's batches
///
/// Steps run in a fixed order, each assuming the previous ones ran:
/// rename, booleans to integers, lists / binaries / nested values to text,
/// interval split, tolerant datetime parsing, backtick stripping, integer
/// casts.
#[derive(Debug, Clone)]
pub struct RecordTransformer {
    config: TransformConfig,
    provider: Provider,
    renames: Arc<RenameMap>,
}

impl RecordTransformer {
    pub fn new(config: TransformConfig, provider: Provider, renames: Arc<RenameMap>) -> Self {
        Self {
            config,
            provider,
            renames,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn renames(&self) -> &RenameMap {
        &self.renames
    }

    /// Transform one batch. Malformed values become nulls and are counted in `stats`.
    pub fn transform(&self, batch: &RecordBatch, stats: &mut CoercionStats) -> Result<RecordBatch> {
        let mut columns = self.rename(batch)?;

        for column in &mut columns {
            if column.array.data_type() == &DataType::Boolean {
                column.array = bool_to_int32(&column.array)?;
            }
        }

        for column in &mut columns {
            if let Some(flat) = flatten(&column.array)? {
                column.array = flat;
            }
        }

        self.split_interval(&mut columns, stats)?;
        self.parse_datetimes(&mut columns, stats)?;

        for column in &mut columns {
            if column.name.contains('`') {
                column.name = column.name.replace('`', "");
            }
        }

        self.cast_integers(&mut columns, stats)?;

        build_batch(columns)
    }

    /// Step 1: apply the provider's renames
    fn rename(&self, batch: &RecordBatch) -> Result<Vec<Column>> {
        let schema = batch.schema();
        if schema.fields().is_empty() {
            return Err(Error::EmptyColumnSet {
                context: format!("{} batch", self.provider),
            });
        }

        let present: HashSet<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        let columns = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, array)| {
                let raw = field.name().as_str();
                let name = match self.renames.get(self.provider, raw) {
                    Some(target) if present.contains(target) => {
                        tracing::debug!(
                            "Not renaming {} '{}' to '{}': column already present",
                            self.provider,
                            raw,
                            target
                        );
                        raw
                    }
                    Some(target) => target,
                    None => raw,
                };
                Column {
                    name: name.to_string(),
                    array: array.clone(),
                }
            })
            .collect();
        Ok(columns)
    }

    /// Step 5: replace the interval column with start and end timestamps
    fn split_interval(&self, columns: &mut Vec<Column>, stats: &mut CoercionStats) -> Result<()> {
        let Some(idx) = columns
            .iter()
            .position(|c| c.name == self.config.interval_column)
        else {
            return Ok(());
        };

        let (start, end, failed) = split_interval_column(&columns[idx].array)?;
        stats.record(&self.config.interval_column, failed);

        columns[idx] = Column {
            name: self.config.interval_start_column.clone(),
            array: start,
        };
        columns.insert(
            idx + 1,
            Column {
                name: self.config.interval_end_column.clone(),
                array: end,
            },
        );
        Ok(())
    }

    /// Step 6: tolerant parsing of configured text datetime columns
    fn parse_datetimes(&self, columns: &mut [Column], stats: &mut CoercionStats) -> Result<()> {
        for column in columns.iter_mut() {
            if !self.config.datetime_columns.contains(&column.name)
                || !is_text(column.array.data_type())
            {
                continue;
            }
            let (parsed, failed) = parse_datetime_column(&column.array)?;
            stats.record(&column.name, failed);
            column.array = parsed;
        }
        Ok(())
    }

    /// Step 8: non-strict casts of integer-semantic columns
    fn cast_integers(&self, columns: &mut [Column], stats: &mut CoercionStats) -> Result<()> {
        for column in columns.iter_mut() {
            if !self.config.integer_columns.contains(&column.name) {
                continue;
            }
            let (cast, failed) = cast_to_int64(&column.array)?;
            stats.record(&column.name, failed);
            column.array = cast;
        }
        Ok(())
    }
}

fn build_batch(columns: Vec<Column>) -> Result<RecordBatch> {
    let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = columns
        .into_iter()
        .map(|c| (Field::new(c.name, c.array.data_type().clone(), true), c.array))
        .unzip();
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}
