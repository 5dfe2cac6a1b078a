//! Mapping artifacts: per-record-type comparison CSVs and the merged rename map
//!
//! Artifacts are an audit trail only; nothing reads them back.

use super::types::RenameMap;
use crate::error::{Error, Result};
use crate::matcher::ColumnMatch;
use crate::types::RecordType;
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::csv::WriterBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::cmp::Ordering;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the rename map artifact
pub const RENAME_MAP_FILE: &str = "rename_map.json";

/// File name of a record type's comparison artifact
pub fn comparison_file_name(record_type: RecordType) -> String {
    format!("{}_schema_comparison.csv", record_type.as_str())
}

/// Rows in artifact order: match type, then similarity descending
pub fn sorted_for_artifact(matches: &[ColumnMatch]) -> Vec<&ColumnMatch> {
    let mut rows: Vec<&ColumnMatch> = matches.iter().collect();
    rows.sort_by(|a, b| {
        a.match_kind
            .as_str()
            .cmp(b.match_kind.as_str())
            .then_with(|| match (a.similarity, b.similarity) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    });
    rows
}

/// Comparison rows as an Arrow batch
pub fn comparison_batch(matches: &[ColumnMatch]) -> Result<RecordBatch> {
    let rows = sorted_for_artifact(matches);

    let schema = Arc::new(Schema::new(vec![
        Field::new("gbif_column", DataType::Utf8, true),
        Field::new("obis_column", DataType::Utf8, true),
        Field::new("normalized_name", DataType::Utf8, false),
        Field::new("match_type", DataType::Utf8, false),
        Field::new("similarity", DataType::Float64, true),
        Field::new("differences", DataType::Utf8, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter(
            rows.iter().map(|m| m.gbif_column.as_deref()),
        )),
        Arc::new(StringArray::from_iter(
            rows.iter().map(|m| m.obis_column.as_deref()),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|m| m.normalized_name.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|m| m.match_kind.as_str()),
        )),
        Arc::new(Float64Array::from_iter(rows.iter().map(|m| m.similarity))),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|m| m.differences()),
        )),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

/// Write a record type's comparison CSV into `dir`
pub fn write_comparison_csv(
    dir: impl AsRef<Path>,
    record_type: RecordType,
    matches: &[ColumnMatch],
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(comparison_file_name(record_type));

    let batch = comparison_batch(matches)?;
    let file = File::create(&path)?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(&batch)?;

    tracing::info!(
        "Wrote {} comparison rows to {}",
        batch.num_rows(),
        path.display()
    );
    Ok(path)
}

/// Write the merged rename map as JSON into `dir`
pub fn write_rename_map(dir: impl AsRef<Path>, map: &RenameMap) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(RENAME_MAP_FILE);
    let json = serde_json::to_string_pretty(map)?;
    fs::write(&path, json).map_err(|e| {
        Error::Other(format!("Failed to write {}: {}", path.display(), e))
    })?;
    Ok(path)
}
