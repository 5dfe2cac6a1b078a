//! Local Parquet batch source

use super::types::{descriptors_from_schema, BatchSource};
use crate::error::{Error, Result};
use crate::matcher::ColumnDescriptor;
use crate::types::Provider;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::ProjectionMask;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Reads a local Parquet file in batches of at most `batch_size` rows
pub struct ParquetSource {
    path: PathBuf,
    schema: SchemaRef,
    total_rows: u64,
    reader: ParquetRecordBatchReader,
}

impl ParquetSource {
    /// Open a file reading every column
    pub fn open(path: impl AsRef<Path>, batch_size: usize) -> Result<Self> {
        Self::open_projected(path, None, batch_size)
    }

    /// Open a file reading only the named top-level columns
    pub fn open_projected(
        path: impl AsRef<Path>,
        columns: Option<&[&str]>,
        batch_size: usize,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let builder = ParquetRecordBatchReaderBuilder::try_new(open_file(&path)?)?;
        let total_rows = builder.metadata().file_metadata().num_rows().max(0) as u64;

        let builder = match columns {
            Some(columns) => {
                let indices = root_indices(builder.schema(), columns, &path)?;
                let mask = ProjectionMask::roots(builder.parquet_schema(), indices);
                builder.with_projection(mask)
            }
            None => builder,
        };

        let reader = builder.with_batch_size(batch_size).build()?;
        let schema = reader.schema();

        tracing::debug!(
            "Opened {} ({} rows, {} columns)",
            path.display(),
            total_rows,
            schema.fields().len()
        );

        Ok(Self {
            path,
            schema,
            total_rows,
            reader,
        })
    }

    /// Read only the footer schema
    pub fn read_schema(path: impl AsRef<Path>) -> Result<SchemaRef> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(open_file(path.as_ref())?)?;
        Ok(builder.schema().clone())
    }
}

impl BatchSource for ParquetSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn total_rows(&self) -> u64 {
        self.total_rows
    }

    fn next_batch(&mut self) -> Option<Result<RecordBatch>> {
        self.reader.next().map(|r| r.map_err(Error::from))
    }
}

/// Column descriptors of a local Parquet file, read from its footer only
pub fn read_column_descriptors(
    path: impl AsRef<Path>,
    provider: Provider,
) -> Result<Vec<ColumnDescriptor>> {
    let schema = ParquetSource::read_schema(path)?;
    Ok(descriptors_from_schema(&schema, provider))
}

fn open_file(path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(File::open(path)?)
}

/// Positions of the named columns in the top-level schema
pub(super) fn root_indices(
    schema: &arrow::datatypes::Schema,
    columns: &[&str],
    path: &Path,
) -> Result<Vec<usize>> {
    columns
        .iter()
        .map(|name| {
            schema
                .index_of(name)
                .map_err(|_| Error::missing_column(*name, path.display().to_string()))
        })
        .collect()
}
