//! Source types

use super::parquet_file::ParquetSource;
use super::remote::ObjectStoreSource;
use crate::error::Result;
use crate::matcher::ColumnDescriptor;
use crate::types::{PhysicalType, Provider};
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::fmt;
use std::path::PathBuf;

/// A lazily read sequence of bounded record batches
pub trait BatchSource {
    /// Human-readable location, for logs
    fn describe(&self) -> String;

    /// Arrow schema of the batches
    fn schema(&self) -> SchemaRef;

    /// Total row count, taken from metadata without reading rows
    fn total_rows(&self) -> u64;

    /// Next batch, `None` once the source is exhausted
    fn next_batch(&mut self) -> Option<Result<RecordBatch>>;
}

/// Where a source file lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// File on the local filesystem
    Local(PathBuf),
    /// Object-store URL (`s3://`, `r2://`, `gs://`, `az://`)
    Remote(String),
}

impl SourceLocation {
    /// Classify a configured location string
    pub fn parse(location: &str) -> Self {
        if let Some(path) = location.strip_prefix("file://") {
            return SourceLocation::Local(PathBuf::from(path));
        }
        if location.contains("://") {
            SourceLocation::Remote(location.to_string())
        } else {
            SourceLocation::Local(PathBuf::from(location))
        }
    }

    /// Open the location as a batch source
    pub fn open(&self, batch_size: usize) -> Result<Box<dyn BatchSource>> {
        self.open_projected(None, batch_size)
    }

    /// Open the location reading only the named columns
    pub fn open_projected(
        &self,
        columns: Option<&[&str]>,
        batch_size: usize,
    ) -> Result<Box<dyn BatchSource>> {
        Ok(match self {
            SourceLocation::Local(path) => {
                Box::new(ParquetSource::open_projected(path, columns, batch_size)?)
            }
            SourceLocation::Remote(url) => {
                Box::new(ObjectStoreSource::open_projected(url, columns, batch_size)?)
            }
        })
    }

    /// Read only the schema
    pub fn schema(&self) -> Result<SchemaRef> {
        match self {
            SourceLocation::Local(path) => ParquetSource::read_schema(path),
            SourceLocation::Remote(url) => ObjectStoreSource::read_schema(url),
        }
    }

    /// Column descriptors for a provider's file
    pub fn column_descriptors(&self, provider: Provider) -> Result<Vec<ColumnDescriptor>> {
        Ok(descriptors_from_schema(&*self.schema()?, provider))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Local(path) => write!(f, "{}", path.display()),
            SourceLocation::Remote(url) => f.write_str(url),
        }
    }
}

/// Map an Arrow schema to column descriptors
pub fn descriptors_from_schema(schema: &Schema, provider: Provider) -> Vec<ColumnDescriptor> {
    schema
        .fields()
        .iter()
        .map(|field| {
            ColumnDescriptor::new(
                field.name().clone(),
                provider,
                PhysicalType::from(field.data_type()),
            )
        })
        .collect()
}
