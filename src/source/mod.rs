//! Columnar source inputs
//!
//! Locates the per-provider Parquet files and reads them batch by batch.
//!
//! # Overview
//!
//! - `InputResolver` - finds the newest dated directory per provider and the
//!   occurrence / DNA-derived / measurement-or-fact files inside it
//! - `BatchSource` - row count from metadata plus lazy, bounded batches
//! - `ParquetSource` - local Parquet file
//! - `ObjectStoreSource` - Parquet on S3, R2, GCS, Azure or `file://`
//! - `MemorySource` - in-memory batches, for tests and embedding

mod memory;
mod parquet_file;
mod remote;
mod resolve;
mod types;

pub use memory::MemorySource;
pub use parquet_file::{read_column_descriptors, ParquetSource};
pub use remote::{parse_object_url, ObjectStoreSource};
pub use resolve::{parse_dated_dir_name, InputResolver, InputSet};
pub use types::{descriptors_from_schema, BatchSource, SourceLocation};

#[cfg(test)]
mod tests;
