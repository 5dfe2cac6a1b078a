//! Parquet batch source on cloud object storage (S3, R2, GCS, Azure)
//!
//! The async Parquet reader is driven by a private current-thread runtime,
//! so each `next_batch` call blocks until the object store answers.

use super::parquet_file::root_indices;
use super::types::BatchSource;
use crate::error::{Error, Result};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use parquet::arrow::async_reader::{ParquetObjectReader, ParquetRecordBatchStream};
use parquet::arrow::{ParquetRecordBatchStreamBuilder, ProjectionMask};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Parse an object URL into a store and the object's path within it
///
/// Supported formats:
/// - `s3://bucket/key.parquet` - AWS S3
/// - `r2://bucket/key.parquet` - Cloudflare R2 (S3-compatible)
/// - `gs://bucket/key.parquet` - Google Cloud Storage
/// - `az://container/key.parquet` - Azure Blob Storage
/// - `file:///abs/path.parquet` - Local filesystem
pub fn parse_object_url(url: &str) -> Result<(Arc<dyn ObjectStore>, ObjectPath)> {
    if let Some(rest) = url.strip_prefix("s3://") {
        let (bucket, key) = split_bucket(rest, url)?;
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create s3 client: {e}")))?;
        Ok((Arc::new(store), ObjectPath::from(key)))
    } else if let Some(rest) = url.strip_prefix("r2://") {
        let (bucket, key) = split_bucket(rest, url)?;
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        // AWS_ENDPOINT is read by from_env(); R2_ENDPOINT_URL takes precedence
        if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
            builder = builder.with_endpoint(endpoint);
        }
        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create r2 client: {e}")))?;
        Ok((Arc::new(store), ObjectPath::from(key)))
    } else if let Some(rest) = url.strip_prefix("gs://") {
        let (bucket, key) = split_bucket(rest, url)?;
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;
        Ok((Arc::new(store), ObjectPath::from(key)))
    } else if let Some(rest) = url.strip_prefix("az://") {
        let (container, key) = split_bucket(rest, url)?;
        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;
        Ok((Arc::new(store), ObjectPath::from(key)))
    } else if let Some(path) = url.strip_prefix("file://") {
        let path = Path::new(path);
        let path = ObjectPath::from_absolute_path(path)
            .map_err(|e| Error::config(format!("Invalid file URL {url}: {e}")))?;
        Ok((Arc::new(LocalFileSystem::new()), path))
    } else {
        Err(Error::config(format!("Unsupported object URL: {url}")))
    }
}

/// Split `bucket/key` into its parts; the key must not be empty
fn split_bucket<'a>(rest: &'a str, url: &str) -> Result<(&'a str, &'a str)> {
    match rest.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok((bucket, key)),
        _ => Err(Error::config(format!(
            "Object URL must name a bucket and an object: {url}"
        ))),
    }
}

/// Reads a Parquet object in batches of at most `batch_size` rows
pub struct ObjectStoreSource {
    url: String,
    runtime: Runtime,
    stream: ParquetRecordBatchStream<ParquetObjectReader>,
    schema: SchemaRef,
    total_rows: u64,
}

impl ObjectStoreSource {
    /// Open an object reading every column
    pub fn open(url: &str, batch_size: usize) -> Result<Self> {
        Self::open_projected(url, None, batch_size)
    }

    /// Open an object reading only the named top-level columns
    pub fn open_projected(url: &str, columns: Option<&[&str]>, batch_size: usize) -> Result<Self> {
        let runtime = build_runtime()?;
        let (store, path) = parse_object_url(url)?;

        let (stream, total_rows) = runtime.block_on(async {
            let meta = store.head(&path).await?;
            let reader = ParquetObjectReader::new(store, meta);
            let builder = ParquetRecordBatchStreamBuilder::new(reader).await?;
            let total_rows = builder.metadata().file_metadata().num_rows().max(0) as u64;

            let builder = match columns {
                Some(columns) => {
                    let indices = root_indices(builder.schema(), columns, Path::new(url))?;
                    let mask = ProjectionMask::roots(builder.parquet_schema(), indices);
                    builder.with_projection(mask)
                }
                None => builder,
            };

            let stream = builder.with_batch_size(batch_size).build()?;
            Ok::<_, Error>((stream, total_rows))
        })?;

        let schema = stream.schema().clone();
        tracing::debug!("Opened {} ({} rows)", url, total_rows);

        Ok(Self {
            url: url.to_string(),
            runtime,
            stream,
            schema,
            total_rows,
        })
    }

    /// Read only the footer schema
    pub fn read_schema(url: &str) -> Result<SchemaRef> {
        let runtime = build_runtime()?;
        let (store, path) = parse_object_url(url)?;
        runtime.block_on(async {
            let meta = store.head(&path).await?;
            let reader = ParquetObjectReader::new(store, meta);
            let builder = ParquetRecordBatchStreamBuilder::new(reader).await?;
            Ok::<_, Error>(builder.schema().clone())
        })
    }
}

impl BatchSource for ObjectStoreSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn total_rows(&self) -> u64 {
        self.total_rows
    }

    fn next_batch(&mut self) -> Option<Result<RecordBatch>> {
        let next = self.runtime.block_on(self.stream.next());
        next.map(|r| r.map_err(Error::from))
    }
}

fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::config(format!("Failed to start I/O runtime: {e}")))
}
