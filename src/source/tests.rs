//! Tests for source module

use super::*;
use crate::config::{InputConfig, ProviderFiles};
use crate::error::Error;
use crate::types::{PhysicalType, Provider, RecordType};
use arrow::array::{ArrayRef, BooleanArray, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use pretty_assertions::assert_eq;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use test_case::test_case;

fn sample_batch(rows: usize) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("gbifID", DataType::Int64, false),
        Field::new("occurrenceID", DataType::Utf8, true),
        Field::new("hasCoordinate", DataType::Boolean, true),
    ]));
    let ids: Vec<i64> = (0..rows as i64).collect();
    let occ: Vec<String> = (0..rows).map(|i| format!("occ-{i}")).collect();
    let flags: Vec<bool> = (0..rows).map(|i| i % 2 == 0).collect();
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(ids)) as ArrayRef,
            Arc::new(StringArray::from(occ)) as ArrayRef,
            Arc::new(BooleanArray::from(flags)) as ArrayRef,
        ],
    )
    .unwrap()
}

fn write_parquet(path: &Path, batch: &RecordBatch) {
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
}

fn drain(source: &mut dyn BatchSource) -> Vec<usize> {
    let mut sizes = Vec::new();
    while let Some(batch) = source.next_batch() {
        sizes.push(batch.unwrap().num_rows());
    }
    sizes
}

fn touch_exports(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    let batch = sample_batch(2);
    for name in ["occurrence.parquet", "dna_derived.parquet", "mof.parquet"] {
        write_parquet(&dir.join(name), &batch);
    }
}

// ============================================================================
// Parquet Source
// ============================================================================

#[test]
fn test_parquet_source_batches_are_bounded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("occurrence.parquet");
    write_parquet(&path, &sample_batch(25));

    let mut source = ParquetSource::open(&path, 10).unwrap();
    assert_eq!(source.total_rows(), 25);
    assert_eq!(source.schema().fields().len(), 3);
    assert_eq!(drain(&mut source), vec![10, 10, 5]);
}

#[test]
fn test_parquet_source_projection() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("occurrence.parquet");
    write_parquet(&path, &sample_batch(4));

    let mut source = ParquetSource::open_projected(&path, Some(&["occurrenceID"]), 100).unwrap();
    let batch = source.next_batch().unwrap().unwrap();
    assert_eq!(batch.num_columns(), 1);
    assert_eq!(batch.schema().field(0).name(), "occurrenceID");
}

#[test]
fn test_parquet_source_projection_missing_column() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("occurrence.parquet");
    write_parquet(&path, &sample_batch(1));

    let result = ParquetSource::open_projected(&path, Some(&["nope"]), 100);
    assert!(matches!(result, Err(Error::MissingColumn { .. })));
}

#[test]
fn test_parquet_source_missing_file() {
    let result = ParquetSource::open("/no/such/file.parquet", 10);
    assert!(matches!(result, Err(Error::FileNotFound { .. })));
}

#[test]
fn test_read_column_descriptors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("occurrence.parquet");
    write_parquet(&path, &sample_batch(1));

    let descriptors = read_column_descriptors(&path, Provider::Gbif).unwrap();
    let summary: Vec<(&str, PhysicalType)> = descriptors
        .iter()
        .map(|d| (d.name.as_str(), d.physical_type))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("gbifID", PhysicalType::Int),
            ("occurrenceID", PhysicalType::String),
            ("hasCoordinate", PhysicalType::Bool),
        ]
    );
    assert!(descriptors.iter().all(|d| d.source == Provider::Gbif));
}

// ============================================================================
// Memory Source
// ============================================================================

#[test]
fn test_memory_source_reslices() {
    let batch = sample_batch(7);
    let mut source = MemorySource::from_batch("mem", batch, 3).unwrap();
    assert_eq!(source.total_rows(), 7);
    assert_eq!(drain(&mut source), vec![3, 3, 1]);
}

#[test]
fn test_memory_source_rejects_zero_batch_size() {
    assert!(MemorySource::from_batch("mem", sample_batch(1), 0).is_err());
}

// ============================================================================
// Locations
// ============================================================================

#[test]
fn test_source_location_parse() {
    assert_eq!(
        SourceLocation::parse("/data/occ.parquet"),
        SourceLocation::Local("/data/occ.parquet".into())
    );
    assert_eq!(
        SourceLocation::parse("file:///data/occ.parquet"),
        SourceLocation::Local("/data/occ.parquet".into())
    );
    assert_eq!(
        SourceLocation::parse("s3://bucket/gbif/occ.parquet"),
        SourceLocation::Remote("s3://bucket/gbif/occ.parquet".to_string())
    );
}

#[test]
fn test_parse_object_url_rejects_bad_urls() {
    assert!(parse_object_url("ftp://host/file.parquet").is_err());
    assert!(parse_object_url("s3://bucket-only").is_err());
}

#[test]
fn test_object_store_source_reads_file_url() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("occurrence.parquet");
    write_parquet(&path, &sample_batch(12));

    let url = format!("file://{}", path.display());
    let schema = ObjectStoreSource::read_schema(&url).unwrap();
    assert_eq!(schema.fields().len(), 3);

    let mut source = ObjectStoreSource::open(&url, 5).unwrap();
    assert_eq!(source.total_rows(), 12);
    assert_eq!(drain(&mut source), vec![5, 5, 2]);
}

// ============================================================================
// Input Resolution
// ============================================================================

#[test_case("2024-03-01", Some((2024, 3, 1)))]
#[test_case("2024_03_01", Some((2024, 3, 1)))]
#[test_case("latest", None)]
#[test_case("2024-13-01", None)]
fn test_parse_dated_dir_name(name: &str, expected: Option<(i32, u32, u32)>) {
    let expected = expected.map(|(y, m, d)| chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap());
    assert_eq!(parse_dated_dir_name(name), expected);
}

#[test]
fn test_latest_directories_picks_newest() {
    let base = tempdir().unwrap();
    fs::create_dir_all(base.path().join("gbif/2024-01-01")).unwrap();
    fs::create_dir_all(base.path().join("gbif/2024_03_01")).unwrap();
    fs::create_dir_all(base.path().join("gbif/scratch")).unwrap();
    fs::create_dir_all(base.path().join("obis/2023-12-31")).unwrap();

    let latest = InputResolver::new(base.path()).latest_directories().unwrap();
    assert_eq!(latest[&Provider::Gbif], base.path().join("gbif/2024_03_01"));
    assert_eq!(latest[&Provider::Obis], base.path().join("obis/2023-12-31"));
}

#[test]
fn test_missing_provider_directory_is_config_error() {
    let base = tempdir().unwrap();
    fs::create_dir_all(base.path().join("gbif/2024-01-01")).unwrap();

    let err = InputResolver::new(base.path()).latest_directories().unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn test_no_dated_directories_is_validation_error() {
    let base = tempdir().unwrap();
    fs::create_dir_all(base.path().join("gbif/scratch")).unwrap();
    fs::create_dir_all(base.path().join("obis/2024-01-01")).unwrap();

    let err = InputResolver::new(base.path()).latest_directories().unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn test_resolve_finds_record_files() {
    let base = tempdir().unwrap();
    touch_exports(&base.path().join("gbif/2024-03-01"));
    touch_exports(&base.path().join("obis/2024-02-15"));

    let inputs = InputResolver::new(base.path()).resolve().unwrap();
    assert_eq!(inputs.len(), 6);
    assert_eq!(
        inputs.get(Provider::Obis, RecordType::MeasurementOrFact),
        Some(&SourceLocation::Local(
            base.path().join("obis/2024-02-15/mof.parquet")
        ))
    );
}

#[test]
fn test_resolve_missing_file_is_schema_resolution_error() {
    let base = tempdir().unwrap();
    touch_exports(&base.path().join("gbif/2024-03-01"));
    let obis = base.path().join("obis/2024-02-15");
    touch_exports(&obis);
    fs::remove_file(obis.join("dna_derived.parquet")).unwrap();

    let err = InputResolver::new(base.path()).resolve().unwrap_err();
    assert!(matches!(err, Error::SchemaResolution { .. }));
}

#[test]
fn test_input_set_explicit_files_skip_resolution() {
    let mut config = InputConfig::default();
    for provider in Provider::ALL {
        config.files.insert(
            provider,
            ProviderFiles {
                occurrence: format!("/data/{provider}/occ.parquet"),
                dna_derived: format!("s3://bucket/{provider}/dna.parquet"),
                mof: format!("/data/{provider}/mof.parquet"),
            },
        );
    }

    let inputs = InputSet::from_config(&config).unwrap();
    assert_eq!(inputs.len(), 6);
    assert!(matches!(
        inputs.require(Provider::Gbif, RecordType::DnaDerived).unwrap(),
        SourceLocation::Remote(_)
    ));
}

#[test]
fn test_input_set_requires_base_dir() {
    let err = InputSet::from_config(&InputConfig::default()).unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { .. }));
}
