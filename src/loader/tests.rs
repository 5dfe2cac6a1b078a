//! Tests for loader module

use super::*;
use crate::align::RenameMap;
use crate::config::{IdentifierConfig, LoaderConfig, TransformConfig};
use crate::error::{Error, Result};
use crate::identifier::{stable_identifier, IdentifierDeriver};
use crate::source::MemorySource;
use crate::store::{DestinationStore, DuckDbStore, WireFormat};
use crate::transform::{CoercionStats, RecordTransformer};
use crate::types::{Provider, RecordType};
use arrow::array::{ArrayRef, AsArray, BooleanArray, Int64Array, StringArray};
use arrow::datatypes::Int64Type;
use arrow::record_batch::RecordBatch;
use pretty_assertions::assert_eq;
use std::sync::Arc;

/// Loads batches as read
struct Passthrough;

impl BatchTransform for Passthrough {
    fn apply(&mut self, batch: &RecordBatch, _stats: &mut CoercionStats) -> Result<RecordBatch> {
        Ok(batch.clone())
    }
}

fn store_with(ddl: &str) -> DuckDbStore {
    let store = DuckDbStore::in_memory().unwrap();
    store.execute_batch(ddl).unwrap();
    store
}

fn loader(batch_size: usize) -> StreamingLoader {
    StreamingLoader::new(LoaderConfig::default().with_batch_size(batch_size))
}

/// Seven rows, batch size 2; row 3 (batch 1) is not an integer
fn ids_with_malformed_row() -> MemorySource {
    let batch = RecordBatch::try_from_iter(vec![
        (
            "id",
            Arc::new(StringArray::from(vec!["1", "2", "3", "oops", "5", "6", "7"])) as ArrayRef,
        ),
        (
            "name",
            Arc::new(StringArray::from(vec![
                Some("a"),
                Some(""),
                None,
                Some("d"),
                Some("e"),
                Some("f"),
                Some("g"),
            ])) as ArrayRef,
        ),
    ])
    .unwrap();
    MemorySource::from_batch("ids", batch, 2).unwrap()
}

fn count_where(store: &DuckDbStore, table: &str, predicate: &str) -> i64 {
    store
        .conn_for_tests()
        .query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE {predicate}"),
            [],
            |row| row.get(0),
        )
        .unwrap()
}

// ============================================================================
// State Machine
// ============================================================================

#[test]
fn test_state_transitions() {
    use LoadState::*;
    assert!(Init.can_transition_to(Counting));
    assert!(Counting.can_transition_to(Streaming { batch: 0 }));
    assert!(Counting.can_transition_to(Done));
    assert!(Streaming { batch: 2 }.can_transition_to(Committed { batch: 2 }));
    assert!(Streaming { batch: 2 }.can_transition_to(BatchFailed { batch: 2 }));
    assert!(BatchFailed { batch: 2 }.can_transition_to(Streaming { batch: 3 }));
    assert!(Committed { batch: 3 }.can_transition_to(Done));

    assert!(!Init.can_transition_to(Streaming { batch: 0 }));
    assert!(!Counting.can_transition_to(Streaming { batch: 1 }));
    assert!(!Streaming { batch: 1 }.can_transition_to(Committed { batch: 2 }));
    assert!(!Committed { batch: 1 }.can_transition_to(Streaming { batch: 1 }));
    assert!(!Done.can_transition_to(Counting));
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_malformed_row_fails_only_its_batch() {
    let mut store = store_with("CREATE TABLE t (id BIGINT, name VARCHAR);");
    let mut source = ids_with_malformed_row();
    let mut loader = loader(2);

    let report = loader
        .load(&mut source, &mut Passthrough, &mut store, "t")
        .unwrap();

    assert_eq!(loader.state(), LoadState::Done);
    assert_eq!(report.rows_expected, 7);
    assert_eq!(report.rows_loaded, 5);
    assert_eq!(report.rows_failed, 2);
    assert_eq!(report.rows_accounted(), report.rows_expected);
    assert_eq!(report.batches.len(), 4);
    assert_eq!(report.failed_batches(), vec![1]);
    assert!(!report.is_complete());

    assert_eq!(store.row_count("t").unwrap(), 5);
    assert_eq!(count_where(&store, "t", "id IN (3, 4)"), 0);
    assert_eq!(count_where(&store, "t", "name = ''"), 1);
    // the row with a null name sat in the failed batch
    assert_eq!(count_where(&store, "t", "name IS NULL"), 0);
}

#[test]
fn test_failed_batch_outcome_carries_error() {
    let mut store = store_with("CREATE TABLE t (id BIGINT, name VARCHAR);");
    let report = loader(2)
        .load(&mut ids_with_malformed_row(), &mut Passthrough, &mut store, "t")
        .unwrap();

    match &report.batches[1] {
        BatchOutcome::Failed {
            batch_index,
            rows,
            error,
        } => {
            assert_eq!((*batch_index, *rows), (1, 2));
            assert!(error.contains("Batch 1 failed to load into 't'"));
        }
        other => panic!("expected a failed batch, got {other:?}"),
    }
}

#[test]
fn test_complete_load() {
    let mut store = store_with("CREATE TABLE t (id VARCHAR, name VARCHAR);");
    let report = loader(2)
        .load(&mut ids_with_malformed_row(), &mut Passthrough, &mut store, "t")
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.batches.len(), 4);
    assert!(report.failed_batches().is_empty());
    assert_eq!(store.row_count("t").unwrap(), 7);
}

#[test]
fn test_empty_source_goes_straight_to_done() {
    let mut store = store_with("CREATE TABLE t (id VARCHAR);");
    let batch = RecordBatch::try_from_iter(vec![(
        "id",
        Arc::new(StringArray::from(Vec::<&str>::new())) as ArrayRef,
    )])
    .unwrap();
    let mut source = MemorySource::from_batch("empty", batch, 10).unwrap();
    let mut loader = loader(10);

    let report = loader
        .load(&mut source, &mut Passthrough, &mut store, "t")
        .unwrap();
    assert_eq!(loader.state(), LoadState::Done);
    assert_eq!(report.rows_expected, 0);
    assert!(report.is_complete());
}

#[test]
fn test_missing_table_is_fatal() {
    let mut store = DuckDbStore::in_memory().unwrap();
    let err = loader(2)
        .load(&mut ids_with_malformed_row(), &mut Passthrough, &mut store, "nope")
        .unwrap_err();
    assert!(matches!(err, Error::Database { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_projection_drops_unknown_columns_and_uses_table_casing() {
    let mut store = store_with("CREATE TABLE t (ID VARCHAR);");
    let report = loader(10)
        .load(&mut ids_with_malformed_row(), &mut Passthrough, &mut store, "t")
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.dropped_columns, vec!["name".to_string()]);
    assert_eq!(store.row_count("t").unwrap(), 7);
}

#[test]
fn test_no_shared_columns_is_fatal() {
    let mut store = store_with("CREATE TABLE t (other VARCHAR);");
    let err = loader(10)
        .load(&mut ids_with_malformed_row(), &mut Passthrough, &mut store, "t")
        .unwrap_err();
    assert!(matches!(err, Error::EmptyColumnSet { .. }));
}

#[test]
fn test_without_projection_extra_columns_fail_batches() {
    let mut store = store_with("CREATE TABLE t (id VARCHAR);");
    let mut loader = StreamingLoader::new(
        LoaderConfig::default()
            .with_batch_size(10)
            .with_projection(false),
    );
    let report = loader
        .load(&mut ids_with_malformed_row(), &mut Passthrough, &mut store, "t")
        .unwrap();

    assert_eq!(report.rows_loaded, 0);
    assert_eq!(report.rows_failed, 7);
    assert_eq!(store.row_count("t").unwrap(), 0);
}

struct FailingTransform;

impl BatchTransform for FailingTransform {
    fn apply(&mut self, _batch: &RecordBatch, _stats: &mut CoercionStats) -> Result<RecordBatch> {
        Err(Error::EmptyColumnSet {
            context: "every column renamed away".to_string(),
        })
    }
}

#[test]
fn test_transform_errors_abort_the_file() {
    let mut store = store_with("CREATE TABLE t (id VARCHAR);");
    let err = loader(2)
        .load(&mut ids_with_malformed_row(), &mut FailingTransform, &mut store, "t")
        .unwrap_err();
    assert!(matches!(err, Error::EmptyColumnSet { .. }));
    assert_eq!(store.row_count("t").unwrap(), 0);
}

// ============================================================================
// Record Pipeline
// ============================================================================

#[test]
fn test_record_pipeline_loads_canonical_rows() {
    let mut store = store_with(
        "CREATE TABLE occurrence (
            source_id BIGINT,
            event_date_start TIMESTAMP,
            event_date_end TIMESTAMP,
            year BIGINT,
            is_sequenced INTEGER,
            data_source VARCHAR
        );",
    );
    let batch = RecordBatch::try_from_iter(vec![
        ("gbifID", Arc::new(Int64Array::from(vec![10, 11, 10])) as ArrayRef),
        (
            "eventDate",
            Arc::new(StringArray::from(vec![
                Some("2020-05-01/2020-05-03"),
                Some("2020-05-01"),
                Some("not a date"),
            ])) as ArrayRef,
        ),
        (
            "year",
            Arc::new(StringArray::from(vec![Some("2020"), Some("x"), None])) as ArrayRef,
        ),
        (
            "is_sequenced",
            Arc::new(BooleanArray::from(vec![Some(true), Some(false), None])) as ArrayRef,
        ),
    ])
    .unwrap();
    let mut source = MemorySource::from_batch("gbif occurrence", batch, 2).unwrap();

    let renames = Arc::new(RenameMap::default());
    let mut pipeline = RecordPipeline::new(
        RecordTransformer::new(TransformConfig::default(), Provider::Gbif, renames.clone()),
        IdentifierDeriver::new(
            IdentifierConfig::default(),
            Provider::Gbif,
            RecordType::Occurrence,
            renames,
        ),
    );

    let report = loader(2)
        .load(&mut source, &mut pipeline, &mut store, "occurrence")
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.duplicate_ids, 1);
    assert_eq!(report.coercion.get("year"), 1);
    assert!(report.coercion.total() >= 2);

    assert_eq!(
        count_where(
            &store,
            "occurrence",
            "source_id = 10 AND event_date_start = TIMESTAMP '2020-05-01 00:00:00' \
             AND event_date_end = TIMESTAMP '2020-05-03 00:00:00' AND year = 2020 \
             AND is_sequenced = 1"
        ),
        1
    );
    assert_eq!(
        count_where(
            &store,
            "occurrence",
            "source_id = 11 AND event_date_end = event_date_start AND year IS NULL"
        ),
        1
    );
    assert_eq!(count_where(&store, "occurrence", "data_source = 'gbif'"), 3);
    assert_eq!(count_where(&store, "occurrence", "is_sequenced IS NULL"), 1);
}

#[test]
fn test_record_pipeline_hashes_values_as_read() {
    let batch = RecordBatch::try_from_iter(vec![
        ("gbifid", Arc::new(Int64Array::from(vec![42])) as ArrayRef),
        ("occurrenceid", Arc::new(StringArray::from(vec!["occ-1"])) as ArrayRef),
        ("measurementtype", Arc::new(StringArray::from(vec!["length"])) as ArrayRef),
        ("measurementvalue", Arc::new(StringArray::from(vec!["7.0"])) as ArrayRef),
    ])
    .unwrap();

    let config = TransformConfig {
        integer_columns: vec!["measurementvalue".to_string()],
        ..TransformConfig::default()
    };
    let renames = Arc::new(RenameMap::default());
    let mut pipeline = RecordPipeline::new(
        RecordTransformer::new(config, Provider::Gbif, renames.clone()),
        IdentifierDeriver::new(
            IdentifierConfig::default(),
            Provider::Gbif,
            RecordType::MeasurementOrFact,
            renames,
        ),
    );

    let out = pipeline.apply(&batch, &mut CoercionStats::new()).unwrap();

    let value = out.column_by_name("measurementvalue").unwrap();
    assert_eq!(value.as_primitive::<Int64Type>().value(0), 7);
    let ids = out.column_by_name("source_id").unwrap().as_string::<i32>();
    assert_eq!(
        ids.value(0),
        stable_identifier(&["42", "occ-1", "length", "7.0"], "|")
    );
}

// ============================================================================
// Reports
// ============================================================================

#[test]
fn test_report_accounting() {
    let mut report = LoadReport::new("mof", "obis mof");
    report.rows_expected = 5;
    report.record(BatchOutcome::Committed {
        batch_index: 0,
        rows: 3,
    });
    report.record(BatchOutcome::Failed {
        batch_index: 1,
        rows: 2,
        error: "type mismatch".to_string(),
    });

    assert_eq!(report.rows_loaded, 3);
    assert_eq!(report.rows_failed, 2);
    assert_eq!(report.rows_accounted(), 5);
    assert_eq!(report.failed_batches(), vec![1]);
    assert!(!report.is_complete());
    assert!(report.to_string().contains("3/5 rows loaded into 'mof'"));
}

#[test]
fn test_loader_uses_configured_wire_format() {
    let config = LoaderConfig {
        delimiter: '|',
        null_token: "NULL".to_string(),
        ..LoaderConfig::default()
    };
    let mut store = store_with("CREATE TABLE t (id VARCHAR, name VARCHAR);");
    let report = StreamingLoader::new(config.clone().with_batch_size(7))
        .load(&mut ids_with_malformed_row(), &mut Passthrough, &mut store, "t")
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(count_where(&store, "t", "name IS NULL"), 1);
    assert_eq!(WireFormat::from_config(&config).delimiter(), '|');
}
