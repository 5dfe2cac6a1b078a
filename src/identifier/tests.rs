//! Tests for identifier module

use super::*;
use crate::align::{RenameEntry, RenameMap};
use crate::config::IdentifierConfig;
use crate::error::Error;
use crate::source::MemorySource;
use crate::types::{Provider, RecordType};
use arrow::array::{Array, ArrayRef, AsArray, Int64Array, StringArray};
use arrow::datatypes::{DataType, Int32Type};
use arrow::record_batch::RecordBatch;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
    RecordBatch::try_from_iter(columns).unwrap()
}

fn deriver(provider: Provider, record_type: RecordType) -> IdentifierDeriver {
    IdentifierDeriver::new(
        IdentifierConfig::default(),
        provider,
        record_type,
        Arc::new(RenameMap::default()),
    )
}

fn strings(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    batch
        .column_by_name(name)
        .unwrap()
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(ToString::to_string))
        .collect()
}

fn int32s(batch: &RecordBatch, name: &str) -> Vec<Option<i32>> {
    batch
        .column_by_name(name)
        .unwrap()
        .as_primitive::<Int32Type>()
        .iter()
        .collect()
}

fn gbif_dna_batch() -> RecordBatch {
    batch(vec![
        ("gbifid", Arc::new(Int64Array::from(vec![42, 42, 7])) as ArrayRef),
        (
            "occurrenceid",
            Arc::new(StringArray::from(vec![Some("occ-1"), Some("occ-1"), None])) as ArrayRef,
        ),
        (
            "pcrprimerforward",
            Arc::new(StringArray::from(vec![
                Some("GTCGGTAAAACTCGTGCCAGC"),
                None,
                None,
            ])) as ArrayRef,
        ),
        (
            "pcrprimerreverse",
            Arc::new(StringArray::from(vec![
                Some("CATAGTGGGGTATCTAATCCCAGTTTG"),
                None,
                None,
            ])) as ArrayRef,
        ),
    ])
}

// ============================================================================
// Stable Identifiers
// ============================================================================

#[test]
fn test_stable_identifier_is_md5_of_joined_fields() {
    assert_eq!(stable_identifier(&[], "|"), "d41d8cd98f00b204e9800998ecf8427e");
    assert_eq!(
        stable_identifier(
            &[
                "42",
                "occ-1",
                "GTCGGTAAAACTCGTGCCAGC",
                "CATAGTGGGGTATCTAATCCCAGTTTG"
            ],
            "|"
        ),
        "341e975b0b430d03dcb0746e0c1a6786"
    );
}

#[test]
fn test_stable_identifier_changes_with_any_field() {
    let base = stable_identifier(&["42", "occ-1", "fwd", "rev"], "|");
    assert_eq!(base, stable_identifier(&["42", "occ-1", "fwd", "rev"], "|"));
    assert_ne!(base, stable_identifier(&["43", "occ-1", "fwd", "rev"], "|"));
    assert_ne!(base, stable_identifier(&["42", "occ-1", "fwd", "rev2"], "|"));
    // the separator keeps field boundaries apart
    assert_ne!(
        stable_identifier(&["ab", "c"], "|"),
        stable_identifier(&["a", "bc"], "|")
    );
}

// ============================================================================
// Extension Rows
// ============================================================================

#[test]
fn test_extension_rows_get_hashed_id_and_parent_pointer() {
    let out = deriver(Provider::Gbif, RecordType::DnaDerived)
        .derive(&gbif_dna_batch())
        .unwrap();

    let names: Vec<&str> = out
        .schema_ref()
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .collect();
    assert_eq!(names[0], "source_id");
    assert!(names.contains(&"occurrence_source_id"));
    assert!(!names.contains(&"gbifid"));
    assert_eq!(*names.last().unwrap(), "data_source");

    assert_eq!(
        strings(&out, "source_id"),
        vec![
            Some("341e975b0b430d03dcb0746e0c1a6786".to_string()),
            Some("7c8800a24efa42fa143eaa1c0019b73a".to_string()),
            Some("55c0f24544df5875dad15fbe7c909b53".to_string()),
        ]
    );
    assert_eq!(strings(&out, "data_source"), vec![Some("gbif".to_string()); 3]);
    assert_eq!(out.num_rows(), 3);
}

#[test]
fn test_extension_hash_is_stable_across_batches() {
    let full = gbif_dna_batch();
    let mut d = deriver(Provider::Gbif, RecordType::DnaDerived);

    let whole = strings(&d.derive(&full).unwrap(), "source_id");
    let mut pieces = strings(&d.derive(&full.slice(0, 1)).unwrap(), "source_id");
    pieces.extend(strings(&d.derive(&full.slice(1, 2)).unwrap(), "source_id"));

    assert_eq!(whole, pieces);
}

#[test]
fn test_extension_fields_resolved_through_renames() {
    let renames = RenameMap::from_entries(vec![RenameEntry::new(
        Provider::Obis,
        RecordType::MeasurementOrFact,
        "measurementType",
        "measurement_type",
    )]);
    let mut d = IdentifierDeriver::new(
        IdentifierConfig::default(),
        Provider::Obis,
        RecordType::MeasurementOrFact,
        Arc::new(renames),
    );

    let renamed = batch(vec![
        ("_occurrence_id", Arc::new(StringArray::from(vec!["o1"])) as ArrayRef),
        ("occurrenceID", Arc::new(StringArray::from(vec!["urn:1"])) as ArrayRef),
        ("measurement_type", Arc::new(StringArray::from(vec!["depth"])) as ArrayRef),
        ("measurementValue", Arc::new(StringArray::from(vec!["12"])) as ArrayRef),
    ]);
    let out = d.derive(&renamed).unwrap();

    assert_eq!(
        strings(&out, "source_id")[0].as_deref(),
        Some(stable_identifier(&["o1", "urn:1", "depth", "12"], "|").as_str())
    );
    assert_eq!(strings(&out, "occurrence_source_id"), vec![Some("o1".to_string())]);
    assert_eq!(strings(&out, "data_source"), vec![Some("obis".to_string())]);
}

#[test]
fn test_derive_from_rejects_row_count_mismatch() {
    let raw = gbif_dna_batch();
    let err = deriver(Provider::Gbif, RecordType::DnaDerived)
        .derive_from(&raw, &raw.slice(0, 2))
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn test_extension_missing_parent_is_fatal() {
    let input = batch(vec![(
        "measurementType",
        Arc::new(StringArray::from(vec!["depth"])) as ArrayRef,
    )]);
    let err = deriver(Provider::Obis, RecordType::MeasurementOrFact)
        .derive(&input)
        .unwrap_err();
    assert!(matches!(err, Error::MissingColumn { .. }));
}

// ============================================================================
// Occurrence Rows
// ============================================================================

#[test]
fn test_occurrence_native_id_renamed() {
    let input = batch(vec![
        ("gbifID", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
        ("scientificName", Arc::new(StringArray::from(vec!["a", "b"])) as ArrayRef),
    ]);
    let out = deriver(Provider::Gbif, RecordType::Occurrence)
        .derive(&input)
        .unwrap();

    let schema = out.schema();
    assert_eq!(schema.field(0).name(), "source_id");
    assert_eq!(schema.field(0).data_type(), &DataType::Int64);
    assert_eq!(schema.field(2).name(), "data_source");
    assert!(out.column_by_name("dna_derived").is_none());
}

#[test]
fn test_occurrence_native_id_matched_case_insensitively() {
    let input = batch(vec![("GBIFID", Arc::new(Int64Array::from(vec![1])) as ArrayRef)]);
    let out = deriver(Provider::Gbif, RecordType::Occurrence)
        .derive(&input)
        .unwrap();
    assert_eq!(out.schema().field(0).name(), "source_id");
}

#[test]
fn test_occurrence_missing_native_id_is_fatal() {
    let input = batch(vec![("id", Arc::new(Int64Array::from(vec![1])) as ArrayRef)]);
    let err = deriver(Provider::Obis, RecordType::Occurrence)
        .derive(&input)
        .unwrap_err();
    assert!(matches!(err, Error::MissingColumn { .. }));
}

#[test]
fn test_existence_flags_default_false() {
    let mut dna = ExtensionIndex::new(RecordType::DnaDerived);
    dna.insert("1");
    dna.insert("3");
    let mof = ExtensionIndex::new(RecordType::MeasurementOrFact);

    let mut d = deriver(Provider::Gbif, RecordType::Occurrence)
        .with_extension_index(Arc::new(dna))
        .with_extension_index(Arc::new(mof));

    let input = batch(vec![(
        "gbifID",
        Arc::new(Int64Array::from(vec![Some(1), Some(2), Some(3), None])) as ArrayRef,
    )]);
    let out = d.derive(&input).unwrap();

    assert_eq!(out.num_rows(), 4);
    assert_eq!(int32s(&out, "dna_derived"), vec![Some(1), Some(0), Some(1), Some(0)]);
    assert_eq!(int32s(&out, "has_mof"), vec![Some(0); 4]);
    assert_eq!(out.column_by_name("has_mof").unwrap().null_count(), 0);
}

#[test]
fn test_repeated_ids_keep_their_rows_and_flags() {
    let mut dna = ExtensionIndex::new(RecordType::DnaDerived);
    dna.insert("a");
    let mut d = deriver(Provider::Obis, RecordType::Occurrence).with_extension_index(Arc::new(dna));

    let input = batch(vec![(
        "_id",
        Arc::new(StringArray::from(vec![Some("a"), Some("b"), Some("a"), None, Some("a")])) as ArrayRef,
    )]);
    let out = d.derive(&input).unwrap();

    assert_eq!(out.num_rows(), 5);
    assert_eq!(
        int32s(&out, "dna_derived"),
        vec![Some(1), Some(0), Some(1), Some(0), Some(1)]
    );
    assert_eq!(d.duplicate_ids(), 2);
}

#[test]
fn test_duplicate_ids_counted_across_batches() {
    let mut d = deriver(Provider::Obis, RecordType::Occurrence);
    let first = batch(vec![(
        "_id",
        Arc::new(StringArray::from(vec!["a", "b", "a"])) as ArrayRef,
    )]);
    let second = batch(vec![(
        "_id",
        Arc::new(StringArray::from(vec!["b", "c"])) as ArrayRef,
    )]);

    d.derive(&first).unwrap();
    d.derive(&second).unwrap();
    assert_eq!(d.duplicate_ids(), 2);
}

// ============================================================================
// Extension Index
// ============================================================================

#[test]
fn test_extension_index_build_from_source() {
    let ext = batch(vec![(
        "gbifid",
        Arc::new(Int64Array::from(vec![Some(10), Some(10), None, Some(11)])) as ArrayRef,
    )]);
    let mut source = MemorySource::from_batch("dna", ext, 2).unwrap();

    let index = ExtensionIndex::build(&mut source, RecordType::DnaDerived, "gbifid").unwrap();
    assert_eq!(index.len(), 2);
    assert!(index.contains("10"));
    assert!(index.contains("11"));
    assert_eq!(index.record_type(), RecordType::DnaDerived);
}

#[test]
fn test_extension_index_build_missing_column() {
    let ext = batch(vec![("other", Arc::new(Int64Array::from(vec![1])) as ArrayRef)]);
    let mut source = MemorySource::from_batch("dna", ext, 10).unwrap();
    let err = ExtensionIndex::build(&mut source, RecordType::DnaDerived, "gbifid").unwrap_err();
    assert!(matches!(err, Error::MissingColumn { .. }));
}

#[test]
fn test_value_strings_render_numbers_and_nulls() {
    let ints: ArrayRef = Arc::new(Int64Array::from(vec![Some(5), None]));
    assert_eq!(value_strings(&ints).unwrap(), vec![Some("5".to_string()), None]);
}
