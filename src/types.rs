//! Common types used throughout dwc-unify
//!
//! Shared enums describing where a record came from and what kind of
//! record it is.

use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Provider
// ============================================================================

/// Upstream biodiversity data provider
///
/// GBIF is treated as the primary provider ("provider A"): when no vocabulary
/// term decides a canonical name, the GBIF spelling wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Global Biodiversity Information Facility
    Gbif,
    /// Ocean Biodiversity Information System
    Obis,
}

impl Provider {
    /// All providers, primary first
    pub const ALL: [Provider; 2] = [Provider::Gbif, Provider::Obis];

    /// Lower-case name, used for directory names and the `data_source` column
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Gbif => "gbif",
            Provider::Obis => "obis",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Record Type
// ============================================================================

/// Kind of record held by a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// Core occurrence records
    Occurrence,
    /// DNA-derived data extension (child of an occurrence)
    DnaDerived,
    /// Extended measurement-or-fact extension (child of an occurrence)
    MeasurementOrFact,
}

impl RecordType {
    /// All record types, core first
    pub const ALL: [RecordType; 3] = [
        RecordType::Occurrence,
        RecordType::DnaDerived,
        RecordType::MeasurementOrFact,
    ];

    /// Extension record types only
    pub const EXTENSIONS: [RecordType; 2] = [RecordType::DnaDerived, RecordType::MeasurementOrFact];

    /// Short name used in artifact file names
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::Occurrence => "occ",
            RecordType::DnaDerived => "dna_derived",
            RecordType::MeasurementOrFact => "mof",
        }
    }

    /// Substring identifying this record type's file inside a dated directory
    pub fn file_marker(self) -> &'static str {
        match self {
            RecordType::Occurrence => "occur",
            RecordType::DnaDerived => "dna_derived",
            RecordType::MeasurementOrFact => "mof",
        }
    }

    /// Whether this is an extension (child) record type
    pub fn is_extension(self) -> bool {
        !matches!(self, RecordType::Occurrence)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Physical Type
// ============================================================================

/// Coarse physical type of a source column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalType {
    String,
    Int,
    Float,
    Bool,
    Datetime,
    List,
    Binary,
}

impl From<&DataType> for PhysicalType {
    fn from(data_type: &DataType) -> Self {
        match data_type {
            DataType::Boolean => PhysicalType::Bool,
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => PhysicalType::Int,
            DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => PhysicalType::Float,
            DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
                PhysicalType::Datetime
            }
            DataType::List(_)
            | DataType::LargeList(_)
            | DataType::FixedSizeList(_, _)
            | DataType::Struct(_)
            | DataType::Map(_, _) => PhysicalType::List,
            DataType::Binary
            | DataType::LargeBinary
            | DataType::FixedSizeBinary(_)
            | DataType::BinaryView => PhysicalType::Binary,
            _ => PhysicalType::String,
        }
    }
}

// ============================================================================
// Match Kind
// ============================================================================

/// How a column was matched across the two providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchKind {
    /// Identical normalized names
    #[serde(rename = "exact")]
    Exact,
    /// Similarity at or above the acceptance threshold
    #[serde(rename = "fuzzy")]
    Fuzzy,
    /// Present only in the GBIF schema
    #[serde(rename = "gbif_only")]
    OnlyInGbif,
    /// Present only in the OBIS schema
    #[serde(rename = "obis_only")]
    OnlyInObis,
}

impl MatchKind {
    /// Label written to mapping artifacts
    pub fn as_str(self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Fuzzy => "fuzzy",
            MatchKind::OnlyInGbif => "gbif_only",
            MatchKind::OnlyInObis => "obis_only",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, TimeUnit};
    use std::sync::Arc;

    #[test]
    fn test_physical_type_from_arrow() {
        assert_eq!(PhysicalType::from(&DataType::Utf8), PhysicalType::String);
        assert_eq!(PhysicalType::from(&DataType::Int64), PhysicalType::Int);
        assert_eq!(PhysicalType::from(&DataType::Float32), PhysicalType::Float);
        assert_eq!(PhysicalType::from(&DataType::Boolean), PhysicalType::Bool);
        assert_eq!(
            PhysicalType::from(&DataType::Timestamp(TimeUnit::Microsecond, None)),
            PhysicalType::Datetime
        );
        assert_eq!(
            PhysicalType::from(&DataType::List(Arc::new(Field::new(
                "item",
                DataType::Utf8,
                true
            )))),
            PhysicalType::List
        );
        assert_eq!(PhysicalType::from(&DataType::Binary), PhysicalType::Binary);
    }

    #[test]
    fn test_match_kind_serde_labels() {
        let json = serde_json::to_string(&MatchKind::OnlyInObis).unwrap();
        assert_eq!(json, "\"obis_only\"");
        let kind: MatchKind = serde_json::from_str("\"gbif_only\"").unwrap();
        assert_eq!(kind, MatchKind::OnlyInGbif);
    }

    #[test]
    fn test_record_type_markers() {
        assert_eq!(RecordType::Occurrence.file_marker(), "occur");
        assert!(RecordType::DnaDerived.is_extension());
        assert!(!RecordType::Occurrence.is_extension());
        assert_eq!(Provider::Obis.to_string(), "obis");
    }
}
