//! Matcher types

use crate::types::{MatchKind, PhysicalType, Provider};
use serde::{Deserialize, Serialize};

/// A column read from a source file's schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Raw column name as published by the provider
    pub name: String,
    /// Provider the column came from
    pub source: Provider,
    /// Coarse physical type
    pub physical_type: PhysicalType,
}

impl ColumnDescriptor {
    /// Create a descriptor
    pub fn new(name: impl Into<String>, source: Provider, physical_type: PhysicalType) -> Self {
        Self {
            name: name.into(),
            source,
            physical_type,
        }
    }
}

/// One row of the cross-provider column comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMatch {
    /// GBIF raw column name
    pub gbif_column: Option<String>,
    /// OBIS raw column name
    pub obis_column: Option<String>,
    /// Normalized name (from the GBIF side when both exist)
    pub normalized_name: String,
    /// How the row was matched
    pub match_kind: MatchKind,
    /// 1.0 for exact, the ratio for fuzzy, absent otherwise
    pub similarity: Option<f64>,
}

impl ColumnMatch {
    pub fn exact(gbif: &str, obis: &str, normalized: &str) -> Self {
        Self {
            gbif_column: Some(gbif.to_string()),
            obis_column: Some(obis.to_string()),
            normalized_name: normalized.to_string(),
            match_kind: MatchKind::Exact,
            similarity: Some(1.0),
        }
    }

    pub fn fuzzy(gbif: &str, obis: &str, normalized: &str, similarity: f64) -> Self {
        Self {
            gbif_column: Some(gbif.to_string()),
            obis_column: Some(obis.to_string()),
            normalized_name: normalized.to_string(),
            match_kind: MatchKind::Fuzzy,
            similarity: Some(similarity),
        }
    }

    pub fn only_in_gbif(gbif: &str, normalized: &str) -> Self {
        Self {
            gbif_column: Some(gbif.to_string()),
            obis_column: None,
            normalized_name: normalized.to_string(),
            match_kind: MatchKind::OnlyInGbif,
            similarity: None,
        }
    }

    pub fn only_in_obis(obis: &str, normalized: &str) -> Self {
        Self {
            gbif_column: None,
            obis_column: Some(obis.to_string()),
            normalized_name: normalized.to_string(),
            match_kind: MatchKind::OnlyInObis,
            similarity: None,
        }
    }

    /// Raw column name on the given provider's side
    pub fn column_for(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Gbif => self.gbif_column.as_deref(),
            Provider::Obis => self.obis_column.as_deref(),
        }
    }

    /// Free-text note for the audit artifact
    pub fn differences(&self) -> String {
        match self.match_kind {
            MatchKind::Exact => "none".to_string(),
            MatchKind::Fuzzy => format!(
                "GBIF: '{}' vs OBIS: '{}'",
                self.gbif_column.as_deref().unwrap_or_default(),
                self.obis_column.as_deref().unwrap_or_default()
            ),
            MatchKind::OnlyInGbif => "only in GBIF".to_string(),
            MatchKind::OnlyInObis => "only in OBIS".to_string(),
        }
    }
}

/// Row counts per match kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchCounts {
    pub exact: usize,
    pub fuzzy: usize,
    pub only_in_gbif: usize,
    pub only_in_obis: usize,
}

impl MatchCounts {
    /// Count the rows of a comparison
    pub fn from_matches(matches: &[ColumnMatch]) -> Self {
        let mut counts = Self::default();
        for m in matches {
            match m.match_kind {
                MatchKind::Exact => counts.exact += 1,
                MatchKind::Fuzzy => counts.fuzzy += 1,
                MatchKind::OnlyInGbif => counts.only_in_gbif += 1,
                MatchKind::OnlyInObis => counts.only_in_obis += 1,
            }
        }
        counts
    }

    /// Total rows
    pub fn total(&self) -> usize {
        self.exact + self.fuzzy + self.only_in_gbif + self.only_in_obis
    }
}
