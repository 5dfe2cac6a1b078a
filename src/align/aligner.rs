//! Schema aligner: column matches + vocabulary → rename map

use super::types::{RenameEntry, RenameMap};
use super::vocabulary::ReferenceVocabulary;
use crate::matcher::ColumnMatch;
use crate::types::{MatchKind, Provider, RecordType};
use std::collections::BTreeMap;

/// Replace spaces with underscores and drop parentheses
pub fn sanitize_column_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '(' && *c != ')')
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

/// Resolves canonical names for matched columns
#[derive(Debug, Clone, Default)]
pub struct SchemaAligner {
    vocabulary: ReferenceVocabulary,
}

impl SchemaAligner {
    pub fn new(vocabulary: ReferenceVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &ReferenceVocabulary {
        &self.vocabulary
    }

    /// Canonical target for one comparison row.
    ///
    /// Exact rows use the vocabulary term for the normalized name, else the
    /// GBIF name. Fuzzy rows try the normalized, GBIF and OBIS names against
    /// the vocabulary, else the sanitized GBIF name. One-sided rows keep their
    /// sanitized raw name. Aliases are consulted only after the terms miss.
    pub fn resolve_target(&self, m: &ColumnMatch) -> Option<String> {
        let gbif = m.gbif_column.as_deref();
        let obis = m.obis_column.as_deref();

        let target = match m.match_kind {
            MatchKind::Exact => {
                let candidates = [Some(m.normalized_name.as_str()), gbif, obis];
                self.lookup(&candidates[..1])
                    .or_else(|| self.lookup_alias(&candidates))
                    .or_else(|| gbif.map(str::to_string))?
            }
            MatchKind::Fuzzy => {
                let candidates = [Some(m.normalized_name.as_str()), gbif, obis];
                self.lookup(&candidates)
                    .or_else(|| self.lookup_alias(&candidates))
                    .or_else(|| gbif.map(sanitize_column_name))?
            }
            MatchKind::OnlyInGbif => self
                .lookup_alias(&[gbif])
                .or_else(|| gbif.map(sanitize_column_name))?,
            MatchKind::OnlyInObis => self
                .lookup_alias(&[obis])
                .or_else(|| obis.map(sanitize_column_name))?,
        };
        Some(target)
    }

    fn lookup(&self, candidates: &[Option<&str>]) -> Option<String> {
        candidates
            .iter()
            .flatten()
            .find_map(|name| self.vocabulary.term(name))
            .map(str::to_string)
    }

    fn lookup_alias(&self, candidates: &[Option<&str>]) -> Option<String> {
        candidates
            .iter()
            .flatten()
            .find_map(|name| self.vocabulary.alias(name))
            .map(str::to_string)
    }

    /// Renames one provider needs for one record type's comparison
    pub fn renames_for(
        &self,
        provider: Provider,
        record_type: RecordType,
        matches: &[ColumnMatch],
    ) -> Vec<RenameEntry> {
        let renames: Vec<RenameEntry> = matches
            .iter()
            .filter_map(|m| {
                let source = m.column_for(provider)?;
                let target = self.resolve_target(m)?;
                (target != source).then(|| RenameEntry::new(provider, record_type, source, target))
            })
            .collect();

        if renames.is_empty() {
            tracing::debug!("No {} {} column renames needed", provider, record_type);
        }
        renames
    }

    /// Merge the renames of every (record type, provider) pair into one map
    ///
    /// Record types are visited occurrence first, GBIF before OBIS within each.
    pub fn align(&self, comparisons: &BTreeMap<RecordType, Vec<ColumnMatch>>) -> RenameMap {
        let mut entries = Vec::new();
        for record_type in RecordType::ALL {
            let Some(matches) = comparisons.get(&record_type) else {
                tracing::warn!("No {} comparison to align", record_type);
                continue;
            };
            for provider in Provider::ALL {
                entries.extend(self.renames_for(provider, record_type, matches));
            }
        }

        let map = RenameMap::from_entries(entries);
        tracing::info!(
            "Total unique column renames identified: {} (gbif {}, obis {})",
            map.len(),
            map.for_provider(Provider::Gbif).len(),
            map.for_provider(Provider::Obis).len()
        );
        map
    }
}
