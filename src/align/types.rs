//! Rename map types

use crate::types::{Provider, RecordType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One proposed rename, before merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEntry {
    pub provider: Provider,
    pub record_type: RecordType,
    /// Raw column name in the provider's file
    pub source: String,
    /// Canonical column name
    pub target: String,
}

impl RenameEntry {
    pub fn new(
        provider: Provider,
        record_type: RecordType,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            record_type,
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Why a proposed rename was left out of the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroppedRename {
    /// Target equals the source name
    NoOp,
    /// Source already renamed (by an earlier record type) to another target
    ConflictingSource,
    /// Another source of the same provider already renames to this target
    TargetCollision,
    /// Target is itself a source name of the same provider
    Chain,
}

/// Raw column name → canonical column name, partitioned by provider
///
/// Built once per run and never mutated afterwards. No entry maps a name to
/// itself and no target is also a source of the same provider, so applying
/// the map a second time changes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameMap {
    #[serde(default)]
    gbif: BTreeMap<String, String>,
    #[serde(default)]
    obis: BTreeMap<String, String>,
}

impl RenameMap {
    /// Merge proposed renames in order; the first entry for a source wins
    pub fn from_entries(entries: impl IntoIterator<Item = RenameEntry>) -> Self {
        let mut map = Self::default();
        let mut claimed: BTreeMap<Provider, BTreeMap<String, String>> = BTreeMap::new();

        for entry in entries {
            let reason = if entry.source == entry.target {
                Some(DroppedRename::NoOp)
            } else if let Some(existing) = map.get(entry.provider, &entry.source) {
                (existing != entry.target).then_some(DroppedRename::ConflictingSource)
            } else if let Some(owner) = claimed
                .get(&entry.provider)
                .and_then(|targets| targets.get(&entry.target))
            {
                (owner != &entry.source).then_some(DroppedRename::TargetCollision)
            } else {
                claimed
                    .entry(entry.provider)
                    .or_default()
                    .insert(entry.target.clone(), entry.source.clone());
                map.side_mut(entry.provider)
                    .insert(entry.source.clone(), entry.target.clone());
                None
            };

            match reason {
                None | Some(DroppedRename::NoOp) => {}
                Some(reason) => tracing::warn!(
                    "Dropping {} {} rename '{}' -> '{}': {:?}",
                    entry.provider,
                    entry.record_type,
                    entry.source,
                    entry.target,
                    reason
                ),
            }
        }

        map.drop_chains();
        map
    }

    fn drop_chains(&mut self) {
        for provider in Provider::ALL {
            let side = self.side_mut(provider);
            let sources: BTreeSet<String> = side.keys().cloned().collect();
            side.retain(|source, target| {
                let chained = sources.contains(target.as_str());
                if chained {
                    tracing::warn!(
                        "Dropping {} rename '{}' -> '{}': {:?}",
                        provider,
                        source,
                        target,
                        DroppedRename::Chain
                    );
                }
                !chained
            });
        }
    }

    fn side_mut(&mut self, provider: Provider) -> &mut BTreeMap<String, String> {
        match provider {
            Provider::Gbif => &mut self.gbif,
            Provider::Obis => &mut self.obis,
        }
    }

    /// Renames of one provider
    pub fn for_provider(&self, provider: Provider) -> &BTreeMap<String, String> {
        match provider {
            Provider::Gbif => &self.gbif,
            Provider::Obis => &self.obis,
        }
    }

    /// Canonical name for a raw column, if it is renamed
    pub fn get(&self, provider: Provider, source: &str) -> Option<&str> {
        self.for_provider(provider).get(source).map(String::as_str)
    }

    /// Name a column has after renaming
    pub fn apply<'a>(&'a self, provider: Provider, name: &'a str) -> &'a str {
        self.get(provider, name).unwrap_or(name)
    }

    /// No self-renames and no chains (applying twice equals applying once)
    pub fn is_idempotent(&self) -> bool {
        Provider::ALL.iter().all(|provider| {
            let side = self.for_provider(*provider);
            side.iter()
                .all(|(source, target)| source != target && !side.contains_key(target))
        })
    }

    /// Total entries across providers
    pub fn len(&self) -> usize {
        self.gbif.len() + self.obis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gbif.is_empty() && self.obis.is_empty()
    }
}
