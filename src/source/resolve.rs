//! Input resolution: newest dated directory per provider, one file per record type

use super::types::SourceLocation;
use crate::config::InputConfig;
use crate::error::{Error, Result};
use crate::types::{Provider, RecordType};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Parse a dated directory name (`2024-03-01` or `2024_03_01`)
pub fn parse_dated_dir_name(name: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&name.replace('_', "-"), "%Y-%m-%d").ok()
}

/// Finds the newest export of each provider under a base directory
///
/// Expected layout:
///
/// ```text
/// <base>/gbif/2024-03-01/occurrence.parquet
/// <base>/gbif/2024-03-01/dna_derived.parquet
/// <base>/gbif/2024-03-01/mof.parquet
/// <base>/obis/2024_02_15/...
/// ```
#[derive(Debug, Clone)]
pub struct InputResolver {
    base_dir: PathBuf,
}

impl InputResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Newest dated directory per provider
    pub fn latest_directories(&self) -> Result<BTreeMap<Provider, PathBuf>> {
        let mut latest = BTreeMap::new();
        for provider in Provider::ALL {
            latest.insert(provider, self.latest_directory(provider)?);
        }
        Ok(latest)
    }

    fn latest_directory(&self, provider: Provider) -> Result<PathBuf> {
        let provider_dir = self.base_dir.join(provider.as_str());
        if !provider_dir.is_dir() {
            return Err(Error::config(format!(
                "{} does not exist in {}",
                provider,
                self.base_dir.display()
            )));
        }

        let mut newest: Option<(NaiveDate, PathBuf)> = None;
        for entry in fs::read_dir(&provider_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(date) = entry.file_name().to_str().and_then(parse_dated_dir_name) else {
                tracing::debug!("Skipping undated directory {}", entry.path().display());
                continue;
            };
            if newest.as_ref().map_or(true, |(d, _)| date > *d) {
                newest = Some((date, entry.path()));
            }
        }

        let (date, path) = newest.ok_or_else(|| {
            Error::validation(format!(
                "No valid date directories found in {}",
                provider_dir.display()
            ))
        })?;
        tracing::info!("Latest {} export: {} ({})", provider, date, path.display());
        Ok(path)
    }

    /// Resolve the occurrence, DNA-derived and measurement-or-fact files of both providers
    pub fn resolve(&self) -> Result<InputSet> {
        let mut inputs = InputSet::default();
        for (provider, dir) in self.latest_directories()? {
            for record_type in RecordType::ALL {
                let file = find_record_file(&dir, record_type)?;
                inputs.insert(provider, record_type, SourceLocation::Local(file));
            }
        }
        Ok(inputs)
    }
}

/// First (lexically) `*.parquet` file in `dir` whose name contains the record type's marker
fn find_record_file(dir: &Path, record_type: RecordType) -> Result<PathBuf> {
    let marker = record_type.file_marker();
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path.extension().is_some_and(|ext| ext == "parquet")
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.contains(marker))
        })
        .collect();
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| {
        Error::schema_resolution(format!(
            "No *{}*.parquet file in {}",
            marker,
            dir.display()
        ))
    })
}

/// Source location of every (provider, record type) pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSet {
    locations: BTreeMap<(Provider, RecordType), SourceLocation>,
}

impl InputSet {
    /// Build from configuration: explicit files win, the rest comes from `base_dir`
    pub fn from_config(config: &InputConfig) -> Result<Self> {
        let mut inputs = InputSet::default();
        for (provider, files) in &config.files {
            for record_type in RecordType::ALL {
                inputs.insert(
                    *provider,
                    record_type,
                    SourceLocation::parse(files.get(record_type)),
                );
            }
        }

        let unresolved: Vec<Provider> = Provider::ALL
            .into_iter()
            .filter(|p| !config.files.contains_key(p))
            .collect();
        if unresolved.is_empty() {
            return Ok(inputs);
        }

        let base_dir = config
            .base_dir
            .as_ref()
            .ok_or_else(|| Error::missing_field("inputs.base_dir"))?;
        if !base_dir.is_dir() {
            return Err(Error::config(format!(
                "Input directory {} does not exist",
                base_dir.display()
            )));
        }

        let resolved = InputResolver::new(base_dir).resolve()?;
        for provider in unresolved {
            for record_type in RecordType::ALL {
                if let Some(location) = resolved.get(provider, record_type) {
                    inputs.insert(provider, record_type, location.clone());
                }
            }
        }
        Ok(inputs)
    }

    pub fn insert(&mut self, provider: Provider, record_type: RecordType, location: SourceLocation) {
        self.locations.insert((provider, record_type), location);
    }

    pub fn get(&self, provider: Provider, record_type: RecordType) -> Option<&SourceLocation> {
        self.locations.get(&(provider, record_type))
    }

    /// Location of a required input
    pub fn require(&self, provider: Provider, record_type: RecordType) -> Result<&SourceLocation> {
        self.get(provider, record_type).ok_or_else(|| {
            Error::schema_resolution(format!("No {record_type} input configured for {provider}"))
        })
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
