//! Pipeline orchestration

use super::types::{Comparisons, PipelineReport, TableInventory};
use super::verify::Verifier;
use crate::align::{
    write_comparison_csv, write_rename_map, ReferenceVocabulary, RenameMap, SchemaAligner,
};
use crate::config::PipelineConfig;
use crate::error::{Error, Result, ResultExt};
use crate::identifier::{resolve_column, ExtensionIndex, IdentifierDeriver};
use crate::loader::{LoadReport, RecordPipeline, StreamingLoader};
use crate::matcher::SchemaMatcher;
use crate::source::{InputSet, SourceLocation};
use crate::store::DestinationStore;
use crate::transform::RecordTransformer;
use crate::types::{Provider, RecordType};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// The whole reconciliation and load pipeline
///
/// Construction only validates configuration; every step that touches
/// files or the store is an explicit call.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Locate every (provider, record type) input
    pub fn resolve_inputs(&self) -> Result<InputSet> {
        let inputs = InputSet::from_config(&self.config.inputs)?;
        for provider in Provider::ALL {
            for record_type in RecordType::ALL {
                inputs.require(provider, record_type)?;
            }
        }
        Ok(inputs)
    }

    /// Compare both providers' schemas per record type
    pub fn compare(&self, inputs: &InputSet) -> Result<Comparisons> {
        let matcher = SchemaMatcher::new(self.config.matcher.clone());
        let mut comparisons = Comparisons::new();

        for record_type in RecordType::ALL {
            let gbif = inputs
                .require(Provider::Gbif, record_type)?
                .column_descriptors(Provider::Gbif)?;
            let obis = inputs
                .require(Provider::Obis, record_type)?
                .column_descriptors(Provider::Obis)?;
            if gbif.is_empty() && obis.is_empty() {
                return Err(Error::config(format!(
                    "No schema could be read for {record_type}"
                )));
            }

            let matches = matcher.match_descriptors(&gbif, &obis);
            tracing::info!(
                "Compared {} schemas: {} gbif columns, {} obis columns, {} rows",
                record_type,
                gbif.len(),
                obis.len(),
                matches.len()
            );
            comparisons.insert(record_type, matches);
        }
        Ok(comparisons)
    }

    /// Load the configured reference vocabulary
    pub fn vocabulary(&self) -> Result<ReferenceVocabulary> {
        let path = self
            .config
            .vocabulary
            .as_ref()
            .ok_or_else(|| Error::missing_field("vocabulary"))?;
        ReferenceVocabulary::load(path)
    }

    /// Build the rename map from comparisons and the vocabulary
    pub fn align(&self, comparisons: &Comparisons) -> Result<RenameMap> {
        let aligner = SchemaAligner::new(self.vocabulary()?);
        Ok(aligner.align(comparisons))
    }

    /// Write comparison CSVs and, when given, the rename map into the
    /// mapping directory; nothing is written when none is configured
    pub fn write_artifacts(
        &self,
        comparisons: &Comparisons,
        renames: Option<&RenameMap>,
    ) -> Result<Vec<PathBuf>> {
        let Some(dir) = &self.config.mapping_dir else {
            tracing::debug!("No mapping_dir configured; skipping artifacts");
            return Ok(Vec::new());
        };

        let mut written = Vec::new();
        for (record_type, matches) in comparisons {
            written.push(write_comparison_csv(dir, *record_type, matches)?);
        }
        if let Some(renames) = renames {
            written.push(write_rename_map(dir, renames)?);
        }
        Ok(written)
    }

    /// Resolve, compare, align, load every file, then verify
    pub fn run(&self, store: &mut dyn DestinationStore) -> Result<PipelineReport> {
        let start = Instant::now();
        tracing::info!("Starting pipeline into {}", store.describe());

        let inputs = self.resolve_inputs()?;
        let comparisons = self.compare(&inputs)?;
        let renames = self.align(&comparisons)?;
        self.write_artifacts(&comparisons, Some(&renames))?;
        let renames = Arc::new(renames);

        let verifier = Verifier::new(&self.config.verification);
        let tables: Vec<&str> = RecordType::ALL
            .iter()
            .map(|rt| self.config.tables.for_record_type(*rt))
            .collect();
        let mut expected = verifier.row_counts(store, tables.iter().copied())?;

        let mut report = PipelineReport {
            renames: renames.len(),
            ..PipelineReport::default()
        };

        for provider in Provider::ALL {
            let loads = self.load_provider(provider, &inputs, &renames, store)?;
            for load in &loads {
                *expected.entry(load.table.clone()).or_insert(0) += load.rows_loaded;
            }
            report.loads.extend(loads);
        }

        report.inventory = verifier.inventory(store, &expected)?;
        report.elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Pipeline finished: {}/{} rows in {}ms",
            report.rows_loaded(),
            report.rows_expected(),
            report.elapsed_ms
        );
        Ok(report)
    }

    /// Load one provider's files: occurrences first, then extensions
    pub fn load_provider(
        &self,
        provider: Provider,
        inputs: &InputSet,
        renames: &Arc<RenameMap>,
        store: &mut dyn DestinationStore,
    ) -> Result<Vec<LoadReport>> {
        let mut reports = Vec::with_capacity(RecordType::ALL.len());

        let mut indexes = Vec::new();
        for record_type in RecordType::ALL.into_iter().filter(|rt| rt.is_extension()) {
            let location = inputs.require(provider, record_type)?;
            indexes.push(Arc::new(self.extension_index(provider, record_type, location)?));
        }

        for record_type in RecordType::ALL {
            let mut deriver = self.deriver(provider, record_type, renames);
            if record_type == RecordType::Occurrence {
                for index in &indexes {
                    deriver = deriver.with_extension_index(index.clone());
                }
            }
            let mut pipeline = RecordPipeline::new(
                RecordTransformer::new(self.config.transform.clone(), provider, renames.clone()),
                deriver,
            );

            let location = inputs.require(provider, record_type)?;
            let mut source = location.open(self.config.loader.batch_size)?;
            let table = self.config.tables.for_record_type(record_type);

            tracing::info!("Loading {} {} from {}", provider, record_type, location);
            let mut loader = StreamingLoader::new(self.config.loader.clone());
            reports.push(loader.load(source.as_mut(), &mut pipeline, store, table)?);
        }
        Ok(reports)
    }

    /// Snapshot the destination; `expected` row counts are checked where given
    pub fn verify(
        &self,
        store: &dyn DestinationStore,
        expected: &BTreeMap<String, u64>,
    ) -> Result<TableInventory> {
        Verifier::new(&self.config.verification).inventory(store, expected)
    }

    fn deriver(
        &self,
        provider: Provider,
        record_type: RecordType,
        renames: &Arc<RenameMap>,
    ) -> IdentifierDeriver {
        IdentifierDeriver::new(
            self.config.identifiers.clone(),
            provider,
            record_type,
            renames.clone(),
        )
    }

    /// Parent ids of an extension file, reading only the parent column
    fn extension_index(
        &self,
        provider: Provider,
        record_type: RecordType,
        location: &SourceLocation,
    ) -> Result<ExtensionIndex> {
        let ext = self
            .config
            .identifiers
            .for_provider(provider)
            .extension(record_type)
            .ok_or_else(|| Error::config(format!("No identifier fields for {record_type}")))?;

        let schema = location.schema()?;
        let idx = resolve_column(&schema, &RenameMap::default(), provider, &ext.parent_id)
            .ok_or_else(|| Error::missing_column(&ext.parent_id, location.to_string()))?;
        let column = schema.field(idx).name().as_str();

        let projection = [column];
        let mut source =
            location.open_projected(Some(&projection[..]), self.config.loader.batch_size)?;
        ExtensionIndex::build(source.as_mut(), record_type, column)
            .with_context(|| format!("Failed to index {record_type} parent ids in {location}"))
    }
}
