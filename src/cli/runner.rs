//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{load_config, PipelineConfig};
use crate::engine::{Comparisons, Pipeline};
use crate::error::Result;
use crate::matcher::MatchCounts;
use crate::store::DuckDbStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::PathBuf;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Compare { output } => self.compare(output.clone()),
            Commands::Align => self.align(),
            Commands::Load => self.load(),
            Commands::Verify => self.verify(),
            Commands::Validate => self.validate(),
        }
    }

    fn pipeline(&self) -> Result<Pipeline> {
        Pipeline::new(self.config()?)
    }

    fn config(&self) -> Result<PipelineConfig> {
        tracing::debug!("Loading configuration from {}", self.cli.config.display());
        load_config(&self.cli.config)
    }

    fn emit<T: Serialize + Display>(&self, value: &T) -> Result<()> {
        match self.cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Pretty => println!("{value}"),
        }
        Ok(())
    }

    fn compare(&self, output: Option<PathBuf>) -> Result<()> {
        let mut config = self.config()?;
        if output.is_some() {
            config.mapping_dir = output;
        }
        let pipeline = Pipeline::new(config)?;

        let inputs = pipeline.resolve_inputs()?;
        let comparisons = pipeline.compare(&inputs)?;
        let written = pipeline.write_artifacts(&comparisons, None)?;

        let summary = CompareSummary::new(&comparisons, written);
        self.emit(&summary)
    }

    fn align(&self) -> Result<()> {
        let pipeline = self.pipeline()?;
        let inputs = pipeline.resolve_inputs()?;
        let comparisons = pipeline.compare(&inputs)?;
        let renames = pipeline.align(&comparisons)?;
        pipeline.write_artifacts(&comparisons, Some(&renames))?;

        println!("{}", serde_json::to_string_pretty(&renames)?);
        Ok(())
    }

    fn load(&self) -> Result<()> {
        let pipeline = self.pipeline()?;
        let mut store = DuckDbStore::open(&pipeline.config().destination)?;
        tracing::info!("Destination: {}", store.connection_info());

        let report = pipeline.run(&mut store)?;
        self.emit(&report)?;
        if !report.is_complete() {
            tracing::warn!(
                "Partial load: {} of {} rows committed",
                report.rows_loaded(),
                report.rows_expected()
            );
        }
        Ok(())
    }

    fn verify(&self) -> Result<()> {
        let pipeline = self.pipeline()?;
        let store = DuckDbStore::open(&pipeline.config().destination)?;
        let inventory = pipeline.verify(&store, &BTreeMap::new())?;
        self.emit(&inventory)
    }

    fn validate(&self) -> Result<()> {
        let pipeline = self.pipeline()?;
        let config = pipeline.config();
        println!("Configuration is valid: {}", self.cli.config.display());
        println!("  Matcher threshold: {}", config.matcher.threshold);
        println!("  Batch size: {}", config.loader.batch_size);
        println!(
            "  Tables: {}, {}, {}",
            config.tables.occurrence, config.tables.dna_derived, config.tables.mof
        );
        Ok(())
    }
}

/// Match counts per record type plus the artifacts written
#[derive(Debug, Serialize)]
struct CompareSummary {
    record_types: BTreeMap<String, CountsRow>,
    artifacts: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CountsRow {
    exact: usize,
    fuzzy: usize,
    gbif_only: usize,
    obis_only: usize,
}

impl CompareSummary {
    fn new(comparisons: &Comparisons, artifacts: Vec<PathBuf>) -> Self {
        let record_types = comparisons
            .iter()
            .map(|(record_type, matches)| {
                let counts = MatchCounts::from_matches(matches);
                (
                    record_type.to_string(),
                    CountsRow {
                        exact: counts.exact,
                        fuzzy: counts.fuzzy,
                        gbif_only: counts.only_in_gbif,
                        obis_only: counts.only_in_obis,
                    },
                )
            })
            .collect();
        Self {
            record_types,
            artifacts,
        }
    }
}

impl Display for CompareSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (record_type, c) in &self.record_types {
            writeln!(
                f,
                "{record_type}: {} exact, {} fuzzy, {} gbif-only, {} obis-only",
                c.exact, c.fuzzy, c.gbif_only, c.obis_only
            )?;
        }
        for path in &self.artifacts {
            writeln!(f, "wrote {}", path.display())?;
        }
        Ok(())
    }
}
