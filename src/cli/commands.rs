//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reconcile GBIF and OBIS exports into one relational schema
#[derive(Parser, Debug)]
#[command(name = "dwc-unify")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true, default_value = "pipeline.yaml")]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare provider schemas and write the mapping artifacts
    Compare {
        /// Artifact directory (overrides `mapping_dir`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the rename map and print it as JSON
    Align,

    /// Run the whole pipeline into the destination store
    Load,

    /// Print the destination table inventory
    Verify,

    /// Validate the configuration file
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Pretty,
}
