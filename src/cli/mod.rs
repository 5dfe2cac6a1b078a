//! CLI module
//!
//! Command-line interface for running the pipeline.
//!
//! # Commands
//!
//! - `compare` - Compare provider schemas, write mapping artifacts
//! - `align` - Print the rename map
//! - `load` - Run the whole pipeline
//! - `verify` - Print the destination table inventory
//! - `validate` - Check the configuration file

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
