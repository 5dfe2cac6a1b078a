// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # dwc-unify
//!
//! Reconciles GBIF and OBIS Darwin Core exports (occurrences, DNA-derived
//! data, measurements-or-facts) into one relational schema and streams the
//! unified records into a SQL store.
//!
//! ## Features
//!
//! - **Schema Matching**: greedy exact-then-fuzzy column matching between providers
//! - **Alignment**: one rename map per run, anchored on a reference vocabulary
//! - **Transformation**: booleans, lists, binaries and date intervals made loadable
//! - **Stable Identifiers**: content-derived ids linking extensions to occurrences
//! - **Streaming Load**: bounded batches, one transaction each, failures isolated
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dwc_unify::{load_config, DuckDbStore, Pipeline, Result};
//!
//! fn main() -> Result<()> {
//!     let pipeline = Pipeline::new(load_config("pipeline.yaml")?)?;
//!     let mut store = DuckDbStore::open(&pipeline.config().destination)?;
//!
//!     let report = pipeline.run(&mut store)?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────┐   ┌─────────┐   ┌────────────┐
//! │  source    │──▶│ matcher │──▶│  align  │──▶│ RenameMap  │
//! │ (Parquet)  │   └─────────┘   └─────────┘   └─────┬──────┘
//! └─────┬──────┘                                     │
//!       │ batches                                    ▼
//!       │         ┌───────────┐   ┌────────────┐   ┌───────┐
//!       └────────▶│ transform │──▶│ identifier │──▶│ store │
//!                 └───────────┘   └────────────┘   └───────┘
//!                         driven by loader, orchestrated by engine
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the pipeline
pub mod error;

/// Providers, record types and match kinds
pub mod types;

/// YAML pipeline configuration
pub mod config;

/// Columnar inputs: resolution, schemas, batch sources
pub mod source;

/// Column matching between provider schemas
pub mod matcher;

/// Reference vocabulary, rename map and mapping artifacts
pub mod align;

/// Per-batch record transformation
pub mod transform;

/// Canonical and stable identifiers
pub mod identifier;

/// Destination store and wire format
pub mod store;

/// Streaming loader
pub mod loader;

/// Pipeline orchestration and verification
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use align::{ReferenceVocabulary, RenameMap, SchemaAligner};
pub use config::{load_config, load_config_from_str, PipelineConfig};
pub use engine::{Pipeline, PipelineReport, TableInventory, VerificationWarning};
pub use loader::{LoadReport, StreamingLoader};
pub use matcher::{ColumnMatch, SchemaMatcher};
pub use store::{DestinationStore, DuckDbStore};
pub use transform::RecordTransformer;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
