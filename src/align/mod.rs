//! Schema alignment
//!
//! Turns the per-record-type column comparisons into one `RenameMap` keyed
//! by provider and raw column name, using a reference vocabulary of
//! canonical Darwin Core terms.
//!
//! # Overview
//!
//! - `ReferenceVocabulary` - canonical terms (plus optional aliases)
//! - `SchemaAligner` - per-row target resolution and the merged map
//! - `RenameMap` - immutable, chain-free rename table
//! - artifacts - comparison CSVs and `rename_map.json` for auditing

mod aligner;
mod artifact;
mod types;
mod vocabulary;

pub use aligner::{sanitize_column_name, SchemaAligner};
pub use artifact::{
    comparison_batch, comparison_file_name, sorted_for_artifact, write_comparison_csv,
    write_rename_map, RENAME_MAP_FILE,
};
pub use types::{DroppedRename, RenameEntry, RenameMap};
pub use vocabulary::ReferenceVocabulary;
