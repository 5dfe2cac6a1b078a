//! Similarity matcher
//!
//! Pairs up the columns of a GBIF schema and an OBIS schema for one record
//! type. Every column of either side ends up in exactly one `ColumnMatch`.
//!
//! # Algorithm
//!
//! 1. Names are normalized (lower-cased, spaces and underscores removed).
//! 2. Identical normalized names are paired as `Exact` (similarity 1.0).
//! 3. Remaining GBIF columns, in lexical order, greedily claim the best
//!    remaining OBIS column if its similarity ratio reaches the threshold.
//! 4. Leftovers are emitted as `OnlyInGbif` / `OnlyInObis`.

mod matcher;
mod similarity;
mod types;

pub use matcher::{normalize_column_name, SchemaMatcher};
pub use similarity::similarity_ratio;
pub use types::{ColumnDescriptor, ColumnMatch, MatchCounts};
