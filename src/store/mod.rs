//! Destination store
//!
//! Batches reach the store as delimited text with a reserved null token and
//! are bulk-copied into an existing table inside their own transaction.
//! Tables are created outside the pipeline.

mod engine;
mod types;
mod wire;

pub use engine::{mask_password, resolve_connection_string, DuckDbStore};
pub use types::{quote_ident, quote_literal, DestinationStore};
pub use wire::{WireFormat, TIMESTAMP_FORMAT};
