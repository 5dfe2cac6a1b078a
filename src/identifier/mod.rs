//! Identifier derivation
//!
//! Occurrences keep the provider's native id under the canonical id column.
//! Extension rows (DNA-derived, measurement-or-fact) get a content-derived
//! stable id and a pointer back to their occurrence. Occurrences get one
//! 0/1 flag per extension type telling whether any extension row points at
//! them.

mod deriver;
mod existence;

pub use deriver::{resolve_column, stable_identifier, value_strings, IdentifierDeriver};
pub use existence::{DuplicateTracker, ExtensionIndex};

#[cfg(test)]
mod tests;
