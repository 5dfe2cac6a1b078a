//! Execution engine module
//!
//! Two-phase pipeline orchestration and post-load verification.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Pipeline` - resolve inputs, compare schemas, align, load, verify
//! - `Verifier` - destination catalog inventory and row-count checks
//! - Report types for runs and inventories

mod pipeline;
mod types;
mod verify;

pub use pipeline::Pipeline;
pub use types::{
    Comparisons, PipelineReport, TableInventory, TableSummary, VerificationWarning,
};
pub use verify::Verifier;
