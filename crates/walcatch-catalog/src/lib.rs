//! Backup catalog access for walcatch.
//!
//! Splits catalog handling into pure listing parsers ([`listing`]), the
//! child-process runner ([`tool`]), and the [`Catalog`] seam the estimator
//! consumes ([`provider`]).

pub mod listing;
pub mod provider;
pub mod tool;

pub use provider::{Catalog, ProcessCatalog};
pub use tool::{run_tool, run_tool_bounded};
