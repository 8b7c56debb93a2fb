//! Catchup estimation pipeline for walcatch.

pub mod control;
pub mod cost;
pub mod estimator;
pub mod primary;
pub mod report;

pub use control::RunControl;
pub use cost::{ApplyCostModel, DEFAULT_SEGMENT_APPLY_COST, FixedCostModel};
pub use estimator::CatchupEstimator;
pub use primary::PrimaryServer;
pub use report::{CatchupReport, format_duration};
