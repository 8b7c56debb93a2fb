//! Per-segment apply cost policy.

use std::time::Duration;

/// Estimated wall-clock cost to apply one WAL segment.
///
/// The estimator always calls through this seam rather than inlining a
/// constant, so a model driven by historical replay telemetry can replace
/// the fixed default without touching the orchestration.
pub trait ApplyCostModel {
    fn cost_per_segment(&self) -> Duration;
}

/// Placeholder cost of applying one segment. Not statistically validated.
pub const DEFAULT_SEGMENT_APPLY_COST: Duration = Duration::from_secs(10);

/// The default policy: every segment costs the same fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct FixedCostModel {
    per_segment: Duration,
}

impl FixedCostModel {
    #[must_use]
    pub const fn new(per_segment: Duration) -> Self {
        Self { per_segment }
    }
}

impl Default for FixedCostModel {
    fn default() -> Self {
        Self::new(DEFAULT_SEGMENT_APPLY_COST)
    }
}

impl ApplyCostModel for FixedCostModel {
    fn cost_per_segment(&self) -> Duration {
        self.per_segment
    }
}
