//! The report a successful run produces.

use std::time::Duration;

use walcatch_types::{Backup, CatchupEstimate, Lsn};

/// Everything a completed estimation resolved. Recomputed per invocation,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchupReport {
    pub estimate: CatchupEstimate,
    /// The base backup the run was anchored on.
    pub backup: Backup,
    /// Log position the primary reported when the backup operation began.
    pub anchor: Lsn,
    /// Size of the destination's file list, informational only.
    pub destination_files: usize,
}

/// Render a duration in compact `2h3m20s` form for the operator.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
