//! The catalog seam consumed by the estimator.
//!
//! The estimator sees already-parsed records, never raw text or a child
//! process, so the pipeline is testable with an in-memory catalog. The
//! process-backed implementation shells out to the backup tool and feeds
//! its output through the listing parsers.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::info;
use walcatch_error::Result;
use walcatch_types::WalSegment;

use crate::listing::{locate_backup, segments_after};
use crate::tool::run_tool_bounded;

/// Parsed view of the external backup catalog.
pub trait Catalog {
    /// Creation instant of the named backup.
    fn backup_created_at(&self, name: &str) -> Result<DateTime<Utc>>;

    /// WAL segments produced strictly after `cutoff`, in the catalog's
    /// own (time) order.
    fn segments_after(&self, cutoff: DateTime<Utc>) -> Result<Vec<WalSegment>>;
}

/// Catalog backed by the `wal-g` command-line tool.
#[derive(Debug, Clone)]
pub struct ProcessCatalog {
    walg_bin: String,
    deadline: Option<Instant>,
}

impl ProcessCatalog {
    #[must_use]
    pub fn new(walg_bin: impl Into<String>) -> Self {
        Self { walg_bin: walg_bin.into(), deadline: None }
    }

    /// Bound every tool invocation by the run deadline; a hung tool is
    /// killed when it expires.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

impl Default for ProcessCatalog {
    fn default() -> Self {
        Self::new("wal-g")
    }
}

impl Catalog for ProcessCatalog {
    fn backup_created_at(&self, name: &str) -> Result<DateTime<Utc>> {
        let listing = run_tool_bounded(
            &self.walg_bin,
            &["backup-list", "--detail"],
            self.remaining(),
            "backup-listing",
        )?;
        let created_at = locate_backup(name, listing.lines())?;
        info!(backup = name, %created_at, "resolved backup creation time");
        Ok(created_at)
    }

    fn segments_after(&self, cutoff: DateTime<Utc>) -> Result<Vec<WalSegment>> {
        let listing =
            run_tool_bounded(&self.walg_bin, &["wal-show"], self.remaining(), "wal-listing")?;
        Ok(segments_after(cutoff, listing.lines()))
    }
}
