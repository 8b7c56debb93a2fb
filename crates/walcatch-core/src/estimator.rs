//! The estimation pipeline.
//!
//! Stages run strictly in sequence, each to completion before the next:
//! resolve the backup's creation instant, scan the WAL history after it,
//! validate identity and timeline against the destination, resolve the
//! anchoring log position from the primary, then compute the estimate.
//! Any stage failure aborts the whole run; a partial estimate is never
//! reported.

use std::io::ErrorKind;

use tracing::info;
use walcatch_catalog::Catalog;
use walcatch_error::{Result, WalcatchError};
use walcatch_types::{Backup, CatchupEstimate, Lsn};
use walcatch_wire::{Channel, run_handshake};

use crate::control::RunControl;
use crate::cost::ApplyCostModel;
use crate::primary::PrimaryServer;
use crate::report::CatchupReport;

const STAGE_RESOLVING_BACKUP: &str = "resolving-backup";
const STAGE_SCANNING_WAL: &str = "scanning-wal";
const STAGE_HANDSHAKING: &str = "handshaking";
const STAGE_RESOLVING_LSN: &str = "resolving-lsn";

/// Label passed to the primary when starting the anchoring backup.
const BACKUP_LABEL: &str = "walcatch";

/// One estimation run. Owns the destination channel for its lifetime and
/// releases it on every exit path.
pub struct CatchupEstimator<'a, C: Channel> {
    catalog: &'a dyn Catalog,
    primary: &'a dyn PrimaryServer,
    cost_model: &'a dyn ApplyCostModel,
    channel: C,
    control: RunControl,
}

impl<'a, C: Channel> CatchupEstimator<'a, C> {
    pub fn new(
        catalog: &'a dyn Catalog,
        primary: &'a dyn PrimaryServer,
        cost_model: &'a dyn ApplyCostModel,
        channel: C,
        control: RunControl,
    ) -> Self {
        Self { catalog, primary, cost_model, channel, control }
    }

    /// Run the pipeline for `backup_name`.
    ///
    /// The resolved log position anchors the report but does not feed
    /// segment selection: the count comes from the timestamp-filtered WAL
    /// listing, an approximation of the true apply set. Reconciling the
    /// two would need the catalog to expose per-segment start positions.
    pub fn run(mut self, backup_name: &str) -> Result<CatchupReport> {
        self.control.check(STAGE_RESOLVING_BACKUP)?;
        let backup_created_at = self.catalog.backup_created_at(backup_name)?;

        self.control.check(STAGE_SCANNING_WAL)?;
        let segments = self.catalog.segments_after(backup_created_at)?;
        info!(
            backup = backup_name,
            cutoff = %backup_created_at,
            segments = segments.len(),
            "scanned wal history"
        );

        self.control.check(STAGE_HANDSHAKING)?;
        let local = self.primary.identity()?;
        self.channel.set_read_deadline(self.control.remaining())?;
        let outcome = run_handshake(&mut self.channel, local)
            .map_err(|err| timeout_if_expired(err, STAGE_HANDSHAKING))?;

        self.control.check(STAGE_RESOLVING_LSN)?;
        let lsn_text = self.primary.start_backup(BACKUP_LABEL)?;
        let anchor: Lsn = lsn_text.trim().parse()?;
        info!(%anchor, "resolved primary log position");

        // Pure and total from here on.
        let segment_count = segments.len();
        let per_segment = self.cost_model.cost_per_segment();
        let total = per_segment.saturating_mul(u32::try_from(segment_count).unwrap_or(u32::MAX));
        let estimate = CatchupEstimate { segment_count, total };
        info!(segments = segment_count, total = ?total, "estimated catchup time");

        Ok(CatchupReport {
            estimate,
            backup: Backup { name: backup_name.to_owned(), created_at: backup_created_at },
            anchor,
            destination_files: outcome.files.len(),
        })
    }
}

/// A receive that hit the channel's read deadline surfaces as an I/O
/// error; report it as the run deadline expiring instead.
fn timeout_if_expired(err: WalcatchError, stage: &'static str) -> WalcatchError {
    match err {
        WalcatchError::Connection(io)
            if matches!(io.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
        {
            WalcatchError::Timeout { stage }
        }
        other => other,
    }
}
