//! End-to-end pipeline tests over in-memory collaborators.
//!
//! No child processes and no sockets: the catalog, primary, and channel
//! are all scripted, which is exactly the seam layout the estimator is
//! built around.

use std::cell::Cell;
use std::io::{Cursor, Read, Write};
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::{DateTime, Utc};
use walcatch_catalog::Catalog;
use walcatch_core::{
    CatchupEstimator, FixedCostModel, PrimaryServer, RunControl, format_duration,
};
use walcatch_error::{Result, WalcatchError};
use walcatch_types::{ServerIdentity, WalSegment};
use walcatch_wire::{Channel, ControlMetadata, FileEntry, write_frame};

fn instant(text: &str) -> DateTime<Utc> {
    walcatch_catalog::listing::parse_instant(text).expect("test timestamp parses")
}

struct StubCatalog {
    created_at: DateTime<Utc>,
    segments: Vec<WalSegment>,
    backup_resolved: Cell<bool>,
}

impl StubCatalog {
    fn new(created_at: DateTime<Utc>, segment_times: &[&str]) -> Self {
        let segments = segment_times
            .iter()
            .enumerate()
            .map(|(index, time)| WalSegment {
                id: format!("segment-{index}"),
                produced_at: instant(time),
            })
            .collect();
        Self { created_at, segments, backup_resolved: Cell::new(false) }
    }
}

impl Catalog for StubCatalog {
    fn backup_created_at(&self, _name: &str) -> Result<DateTime<Utc>> {
        self.backup_resolved.set(true);
        Ok(self.created_at)
    }

    fn segments_after(&self, cutoff: DateTime<Utc>) -> Result<Vec<WalSegment>> {
        Ok(self
            .segments
            .iter()
            .filter(|segment| segment.produced_at > cutoff)
            .cloned()
            .collect())
    }
}

struct FailingCatalog;

impl Catalog for FailingCatalog {
    fn backup_created_at(&self, name: &str) -> Result<DateTime<Utc>> {
        Err(WalcatchError::BackupNotFound { name: name.to_owned() })
    }

    fn segments_after(&self, _cutoff: DateTime<Utc>) -> Result<Vec<WalSegment>> {
        panic!("scanning must not run after backup resolution fails");
    }
}

struct StubPrimary {
    identity: ServerIdentity,
    lsn_text: &'static str,
}

impl PrimaryServer for StubPrimary {
    fn identity(&self) -> Result<ServerIdentity> {
        Ok(self.identity)
    }

    fn start_backup(&self, _label: &str) -> Result<String> {
        Ok(self.lsn_text.to_owned())
    }
}

struct ScriptedChannel {
    incoming: Cursor<Vec<u8>>,
    outgoing: Vec<u8>,
}

impl ScriptedChannel {
    fn new(incoming: Vec<u8>) -> Self {
        Self { incoming: Cursor::new(incoming), outgoing: Vec::new() }
    }

    fn for_destination(control: ControlMetadata, files: &[FileEntry]) -> Self {
        let mut incoming = Vec::new();
        write_frame(&mut incoming, &control).expect("encode control");
        write_frame(&mut incoming, &files).expect("encode file list");
        Self::new(incoming)
    }
}

impl Read for ScriptedChannel {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.incoming.read(buf)
    }
}

impl Write for ScriptedChannel {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.outgoing.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Channel for ScriptedChannel {
    fn set_read_deadline(&mut self, _timeout: Option<Duration>) -> Result<()> {
        Ok(())
    }
}

/// Channel whose reads always hit the read deadline, as a socket does
/// when the peer stays silent past the timeout.
struct SilentPeerChannel;

impl Read for SilentPeerChannel {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::from(std::io::ErrorKind::TimedOut))
    }
}

impl Write for SilentPeerChannel {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Channel for SilentPeerChannel {
    fn set_read_deadline(&mut self, _timeout: Option<Duration>) -> Result<()> {
        Ok(())
    }
}

const PRIMARY: StubPrimary = StubPrimary {
    identity: ServerIdentity { system_identifier: 42, timeline: 3 },
    lsn_text: "16/B374D848",
};

fn matching_channel() -> ScriptedChannel {
    ScriptedChannel::for_destination(
        ControlMetadata { system_identifier: 42, current_timeline: 3 },
        &[FileEntry { path: "base/1/16384".to_owned(), size: 8192 }],
    )
}

#[test]
fn two_later_segments_at_ten_seconds_each_is_twenty_seconds() {
    let catalog = StubCatalog::new(
        instant("2024-01-01T00:00:00Z"),
        &[
            "2023-12-31T23:00:00Z",
            "2024-01-01T01:00:00Z",
            "2024-01-01T02:00:00Z",
        ],
    );
    let report = CatchupEstimator::new(
        &catalog,
        &PRIMARY,
        &FixedCostModel::default(),
        matching_channel(),
        RunControl::unbounded(),
    )
    .run("base1")
    .expect("pipeline succeeds");

    assert_eq!(report.estimate.segment_count, 2);
    assert_eq!(report.estimate.total, Duration::from_secs(20));
    assert_eq!(format_duration(report.estimate.total), "20s");
    assert_eq!(report.anchor.to_string(), "00000016/B374D848");
    assert_eq!(report.destination_files, 1);
    assert_eq!(report.backup.name, "base1");
    assert_eq!(report.backup.created_at, instant("2024-01-01T00:00:00Z"));
}

#[test]
fn zero_cost_model_yields_zero_total_regardless_of_count() {
    let catalog = StubCatalog::new(
        instant("2024-01-01T00:00:00Z"),
        &["2024-01-01T01:00:00Z", "2024-01-01T02:00:00Z", "2024-01-01T03:00:00Z"],
    );
    let report = CatchupEstimator::new(
        &catalog,
        &PRIMARY,
        &FixedCostModel::new(Duration::ZERO),
        matching_channel(),
        RunControl::unbounded(),
    )
    .run("base1")
    .expect("pipeline succeeds");

    assert_eq!(report.estimate.segment_count, 3);
    assert_eq!(report.estimate.total, Duration::ZERO);
}

#[test]
fn missing_backup_aborts_before_scanning() {
    let err = CatchupEstimator::new(
        &FailingCatalog,
        &PRIMARY,
        &FixedCostModel::default(),
        matching_channel(),
        RunControl::unbounded(),
    )
    .run("base1")
    .expect_err("no estimate from an unknown backup");
    assert!(matches!(err, WalcatchError::BackupNotFound { name } if name == "base1"));
}

#[test]
fn identity_mismatch_aborts_with_no_estimate() {
    let catalog = StubCatalog::new(instant("2024-01-01T00:00:00Z"), &["2024-01-01T01:00:00Z"]);
    let channel = ScriptedChannel::for_destination(
        ControlMetadata { system_identifier: 7, current_timeline: 3 },
        &[],
    );
    let err = CatchupEstimator::new(
        &catalog,
        &PRIMARY,
        &FixedCostModel::default(),
        channel,
        RunControl::unbounded(),
    )
    .run("base1")
    .expect_err("unrelated databases");
    assert!(matches!(err, WalcatchError::IdentityMismatch { local: 42, remote: 7 }));
}

#[test]
fn timeline_mismatch_aborts_with_no_estimate() {
    let catalog = StubCatalog::new(instant("2024-01-01T00:00:00Z"), &["2024-01-01T01:00:00Z"]);
    let channel = ScriptedChannel::for_destination(
        ControlMetadata { system_identifier: 42, current_timeline: 9 },
        &[],
    );
    let err = CatchupEstimator::new(
        &catalog,
        &PRIMARY,
        &FixedCostModel::default(),
        channel,
        RunControl::unbounded(),
    )
    .run("base1")
    .expect_err("diverged timelines");
    assert!(matches!(err, WalcatchError::TimelineMismatch { local: 3, remote: 9 }));
}

#[test]
fn unparsable_start_backup_lsn_aborts() {
    let catalog = StubCatalog::new(instant("2024-01-01T00:00:00Z"), &["2024-01-01T01:00:00Z"]);
    let primary = StubPrimary {
        identity: ServerIdentity { system_identifier: 42, timeline: 3 },
        lsn_text: "not-an-lsn",
    };
    let err = CatchupEstimator::new(
        &catalog,
        &primary,
        &FixedCostModel::default(),
        matching_channel(),
        RunControl::unbounded(),
    )
    .run("base1")
    .expect_err("bad anchor text");
    assert!(matches!(err, WalcatchError::Parse { .. }));
}

#[test]
fn receive_hitting_the_read_deadline_is_a_handshake_timeout() {
    let catalog = StubCatalog::new(instant("2024-01-01T00:00:00Z"), &["2024-01-01T01:00:00Z"]);
    let err = CatchupEstimator::new(
        &catalog,
        &PRIMARY,
        &FixedCostModel::default(),
        SilentPeerChannel,
        RunControl::with_deadline(Duration::from_secs(60)),
    )
    .run("base1")
    .expect_err("peer never answers within the deadline");
    assert!(matches!(err, WalcatchError::Timeout { stage: "handshaking" }));
}

#[test]
fn cancelled_run_aborts_at_the_first_stage_boundary() {
    let catalog = StubCatalog::new(instant("2024-01-01T00:00:00Z"), &[]);
    let control = RunControl::unbounded();
    control.cancel_flag().store(true, Ordering::Relaxed);
    let err = CatchupEstimator::new(
        &catalog,
        &PRIMARY,
        &FixedCostModel::default(),
        matching_channel(),
        control,
    )
    .run("base1")
    .expect_err("cancelled before any work");
    assert!(matches!(err, WalcatchError::Cancelled { stage: "resolving-backup" }));
    assert!(!catalog.backup_resolved.get());
}

#[test]
fn expired_deadline_aborts_at_the_first_stage_boundary() {
    let catalog = StubCatalog::new(instant("2024-01-01T00:00:00Z"), &[]);
    let err = CatchupEstimator::new(
        &catalog,
        &PRIMARY,
        &FixedCostModel::default(),
        matching_channel(),
        RunControl::with_deadline(Duration::ZERO),
    )
    .run("base1")
    .expect_err("deadline already passed");
    assert!(matches!(err, WalcatchError::Timeout { stage: "resolving-backup" }));
    assert!(!catalog.backup_resolved.get());
}
