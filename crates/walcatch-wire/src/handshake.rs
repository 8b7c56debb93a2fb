//! Identity handshake with the destination peer.
//!
//! Run once per estimation over an already-established channel. The
//! destination speaks first: a [`ControlMetadata`] frame, then its current
//! file list. The handshake validates that both sides are the same
//! physical database lineage (`system_identifier`) on the same timeline
//! before any estimate is reported. Both mismatches are fatal; there is no
//! retry.

use serde::{Deserialize, Serialize};
use tracing::info;
use walcatch_error::{Result, WalcatchError};
use walcatch_types::ServerIdentity;

use crate::channel::Channel;
use crate::frame::read_frame;

/// First frame received from the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMetadata {
    pub system_identifier: u64,
    pub current_timeline: u32,
}

/// One entry of the destination's file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub size: u64,
}

/// What a successful handshake produced. The file list is informational
/// for the estimator: logged, never used in the arithmetic.
#[derive(Debug, Clone)]
pub struct HandshakeOutcome {
    pub control: ControlMetadata,
    pub files: Vec<FileEntry>,
}

/// Receive and validate the destination's identity, then its file list.
pub fn run_handshake<C: Channel>(
    channel: &mut C,
    local: ServerIdentity,
) -> Result<HandshakeOutcome> {
    let control: ControlMetadata = read_frame(channel)?;
    info!(
        system_identifier = control.system_identifier,
        current_timeline = control.current_timeline,
        "destination control metadata"
    );
    info!(
        system_identifier = local.system_identifier,
        timeline = local.timeline,
        "local server identity"
    );

    if control.system_identifier != local.system_identifier {
        return Err(WalcatchError::IdentityMismatch {
            local: local.system_identifier,
            remote: control.system_identifier,
        });
    }
    if control.current_timeline != local.timeline {
        return Err(WalcatchError::TimelineMismatch {
            local: local.timeline,
            remote: control.current_timeline,
        });
    }

    let files: Vec<FileEntry> = read_frame(channel)?;
    info!(files = files.len(), "received destination file list");

    Ok(HandshakeOutcome { control, files })
}
