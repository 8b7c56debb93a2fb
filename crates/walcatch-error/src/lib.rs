//! Error taxonomy shared by every walcatch crate.
//!
//! One estimation run either reports a complete estimate or fails with
//! exactly one of these variants. There are no retries anywhere in the
//! pipeline, so each variant carries enough context (backup name, expected
//! vs. received identifiers) to diagnose a failure without re-running.

use std::io;

use thiserror::Error;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, WalcatchError>;

#[derive(Debug, Error)]
pub enum WalcatchError {
    /// Wrong CLI arity. Raised before any work is performed.
    #[error("usage: walcatch <backup_name> <destination>")]
    Usage,

    /// The named backup has no usable record in the catalog listing.
    #[error("backup {name} not found in catalog")]
    BackupNotFound { name: String },

    /// Malformed timestamp or LSN text.
    #[error("parse error: {detail}")]
    Parse { detail: String },

    /// Channel establishment or I/O failure.
    #[error("connection error: {0}")]
    Connection(#[from] io::Error),

    /// A wire frame did not deserialize to the expected structure.
    #[error("decode error: {detail}")]
    Decode { detail: String },

    /// The two sides are unrelated databases. Fatal, no retry.
    #[error("system identifiers do not match: local {local}, destination {remote}")]
    IdentityMismatch { local: u64, remote: u64 },

    /// Same database lineage but diverged timelines. Fatal, no retry.
    #[error("destination is on timeline {remote}, but we are on {local}")]
    TimelineMismatch { local: u32, remote: u32 },

    /// The catalog or primary-side tool exited non-zero or produced
    /// unreadable output.
    #[error("external tool `{command}` failed: {detail}")]
    ExternalTool { command: String, detail: String },

    /// The run deadline expired while a stage was in flight.
    #[error("deadline exceeded during {stage}")]
    Timeout { stage: &'static str },

    /// The run was cancelled at a stage boundary.
    #[error("cancelled during {stage}")]
    Cancelled { stage: &'static str },
}

impl WalcatchError {
    pub fn parse(detail: impl Into<String>) -> Self {
        Self::Parse { detail: detail.into() }
    }

    pub fn decode(detail: impl Into<String>) -> Self {
        Self::Decode { detail: detail.into() }
    }

    pub fn external_tool(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ExternalTool { command: command.into(), detail: detail.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_mismatch_reports_both_sides() {
        let err = WalcatchError::TimelineMismatch { local: 3, remote: 5 };
        assert_eq!(err.to_string(), "destination is on timeline 5, but we are on 3");
    }

    #[test]
    fn external_tool_names_the_command() {
        let err = WalcatchError::external_tool("wal-g backup-list", "exit status 1");
        assert!(err.to_string().contains("wal-g backup-list"));
    }
}
