//! Core value types for walcatch.
//!
//! Everything here is value-like and constructed fresh per estimation run;
//! no type in this crate holds shared mutable state or outlives one run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod lsn;

pub use lsn::Lsn;

/// A base backup as recorded by the external catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One WAL segment from the catalog's WAL listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalSegment {
    pub id: String,
    pub produced_at: DateTime<Utc>,
}

/// The durable identity of one database instance.
///
/// Two identities are compatible iff `system_identifier` is equal (same
/// physical database lineage). Timelines legitimately diverge after a
/// failover, so a timeline mismatch is reported separately from an
/// identity mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerIdentity {
    pub system_identifier: u64,
    pub timeline: u32,
}

/// The result of one estimation run. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchupEstimate {
    pub segment_count: usize,
    pub total: Duration,
}
