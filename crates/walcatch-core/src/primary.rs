//! The local (primary) server seam.
//!
//! The primary's physical backup machinery is an external collaborator;
//! the estimator only needs its durable identity and the log position a
//! freshly started backup reports.

use walcatch_error::Result;
use walcatch_types::ServerIdentity;

pub trait PrimaryServer {
    /// The primary's system identifier and current timeline.
    fn identity(&self) -> Result<ServerIdentity>;

    /// Begin a backup operation on the primary and return the start log
    /// position exactly as the server reported it, as text.
    fn start_backup(&self, label: &str) -> Result<String>;
}
