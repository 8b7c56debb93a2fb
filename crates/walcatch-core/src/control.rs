//! Run deadline and cancellation.
//!
//! The pipeline is strictly sequential, so cancellation is "stop calling
//! the next stage": the estimator checks this control at every stage
//! boundary, and the wire channel applies the remaining deadline as a read
//! timeout on every receive. Expiry and cancellation abort exactly like
//! any other stage failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use walcatch_error::{Result, WalcatchError};

#[derive(Debug, Clone)]
pub struct RunControl {
    deadline: Option<Instant>,
    cancel: Arc<AtomicBool>,
}

impl RunControl {
    /// No deadline; blocking calls may hang until the peer or tool
    /// responds.
    #[must_use]
    pub fn unbounded() -> Self {
        Self { deadline: None, cancel: Arc::new(AtomicBool::new(false)) }
    }

    /// Bound the whole run by `budget` from now.
    #[must_use]
    pub fn with_deadline(budget: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + budget),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag another thread (e.g. a signal handler) can set to abort the
    /// run at the next stage boundary.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Fail if the run was cancelled or the deadline has passed.
    pub fn check(&self, stage: &'static str) -> Result<()> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(WalcatchError::Cancelled { stage });
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(WalcatchError::Timeout { stage });
            }
        }
        Ok(())
    }

    /// Time left until the deadline; `None` when the run is unbounded.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// The absolute deadline, for collaborators that bound their own
    /// blocking calls (tool runs, connects).
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::unbounded()
    }
}
