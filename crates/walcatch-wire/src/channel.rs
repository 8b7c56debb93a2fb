//! The bidirectional destination channel.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use walcatch_error::Result;

/// An established byte channel to the destination peer.
///
/// One estimation run owns its channel exclusively and drops it on every
/// exit path. `set_read_deadline` bounds each subsequent receive; `None`
/// blocks indefinitely, matching a run without a deadline.
pub trait Channel: Read + Write {
    fn set_read_deadline(&mut self, timeout: Option<Duration>) -> Result<()>;
}

impl Channel for TcpStream {
    fn set_read_deadline(&mut self, timeout: Option<Duration>) -> Result<()> {
        // A zero timeout means "already expired" to callers but is invalid
        // for the socket API, so round it up to the smallest bound.
        let timeout = timeout.map(|t| t.max(Duration::from_millis(1)));
        self.set_read_timeout(timeout)?;
        Ok(())
    }
}
