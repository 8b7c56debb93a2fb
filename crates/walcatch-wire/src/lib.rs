//! Wire protocol plumbing for the destination channel.

pub mod channel;
pub mod frame;
pub mod handshake;

pub use channel::Channel;
pub use frame::{MAX_FRAME_BYTES, read_frame, write_frame};
pub use handshake::{ControlMetadata, FileEntry, HandshakeOutcome, run_handshake};
