//! Length-prefixed frame codec.
//!
//! Each frame is a `u32` big-endian payload length followed by a JSON
//! document. Short reads surface as [`WalcatchError::Connection`];
//! well-framed bytes that do not deserialize to the expected structure
//! surface as [`WalcatchError::Decode`].

use std::io::{Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;
use walcatch_error::{Result, WalcatchError};

/// Upper bound on one frame's payload. Anything larger is treated as a
/// corrupt length prefix rather than an allocation request.
pub const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

/// Write one framed value.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    let payload = serde_json::to_vec(value)
        .map_err(|err| WalcatchError::decode(format!("frame encode failed: {err}")))?;
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_FRAME_BYTES)
        .ok_or_else(|| {
            WalcatchError::decode(format!("frame payload of {} bytes too large", payload.len()))
        })?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one framed value.
pub fn read_frame<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T> {
    let mut len_bytes = [0_u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_be_bytes(len_bytes);
    if len > MAX_FRAME_BYTES {
        return Err(WalcatchError::decode(format!("frame length {len} exceeds limit")));
    }
    let mut payload = vec![0_u8; len as usize];
    reader.read_exact(&mut payload)?;
    serde_json::from_slice(&payload)
        .map_err(|err| WalcatchError::decode(format!("frame does not deserialize: {err}")))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct Probe {
        value: u64,
    }

    #[test]
    fn frames_round_trip() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, &Probe { value: 7 }).expect("write succeeds");
        let decoded: Probe = read_frame(&mut Cursor::new(buffer)).expect("read succeeds");
        assert_eq!(decoded, Probe { value: 7 });
    }

    #[test]
    fn truncated_payload_is_a_connection_error() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, &Probe { value: 7 }).expect("write succeeds");
        buffer.truncate(buffer.len() - 2);
        let err = read_frame::<_, Probe>(&mut Cursor::new(buffer)).expect_err("short read");
        assert!(matches!(err, WalcatchError::Connection(_)));
    }

    #[test]
    fn wrong_shape_is_a_decode_error() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, &"just a string").expect("write succeeds");
        let err = read_frame::<_, Probe>(&mut Cursor::new(buffer)).expect_err("bad shape");
        assert!(matches!(err, WalcatchError::Decode { .. }));
    }

    #[test]
    fn oversized_length_prefix_is_rejected_before_allocating() {
        let mut buffer = Vec::from(u32::MAX.to_be_bytes());
        buffer.extend_from_slice(b"{}");
        let err = read_frame::<_, Probe>(&mut Cursor::new(buffer)).expect_err("bad prefix");
        assert!(matches!(err, WalcatchError::Decode { .. }));
    }
}
