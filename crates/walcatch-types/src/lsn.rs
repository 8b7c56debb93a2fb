//! Log sequence numbers.
//!
//! An LSN is a monotonically increasing 64-bit log position written as two
//! 32-bit halves in the canonical Postgres text form `XXXXXXXX/XXXXXXXX`.
//! Ordering is numeric on the composite value, never lexicographic on the
//! text, and `parse` is the exact inverse of `format`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use walcatch_error::WalcatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lsn {
    pub high: u32,
    pub low: u32,
}

impl Lsn {
    #[must_use]
    pub const fn new(high: u32, low: u32) -> Self {
        Self { high, low }
    }

    /// The composite 64-bit position `high * 2^32 + low`.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        ((self.high as u64) << 32) | self.low as u64
    }
}

impl Ord for Lsn {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_u64().cmp(&other.as_u64())
    }
}

impl PartialOrd for Lsn {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}/{:08X}", self.high, self.low)
    }
}

impl FromStr for Lsn {
    type Err = WalcatchError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (high_text, low_text) = text
            .split_once('/')
            .ok_or_else(|| WalcatchError::parse(format!("LSN `{text}` is missing `/`")))?;
        let high = parse_half(high_text)
            .ok_or_else(|| WalcatchError::parse(format!("LSN `{text}` has a bad high half")))?;
        let low = parse_half(low_text)
            .ok_or_else(|| WalcatchError::parse(format!("LSN `{text}` has a bad low half")))?;
        Ok(Self { high, low })
    }
}

/// One half of the canonical form: hex digits only. `from_str_radix`
/// alone would also accept a sign prefix.
fn parse_half(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(text, 16).ok()
}
