//! Marshal Module
//!
//! Fixed-width binary encoding of the sidecar expiration fields.
//!
//! Both forms are 13 bytes: a tag byte, a big-endian seconds word and a
//! big-endian nanoseconds word.
//!
//! ```text
//! +-----+----------------------+-------------+
//! | tag | seconds (8 bytes BE) | nanos (4 BE)|
//! +-----+----------------------+-------------+
//! ```
//!
//! Durations store unsigned seconds; instants store signed seconds since the
//! Unix epoch.

use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Length of every encoded value.
pub const ENCODED_LEN: usize = 13;

const DURATION_TAG: u8 = b'D';
const INSTANT_TAG: u8 = b'T';
const NANOS_PER_SEC: u32 = 1_000_000_000;

// == Marshal Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarshalError {
    #[error("expected {expected} bytes, found {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("expected tag {expected:#04x}, found {actual:#04x}")]
    WrongTag { expected: u8, actual: u8 },

    #[error("nanosecond component {0} is out of range")]
    NanosOutOfRange(u32),

    #[error("instant is outside the representable range")]
    OutOfRange,
}

// == Encoding ==
/// Encodes a sliding window.
pub fn encode_duration(duration: Duration) -> Bytes {
    encode(DURATION_TAG, duration.as_secs(), duration.subsec_nanos())
}

/// Encodes an absolute instant.
pub fn encode_instant(instant: DateTime<Utc>) -> Bytes {
    encode(
        INSTANT_TAG,
        instant.timestamp() as u64,
        instant.timestamp_subsec_nanos(),
    )
}

fn encode(tag: u8, secs: u64, nanos: u32) -> Bytes {
    let mut buf = BytesMut::with_capacity(ENCODED_LEN);
    buf.put_u8(tag);
    buf.put_u64(secs);
    buf.put_u32(nanos);
    buf.freeze()
}

// == Decoding ==
/// Decodes a value produced by [`encode_duration`].
pub fn decode_duration(raw: &[u8]) -> Result<Duration, MarshalError> {
    let (secs, nanos) = decode(DURATION_TAG, raw)?;
    Ok(Duration::new(secs, nanos))
}

/// Decodes a value produced by [`encode_instant`].
pub fn decode_instant(raw: &[u8]) -> Result<DateTime<Utc>, MarshalError> {
    let (secs, nanos) = decode(INSTANT_TAG, raw)?;
    DateTime::from_timestamp(secs as i64, nanos).ok_or(MarshalError::OutOfRange)
}

fn decode(tag: u8, raw: &[u8]) -> Result<(u64, u32), MarshalError> {
    let raw: &[u8; ENCODED_LEN] = raw.try_into().map_err(|_| MarshalError::WrongLength {
        expected: ENCODED_LEN,
        actual: raw.len(),
    })?;

    if raw[0] != tag {
        return Err(MarshalError::WrongTag {
            expected: tag,
            actual: raw[0],
        });
    }

    let mut secs = [0u8; 8];
    secs.copy_from_slice(&raw[1..9]);
    let mut nanos = [0u8; 4];
    nanos.copy_from_slice(&raw[9..13]);

    let nanos = u32::from_be_bytes(nanos);
    if nanos >= NANOS_PER_SEC {
        return Err(MarshalError::NanosOutOfRange(nanos));
    }

    Ok((u64::from_be_bytes(secs), nanos))
}
