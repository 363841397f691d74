//! Multiplexed stream frame header.
//!
//! Non-TTY containers deliver stdout and stderr over one connection, each
//! payload prefixed with an 8-byte header:
//!
//! ```text
//! [tag: u8][0, 0, 0][length: u32 big-endian]
//! ```

use bytes::Bytes;

use crate::error::{Error, Result};

/// Size of a frame header in bytes.
pub const HEADER_LEN: usize = 8;

/// Which standard stream a frame belongs to.
///
/// The tag is carried through as-is; values other than 0, 1 and 2 are kept in
/// [`StreamTag::Other`] rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamTag {
    /// Tag 0.
    Stdin,
    /// Tag 1.
    Stdout,
    /// Tag 2.
    Stderr,
    /// Any other tag value.
    Other(u8),
}

impl From<u8> for StreamTag {
    fn from(tag: u8) -> Self {
        match tag {
            0 => Self::Stdin,
            1 => Self::Stdout,
            2 => Self::Stderr,
            other => Self::Other(other),
        }
    }
}

impl From<StreamTag> for u8 {
    fn from(tag: StreamTag) -> Self {
        match tag {
            StreamTag::Stdin => 0,
            StreamTag::Stdout => 1,
            StreamTag::Stderr => 2,
            StreamTag::Other(other) => other,
        }
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Stream the payload belongs to.
    pub tag: StreamTag,
    /// Payload length in bytes. Zero is valid.
    pub length: u32,
}

impl FrameHeader {
    /// Payload length as a `usize`.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        usize::try_from(self.length).unwrap_or(usize::MAX)
    }
}

/// Decode a header. Bytes 1..4 are reserved and ignored.
#[must_use]
pub fn decode_header(header: &[u8; HEADER_LEN]) -> FrameHeader {
    FrameHeader {
        tag: StreamTag::from(header[0]),
        length: u32::from_be_bytes([header[4], header[5], header[6], header[7]]),
    }
}

/// Decode a header from the front of `bytes`.
///
/// Fails with a format error when fewer than [`HEADER_LEN`] bytes are given;
/// callers only do that once the stream has ended.
pub fn decode_header_slice(bytes: &[u8]) -> Result<FrameHeader> {
    let header: &[u8; HEADER_LEN] = bytes
        .get(..HEADER_LEN)
        .and_then(|h| h.try_into().ok())
        .ok_or_else(|| {
            Error::format(format!(
                "truncated frame header: got {} of {HEADER_LEN} bytes",
                bytes.len()
            ))
        })?;

    Ok(decode_header(header))
}

/// One demultiplexed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Stream the payload belongs to.
    pub tag: StreamTag,
    /// Payload bytes.
    pub payload: Bytes,
}
