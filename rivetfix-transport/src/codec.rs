/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Tokio codec that cuts a byte stream into whole FIX messages.
//!
//! Framing only looks at BeginString, BodyLength and the CheckSum trailer.
//! Everything between is handed to the session undecoded.

use bytes::{BufMut, Bytes, BytesMut};
use memchr::memchr;
use rivetfix_tagvalue::SOH;
use rivetfix_tagvalue::checksum::{calculate_checksum, parse_checksum};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// `10=NNN<SOH>`
const TRAILER_LEN: usize = 7;

/// Shortest frame worth inspecting: `8=FIX.4.2|9=5|35=0|10=NNN|`.
const MIN_FRAME_LEN: usize = 20;

/// Errors that end a framed connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The stream does not start with `8=`.
    #[error("invalid begin string: message must start with 8=")]
    InvalidBeginString,

    /// BodyLength does not follow BeginString.
    #[error("missing body length field (tag 9)")]
    MissingBodyLength,

    /// BodyLength is not a number.
    #[error("invalid body length value")]
    InvalidBodyLength,

    /// BodyLength does not end where the CheckSum field starts.
    #[error("checksum field (tag 10) not found where body length ends")]
    MissingChecksum,

    /// CheckSum does not match the frame.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum.
        calculated: u8,
        /// Declared checksum in message.
        declared: u8,
    },

    /// Frame exceeds the configured maximum.
    #[error("message too large: {size} bytes exceeds maximum {max_size}")]
    MessageTooLarge {
        /// Declared frame size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// I/O error on the underlying stream.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Frames FIX tag=value messages.
#[derive(Debug, Clone)]
pub struct FixCodec {
    max_message_size: usize,
    validate_checksum: bool,
}

impl FixCodec {
    /// Creates a codec with a 1 MiB frame limit and checksum validation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_message_size: 1024 * 1024,
            validate_checksum: true,
        }
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets whether to validate checksums.
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    #[must_use]
    pub const fn max_message_size(&self) -> usize {
        self.max_message_size
    }
}

impl Default for FixCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FixCodec {
    type Item = Bytes;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < MIN_FRAME_LEN {
            return Ok(None);
        }
        if &src[..2] != b"8=" {
            return Err(CodecError::InvalidBeginString);
        }

        let Some(first_soh) = memchr(SOH, src) else {
            return Ok(None);
        };

        let body_len_start = first_soh + 1;
        if src.len() < body_len_start + 3 {
            return Ok(None);
        }
        if &src[body_len_start..body_len_start + 2] != b"9=" {
            return Err(CodecError::MissingBodyLength);
        }

        let Some(offset) = memchr(SOH, &src[body_len_start..]) else {
            return Ok(None);
        };
        let body_len_soh = body_len_start + offset;

        let body_length: usize = std::str::from_utf8(&src[body_len_start + 2..body_len_soh])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(CodecError::InvalidBodyLength)?;

        let total_length = (body_len_soh + 1 + TRAILER_LEN)
            .checked_add(body_length)
            .unwrap_or(usize::MAX);
        if total_length > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size: total_length,
                max_size: self.max_message_size,
            });
        }
        let checksum_field_start = total_length - TRAILER_LEN;

        if src.len() < total_length {
            src.reserve(total_length - src.len());
            return Ok(None);
        }

        let trailer = &src[checksum_field_start..total_length];
        if &trailer[..3] != b"10=" || trailer[TRAILER_LEN - 1] != SOH {
            return Err(CodecError::MissingChecksum);
        }

        if self.validate_checksum {
            let declared = parse_checksum(&trailer[3..6]).ok_or(CodecError::MissingChecksum)?;
            let calculated = calculate_checksum(&src[..checksum_field_start]);
            if calculated != declared {
                return Err(CodecError::ChecksumMismatch {
                    calculated,
                    declared,
                });
            }
        }

        Ok(Some(src.split_to(total_length).freeze()))
    }
}

impl Encoder<Bytes> for FixCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(body: &str) -> Vec<u8> {
        let head = format!("8=FIX.4.4\x019={}\x01{body}", body.len());
        let checksum = calculate_checksum(head.as_bytes());
        format!("{head}10={checksum:03}\x01").into_bytes()
    }

    #[test]
    fn test_decode_complete_frame() {
        let mut codec = FixCodec::new();
        let msg = frame("35=0\x0134=2\x01");
        let mut buf = BytesMut::from(&msg[..]);

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&decoded[..], &msg[..]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_waits_for_more_data() {
        let mut codec = FixCodec::new();
        let msg = frame("35=0\x01");
        let mut buf = BytesMut::from(&msg[..msg.len() - 5]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&msg[msg.len() - 5..]);
        assert!(codec.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn test_decode_splits_back_to_back_frames() {
        let mut codec = FixCodec::new();
        let first = frame("35=0\x0134=2\x01");
        let second = frame("35=1\x0134=3\x01112=T\x01");
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&first);
        buf.extend_from_slice(&second);

        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], &first[..]);
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], &second[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_invalid_begin_string() {
        let mut codec = FixCodec::new();
        let mut buf = BytesMut::from(&b"9=FIX.4.4\x019=5\x0135=0\x0110=000\x01"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::InvalidBeginString)
        ));
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let mut codec = FixCodec::new();
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=5\x0135=0\x0110=000\x01"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_without_checksum_validation() {
        let mut codec = FixCodec::new().with_checksum_validation(false);
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=5\x0135=0\x0110=000\x01"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn test_decode_wrong_body_length() {
        let mut codec = FixCodec::new().with_checksum_validation(false);
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=3\x0135=0\x0110=000\x01xx"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::MissingChecksum)
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_frame() {
        let mut codec = FixCodec::new().with_max_message_size(32);
        let msg = frame("35=0\x0158=a long enough text field\x01");
        let mut buf = BytesMut::from(&msg[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::MessageTooLarge { max_size: 32, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_huge_body_length() {
        let mut codec = FixCodec::new();
        let max = format!("8=FIX.4.4\x019={}\x0135=0\x0110=000\x01", usize::MAX);
        let mut buf = BytesMut::from(max.as_bytes());
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::MessageTooLarge { size: usize::MAX, .. })
        ));

        let near = format!("8=FIX.4.4\x019={}\x0135=0\x0110=000\x01", usize::MAX - 10);
        let mut buf = BytesMut::from(near.as_bytes());
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::MessageTooLarge { .. })
        ));

        let mut buf =
            BytesMut::from(&b"8=FIX.4.4\x019=99999999999999999999999\x0135=0\x0110=000\x01"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::InvalidBodyLength)
        ));
    }

    #[test]
    fn test_encode_passes_bytes_through() {
        let mut codec = FixCodec::new();
        let msg = Bytes::from(frame("35=0\x01"));
        let mut dst = BytesMut::new();
        codec.encode(msg.clone(), &mut dst).unwrap();
        assert_eq!(&dst[..], &msg[..]);
    }
}
