/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX message encoder.
//!
//! The encoder accumulates the fields between BodyLength and CheckSum and
//! frames them on [`Encoder::finish`]. Callers never write tags 8, 9 or 10
//! themselves.

use crate::checksum::{calculate_checksum, format_checksum};
use bytes::{BufMut, Bytes, BytesMut};

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// FIX message encoder.
#[derive(Debug)]
pub struct Encoder {
    /// Fields between BodyLength and CheckSum.
    body: BytesMut,
    /// The BeginString value, e.g. `FIX.4.4`.
    begin_string: Bytes,
}

impl Encoder {
    /// Creates a new encoder for the given BeginString.
    #[must_use]
    pub fn new(begin_string: impl Into<Bytes>) -> Self {
        Self::with_capacity(begin_string, 256)
    }

    /// Creates a new encoder with pre-allocated body capacity.
    #[must_use]
    pub fn with_capacity(begin_string: impl Into<Bytes>, capacity: usize) -> Self {
        Self {
            body: BytesMut::with_capacity(capacity),
            begin_string: begin_string.into(),
        }
    }

    /// Appends a field with a string value.
    #[inline]
    pub fn put_str(&mut self, tag: u32, value: &str) {
        self.put_raw(tag, value.as_bytes());
    }

    /// Appends a field with an unsigned integer value.
    #[inline]
    pub fn put_uint(&mut self, tag: u32, value: u64) {
        let mut buf = itoa::Buffer::new();
        self.put_raw(tag, buf.format(value).as_bytes());
    }

    /// Appends a field with raw bytes.
    ///
    /// The value is written verbatim, so data fields may contain SOH.
    #[inline]
    pub fn put_raw(&mut self, tag: u32, value: &[u8]) {
        let mut tag_buf = itoa::Buffer::new();
        self.body.put_slice(tag_buf.format(tag).as_bytes());
        self.body.put_u8(b'=');
        self.body.put_slice(value);
        self.body.put_u8(SOH);
    }

    /// Returns the number of body bytes written so far.
    #[inline]
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Frames the message.
    ///
    /// Prepends `8=` and `9=` and appends `10=` computed over every
    /// preceding byte.
    #[must_use]
    pub fn finish(self) -> Bytes {
        let mut len_buf = itoa::Buffer::new();
        let len_str = len_buf.format(self.body.len());

        let mut message =
            BytesMut::with_capacity(self.begin_string.len() + len_str.len() + self.body.len() + 16);
        message.put_slice(b"8=");
        message.put_slice(&self.begin_string);
        message.put_u8(SOH);
        message.put_slice(b"9=");
        message.put_slice(len_str.as_bytes());
        message.put_u8(SOH);
        message.put_slice(&self.body);

        let checksum = format_checksum(calculate_checksum(&message));
        message.put_slice(b"10=");
        message.put_slice(&checksum);
        message.put_u8(SOH);

        message.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_frame() {
        let mut encoder = Encoder::new("FIX.4.4");
        encoder.put_str(35, "0");
        let message = encoder.finish();
        assert_eq!(&message[..], b"8=FIX.4.4\x019=5\x0135=0\x0110=163\x01");
    }

    #[test]
    fn test_body_length_counts_from_msg_type_to_checksum() {
        let mut encoder = Encoder::new("FIX.4.2");
        encoder.put_str(35, "A");
        encoder.put_uint(34, 1);
        encoder.put_uint(108, 30);
        let expected = encoder.body_len();
        let message = encoder.finish();
        let text = String::from_utf8_lossy(&message);
        assert!(text.contains(&format!("\x019={expected}\x01")));
    }

    #[test]
    fn test_raw_value_may_contain_soh() {
        let mut encoder = Encoder::new("FIX.4.4");
        encoder.put_str(35, "B");
        encoder.put_uint(95, 3);
        encoder.put_raw(96, b"a\x01b");
        let message = encoder.finish();
        let text = String::from_utf8_lossy(&message);
        assert!(text.contains("96=a\x01b\x01"));
    }

    #[test]
    fn test_checksum_matches_preceding_bytes() {
        let mut encoder = Encoder::new("FIXT.1.1");
        encoder.put_str(35, "D");
        encoder.put_str(11, "ORDER-1");
        let message = encoder.finish();
        let trailer_at = message.len() - 7;
        let declared = crate::checksum::parse_checksum(&message[trailer_at + 3..trailer_at + 6]);
        assert_eq!(declared, Some(calculate_checksum(&message[..trailer_at])));
    }
}
