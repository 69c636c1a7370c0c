/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX message: header, body and trailer.
//!
//! Serialization is canonical. BeginString, BodyLength and MsgType come first
//! in that order, CheckSum comes last, BodyLength and CheckSum are always
//! recomputed. Parsing a serialized message and serializing it again yields
//! the same bytes.

use crate::decoder::Decoder;
use crate::encoder::{Encoder, SOH};
use crate::field_map::{FieldMap, Ordering};
use bytes::Bytes;
use rivetfix_core::error::{DecodeError, EncodeError, FieldError, FieldViolation};
use rivetfix_core::message::{MsgType, is_admin_msg_type};
use rivetfix_core::tags;
use rivetfix_core::types::FixVersion;
use std::fmt;

const HEADER_ORDERING: Ordering<'static> = Ordering {
    lead: &[tags::MSG_TYPE],
    tail: &[],
    skip: &[tags::BEGIN_STRING, tags::BODY_LENGTH],
};

const BODY_ORDERING: Ordering<'static> = Ordering {
    lead: &[],
    tail: &[],
    skip: &[],
};

const TRAILER_ORDERING: Ordering<'static> = Ordering {
    lead: &[],
    tail: &[],
    skip: &[tags::CHECK_SUM],
};

/// A FIX message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    header: FieldMap,
    body: FieldMap,
    trailer: FieldMap,
    structure: Option<FieldViolation>,
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a message with MsgType set.
    #[must_use]
    pub fn with_type(msg_type: &MsgType) -> Self {
        let mut message = Self::new();
        message.header.set_str(tags::MSG_TYPE, msg_type.as_str());
        message
    }

    /// Parses a message without a data dictionary.
    ///
    /// BodyLength and CheckSum are verified.
    ///
    /// # Errors
    /// Returns a [`DecodeError`] for structurally unreadable input.
    pub fn from_bytes(input: &[u8]) -> Result<Self, DecodeError> {
        Decoder::new().decode(input)
    }

    pub(crate) fn from_parts(
        header: FieldMap,
        body: FieldMap,
        trailer: FieldMap,
        structure: Option<FieldViolation>,
    ) -> Self {
        Self {
            header,
            body,
            trailer,
            structure,
        }
    }

    /// Returns the header.
    #[must_use]
    pub fn header(&self) -> &FieldMap {
        &self.header
    }

    /// Returns the header mutably.
    pub fn header_mut(&mut self) -> &mut FieldMap {
        &mut self.header
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &FieldMap {
        &self.body
    }

    /// Returns the body mutably.
    pub fn body_mut(&mut self) -> &mut FieldMap {
        &mut self.body
    }

    /// Returns the trailer.
    #[must_use]
    pub fn trailer(&self) -> &FieldMap {
        &self.trailer
    }

    /// Returns the trailer mutably.
    pub fn trailer_mut(&mut self) -> &mut FieldMap {
        &mut self.trailer
    }

    /// Returns the raw MsgType value.
    ///
    /// # Errors
    /// [`FieldError::NotFound`] when MsgType is absent.
    pub fn msg_type_str(&self) -> Result<&str, FieldError> {
        self.header.get_str(tags::MSG_TYPE)
    }

    /// Returns the MsgType.
    ///
    /// # Errors
    /// [`FieldError::NotFound`] when MsgType is absent.
    pub fn msg_type(&self) -> Result<MsgType, FieldError> {
        self.msg_type_str().map(MsgType::from)
    }

    /// Returns true for session-level messages.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.msg_type_str().is_ok_and(is_admin_msg_type)
    }

    /// Returns the BeginString.
    ///
    /// # Errors
    /// [`FieldError::NotFound`] when BeginString is absent.
    pub fn begin_string(&self) -> Result<&str, FieldError> {
        self.header.get_str(tags::BEGIN_STRING)
    }

    /// Returns the FIX version named by BeginString, if known.
    #[must_use]
    pub fn version(&self) -> Option<FixVersion> {
        self.begin_string().ok().and_then(FixVersion::from_begin_string)
    }

    /// Returns MsgSeqNum.
    ///
    /// # Errors
    /// [`FieldError`] when absent or not a number.
    pub fn seq_num(&self) -> Result<u64, FieldError> {
        self.header.get_u64(tags::MSG_SEQ_NUM)
    }

    /// Returns true if PossDupFlag is `Y`.
    #[must_use]
    pub fn is_poss_dup(&self) -> bool {
        self.header.get_bool(tags::POSS_DUP_FLAG).unwrap_or(false)
    }

    /// Returns true if the message was parsed without structural deviations.
    #[must_use]
    pub fn has_valid_structure(&self) -> bool {
        self.structure.is_none()
    }

    /// Returns the first structural deviation found while parsing.
    #[must_use]
    pub fn structure_violation(&self) -> Option<&FieldViolation> {
        self.structure.as_ref()
    }

    /// Returns true if `tag` is set in the header, body or trailer.
    #[must_use]
    pub fn is_set_anywhere(&self, tag: u32) -> bool {
        self.header.is_set(tag) || self.body.is_set(tag) || self.trailer.is_set(tag)
    }

    /// Serializes the message, recomputing BodyLength and CheckSum.
    ///
    /// # Errors
    /// [`EncodeError::MissingRequiredField`] when BeginString or MsgType is
    /// absent.
    pub fn to_bytes(&self) -> Result<Bytes, EncodeError> {
        let begin_string = self
            .header
            .get(tags::BEGIN_STRING)
            .ok_or(EncodeError::MissingRequiredField {
                tag: tags::BEGIN_STRING,
            })?;
        if !self.header.is_set(tags::MSG_TYPE) {
            return Err(EncodeError::MissingRequiredField {
                tag: tags::MSG_TYPE,
            });
        }
        let mut encoder = Encoder::new(begin_string.bytes().clone());
        self.header.write_to(&mut encoder, &HEADER_ORDERING);
        self.body.write_to(&mut encoder, &BODY_ORDERING);
        self.trailer.write_to(&mut encoder, &TRAILER_ORDERING);
        Ok(encoder.finish())
    }

    /// Turns this message's header into the reply route of `received`.
    ///
    /// Sender and target identities are swapped, and so are the
    /// OnBehalfOf and DeliverTo identities. Location ids are swapped only for
    /// FIX.4.1 and later.
    pub fn reverse_route(&mut self, received: &FieldMap) {
        const SWAPS: [(u32, u32); 3] = [
            (tags::SENDER_COMP_ID, tags::TARGET_COMP_ID),
            (tags::SENDER_SUB_ID, tags::TARGET_SUB_ID),
            (tags::SENDER_LOCATION_ID, tags::TARGET_LOCATION_ID),
        ];
        const ROUTED: [(u32, u32); 2] = [
            (tags::ON_BEHALF_OF_COMP_ID, tags::DELIVER_TO_COMP_ID),
            (tags::ON_BEHALF_OF_SUB_ID, tags::DELIVER_TO_SUB_ID),
        ];

        let header = &mut self.header;
        header.remove(tags::BEGIN_STRING);
        for (a, b) in SWAPS.into_iter().chain(ROUTED) {
            header.remove(a);
            header.remove(b);
        }
        header.remove(tags::ON_BEHALF_OF_LOCATION_ID);
        header.remove(tags::DELIVER_TO_LOCATION_ID);

        if let Some(begin_string) = received.get(tags::BEGIN_STRING)
            && !begin_string.is_empty()
        {
            header.set(begin_string.clone());
            let version = begin_string
                .as_str()
                .ok()
                .and_then(FixVersion::from_begin_string);
            if version.is_some_and(|v| v >= FixVersion::Fix41) {
                copy_swapped(
                    received,
                    header,
                    tags::ON_BEHALF_OF_LOCATION_ID,
                    tags::DELIVER_TO_LOCATION_ID,
                );
            }
        }
        for (a, b) in SWAPS.into_iter().chain(ROUTED) {
            copy_swapped(received, header, a, b);
        }
    }
}

fn copy_swapped(from: &FieldMap, to: &mut FieldMap, a: u32, b: u32) {
    if let Some(value) = from.get(a) {
        to.set_field(b, value.bytes().clone());
    }
    if let Some(value) = from.get(b) {
        to.set_field(a, value.bytes().clone());
    }
}

impl fmt::Display for Message {
    /// Renders the wire form with SOH shown as `|`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bytes() {
            Ok(bytes) => {
                let printable: Vec<u8> = bytes
                    .iter()
                    .map(|&b| if b == SOH { b'|' } else { b })
                    .collect();
                f.write_str(&String::from_utf8_lossy(&printable))
            }
            Err(err) => write!(f, "<unencodable message: {err}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Group;

    fn logon() -> Message {
        let mut message = Message::with_type(&MsgType::Logon);
        let header = message.header_mut();
        header.set_str(tags::BEGIN_STRING, "FIX.4.4");
        header.set_str(tags::SENDER_COMP_ID, "CLIENT");
        header.set_str(tags::TARGET_COMP_ID, "SERVER");
        header.set_u64(tags::MSG_SEQ_NUM, 1);
        header.set_str(tags::SENDING_TIME, "20240315-13:45:01.000");
        message.body_mut().set_u64(tags::ENCRYPT_METHOD, 0);
        message.body_mut().set_u64(tags::HEART_BT_INT, 30);
        message
    }

    #[test]
    fn test_to_bytes_leads_with_standard_prefix() {
        let bytes = logon().to_bytes().unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("8=FIX.4.4\x019="));
        assert!(text.contains("\x0135=A\x0149=CLIENT\x01"));
        assert!(text.ends_with('\x01'));
        assert_eq!(&text[text.len() - 7..text.len() - 4], "10=");
    }

    #[test]
    fn test_to_bytes_requires_begin_string_and_msg_type() {
        let mut message = Message::new();
        assert_eq!(
            message.to_bytes(),
            Err(EncodeError::MissingRequiredField { tag: 8 })
        );
        message.header_mut().set_str(tags::BEGIN_STRING, "FIX.4.2");
        assert_eq!(
            message.to_bytes(),
            Err(EncodeError::MissingRequiredField { tag: 35 })
        );
    }

    #[test]
    fn test_stale_length_and_checksum_are_recomputed() {
        let mut message = logon();
        message.header_mut().set_str(tags::BODY_LENGTH, "999");
        message.trailer_mut().set_str(tags::CHECK_SUM, "000");
        let bytes = message.to_bytes().unwrap();
        let parsed = Message::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_parse_then_serialize_is_identity() {
        let bytes = logon().to_bytes().unwrap();
        let parsed = Message::from_bytes(&bytes).unwrap();
        assert!(parsed.has_valid_structure());
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
        assert_eq!(parsed.seq_num().unwrap(), 1);
        assert!(parsed.is_admin());
    }

    #[test]
    fn test_group_serializes_with_count() {
        let mut message = logon();
        for id in ["A", "B"] {
            let mut hop = Group::new(tags::NO_HOPS, tags::HOP_COMP_ID);
            hop.set_str(tags::HOP_COMP_ID, id);
            message.header_mut().add_group(hop);
        }
        let text = message.to_string();
        assert!(text.contains("|627=2|628=A|628=B|"));
    }

    #[test]
    fn test_reverse_route_swaps_identities() {
        let received = logon();
        let mut reply = Message::with_type(&MsgType::Heartbeat);
        reply.header_mut().set_str(tags::ON_BEHALF_OF_COMP_ID, "STALE");
        let mut header = received.header().clone();
        header.set_str(tags::ON_BEHALF_OF_COMP_ID, "CUSTOMER");
        header.set_str(tags::ON_BEHALF_OF_LOCATION_ID, "NY");
        reply.reverse_route(&header);

        let h = reply.header();
        assert_eq!(h.get_str(tags::SENDER_COMP_ID).unwrap(), "SERVER");
        assert_eq!(h.get_str(tags::TARGET_COMP_ID).unwrap(), "CLIENT");
        assert_eq!(h.get_str(tags::DELIVER_TO_COMP_ID).unwrap(), "CUSTOMER");
        assert_eq!(h.get_str(tags::DELIVER_TO_LOCATION_ID).unwrap(), "NY");
        assert!(!h.is_set(tags::ON_BEHALF_OF_COMP_ID));
        assert_eq!(h.get_str(tags::BEGIN_STRING).unwrap(), "FIX.4.4");
    }

    #[test]
    fn test_poss_dup_defaults_false() {
        let mut message = logon();
        assert!(!message.is_poss_dup());
        message.header_mut().set_bool(tags::POSS_DUP_FLAG, true);
        assert!(message.is_poss_dup());
    }
}
