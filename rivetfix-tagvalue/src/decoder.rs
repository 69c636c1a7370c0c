/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX message decoder.
//!
//! Parsing is recursive descent over three sections:
//!
//! 1. The header: BeginString, BodyLength and MsgType must come first in that
//!    order, then every header field up to the first non-header tag.
//! 2. The body: everything up to the first trailer tag. Count tags known to
//!    the application schema open repeating groups, which are parsed
//!    recursively. A field a group does not know ends the group and is handed
//!    back to the enclosing container.
//! 3. The trailer.
//!
//! Recoverable deviations (header fields in the body, duplicated tags,
//! reordered group members) do not abort parsing. The first one is kept on
//! the message as its structure violation. Unreadable input is a
//! [`DecodeError`].

use crate::checksum::{calculate_checksum, parse_checksum};
use crate::encoder::SOH;
use crate::field::Field;
use crate::field_map::FieldMap;
use crate::group::{Group, GroupSchema};
use crate::message::Message;
use crate::schema::{
    ParseSchema, data_length_tag, is_standard_data_field, is_standard_header_field,
    is_standard_trailer_field, standard_header_group,
};
use bytes::Bytes;
use memchr::memchr;
use rivetfix_core::error::{DecodeError, FieldViolation};
use rivetfix_core::field::parse_u64;
use rivetfix_core::reject::SessionRejectReason;
use rivetfix_core::tags;

/// Equals sign between tag and value.
pub const EQUALS: u8 = b'=';

/// Schema-driven FIX message decoder.
///
/// # Example
/// ```
/// use rivetfix_tagvalue::Decoder;
///
/// let raw = b"8=FIX.4.4\x019=5\x0135=0\x0110=163\x01";
/// let message = Decoder::new().decode(raw).unwrap();
/// assert_eq!(message.msg_type_str().unwrap(), "0");
/// ```
#[derive(Clone, Copy)]
pub struct Decoder<'s> {
    session: Option<&'s dyn ParseSchema>,
    application: Option<&'s dyn ParseSchema>,
    validate: bool,
}

impl<'s> Decoder<'s> {
    /// Creates a decoder that knows only the standard header and trailer and
    /// verifies BodyLength and CheckSum.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session: None,
            application: None,
            validate: true,
        }
    }

    /// Uses `schema` for header and trailer layout.
    #[must_use]
    pub fn with_session_schema(mut self, schema: &'s dyn ParseSchema) -> Self {
        self.session = Some(schema);
        self
    }

    /// Uses `schema` for body layout.
    #[must_use]
    pub fn with_app_schema(mut self, schema: &'s dyn ParseSchema) -> Self {
        self.application = Some(schema);
        self
    }

    /// Enables or disables strict framing checks.
    ///
    /// When enabled, BodyLength and CheckSum are verified and a misplaced
    /// BeginString, BodyLength or MsgType is an error. When disabled, a
    /// misplaced prefix field is recorded as a structure violation.
    #[must_use]
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Decodes one complete message.
    ///
    /// # Errors
    /// Returns a [`DecodeError`] when the input is structurally unreadable.
    pub fn decode(&self, input: &[u8]) -> Result<Message, DecodeError> {
        self.decode_bytes(Bytes::copy_from_slice(input))
    }

    /// Decodes one complete message without copying field values.
    ///
    /// # Errors
    /// Returns a [`DecodeError`] when the input is structurally unreadable.
    pub fn decode_bytes(&self, input: Bytes) -> Result<Message, DecodeError> {
        Parser {
            decoder: *self,
            cursor: Cursor {
                input,
                offset: 0,
                pending: None,
            },
            msg_type: String::new(),
            structure: None,
            body_start: None,
            checksum_start: None,
        }
        .parse()
    }
}

impl Default for Decoder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Decoder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("session_schema", &self.session.is_some())
            .field("app_schema", &self.application.is_some())
            .field("validate", &self.validate)
            .finish()
    }
}

/// Returns the raw MsgType of a framed message without parsing it.
#[must_use]
pub fn peek_msg_type(input: &[u8]) -> Option<&[u8]> {
    let start = if input.starts_with(b"35=") {
        3
    } else {
        memchr::memmem::find(input, b"\x0135=")? + 4
    };
    let len = memchr(SOH, &input[start..])?;
    Some(&input[start..start + len])
}

struct RawField {
    tag: u32,
    value: Bytes,
    start: usize,
}

struct Cursor {
    input: Bytes,
    offset: usize,
    pending: Option<RawField>,
}

impl Cursor {
    fn push_back(&mut self, field: RawField) {
        self.pending = Some(field);
    }

    fn read_tag(&mut self) -> Result<Option<(u32, usize)>, DecodeError> {
        let start = self.offset;
        if start >= self.input.len() {
            return Ok(None);
        }
        let rest = &self.input[start..];
        let eq = memchr(EQUALS, rest).ok_or(DecodeError::MissingEquals { offset: start })?;
        let tag = parse_tag(&rest[..eq]).ok_or_else(|| {
            DecodeError::InvalidTag(String::from_utf8_lossy(&rest[..eq]).into_owned())
        })?;
        self.offset = start + eq + 1;
        Ok(Some((tag, start)))
    }

    fn read_value(&mut self, tag: u32, length: Option<usize>) -> Result<Bytes, DecodeError> {
        let start = self.offset;
        let end = match length {
            Some(length) => {
                let end = start + length;
                if self.input.get(end) != Some(&SOH) {
                    return Err(DecodeError::DataLengthOverrun { tag, length });
                }
                end
            }
            None => {
                start
                    + memchr(SOH, &self.input[start..])
                        .ok_or(DecodeError::MissingDelimiter { tag })?
            }
        };
        self.offset = end + 1;
        Ok(self.input.slice(start..end))
    }
}

struct Parser<'s> {
    decoder: Decoder<'s>,
    cursor: Cursor,
    msg_type: String,
    structure: Option<FieldViolation>,
    body_start: Option<usize>,
    checksum_start: Option<usize>,
}

impl<'s> Parser<'s> {
    fn parse(mut self) -> Result<Message, DecodeError> {
        let mut header = FieldMap::new();
        let mut body = FieldMap::new();
        let mut trailer = FieldMap::new();

        self.parse_header(&mut header)?;
        self.parse_body(&mut header, &mut body)?;
        self.parse_trailer(&mut body, &mut trailer)?;
        if self.decoder.validate {
            self.verify_framing(&header, &trailer)?;
        }
        Ok(Message::from_parts(header, body, trailer, self.structure))
    }

    fn record(&mut self, reason: SessionRejectReason, tag: u32) {
        if self.structure.is_none() {
            self.structure = Some(FieldViolation::new(reason, tag));
        }
    }

    fn is_header_field(&self, tag: u32) -> bool {
        is_standard_header_field(tag)
            || self.decoder.session.is_some_and(|s| s.is_header_field(tag))
    }

    fn is_trailer_field(&self, tag: u32) -> bool {
        is_standard_trailer_field(tag)
            || self.decoder.session.is_some_and(|s| s.is_trailer_field(tag))
    }

    fn is_data_field(&self, tag: u32) -> bool {
        is_standard_data_field(tag)
            || self.decoder.session.is_some_and(|s| s.is_data_field(tag))
            || self.decoder.application.is_some_and(|s| s.is_data_field(tag))
    }

    fn header_group(&self, tag: u32) -> Option<&'s GroupSchema> {
        self.decoder
            .session
            .and_then(|s| s.header_group(tag))
            .or_else(|| standard_header_group(tag))
    }

    fn body_group(&self, tag: u32) -> Option<&'s GroupSchema> {
        self.decoder
            .application
            .and_then(|s| s.group(&self.msg_type, tag))
    }

    fn check_group_order(&self) -> bool {
        self.decoder
            .application
            .or(self.decoder.session)
            .is_none_or(|s| s.check_unordered_group_fields())
    }

    /// Reads the next field, sizing data fields from their length field in
    /// `container`.
    fn extract(&mut self, container: &FieldMap) -> Result<Option<RawField>, DecodeError> {
        if let Some(field) = self.cursor.pending.take() {
            return Ok(Some(field));
        }
        let Some((tag, start)) = self.cursor.read_tag()? else {
            return Ok(None);
        };
        let length = if self.is_data_field(tag) {
            let length_tag = data_length_tag(tag);
            let length = container
                .get_all(length_tag)
                .last()
                .and_then(|f| parse_u64(length_tag, f.value()).ok())
                .and_then(|n| usize::try_from(n).ok())
                .ok_or(DecodeError::MissingDataLength { tag, length_tag })?;
            Some(length)
        } else {
            None
        };
        let value = self.cursor.read_value(tag, length)?;
        Ok(Some(RawField { tag, value, start }))
    }

    /// Adds a field. A repeated tag is kept next to the earlier one, since
    /// without a group schema it may be a member of a repeating group.
    fn store(&mut self, container: &mut FieldMap, field: RawField) {
        let field_value = Field::new(field.tag, field.value);
        if container.is_set(field.tag) {
            self.record(SessionRejectReason::TagAppearsMoreThanOnce, field.tag);
            container.append(field_value);
        } else {
            container.set(field_value);
        }
    }

    fn parse_header(&mut self, header: &mut FieldMap) -> Result<(), DecodeError> {
        for expected in [tags::BEGIN_STRING, tags::BODY_LENGTH, tags::MSG_TYPE] {
            match self.extract(header)? {
                Some(field) if field.tag == expected => {
                    if expected == tags::BODY_LENGTH {
                        self.body_start = Some(self.cursor.offset);
                    }
                    self.store_header_field(header, field)?;
                }
                other => {
                    let tag = other.as_ref().map_or(expected, |f| f.tag);
                    if self.decoder.validate {
                        return Err(DecodeError::HeaderOrder { tag });
                    }
                    self.record(SessionRejectReason::TagSpecifiedOutOfRequiredOrder, tag);
                    if let Some(field) = other {
                        self.cursor.push_back(field);
                    }
                    break;
                }
            }
        }

        while let Some(field) = self.extract(header)? {
            if !self.is_header_field(field.tag) {
                self.cursor.push_back(field);
                break;
            }
            self.store_header_field(header, field)?;
        }
        Ok(())
    }

    fn store_header_field(
        &mut self,
        header: &mut FieldMap,
        field: RawField,
    ) -> Result<(), DecodeError> {
        if field.tag == tags::MSG_TYPE && self.msg_type.is_empty() {
            self.msg_type = String::from_utf8_lossy(&field.value).into_owned();
        }
        match self.header_group(field.tag) {
            Some(schema) => self.parse_group(schema, field, header),
            None => {
                self.store(header, field);
                Ok(())
            }
        }
    }

    fn parse_body(
        &mut self,
        header: &mut FieldMap,
        body: &mut FieldMap,
    ) -> Result<(), DecodeError> {
        while let Some(field) = self.extract(body)? {
            if self.is_trailer_field(field.tag) {
                self.cursor.push_back(field);
                break;
            }
            if self.is_header_field(field.tag) {
                self.record(SessionRejectReason::TagSpecifiedOutOfRequiredOrder, field.tag);
                self.store_header_field(header, field)?;
            } else if let Some(schema) = self.body_group(field.tag) {
                self.parse_group(schema, field, body)?;
            } else {
                self.store(body, field);
            }
        }
        Ok(())
    }

    fn parse_trailer(
        &mut self,
        body: &mut FieldMap,
        trailer: &mut FieldMap,
    ) -> Result<(), DecodeError> {
        let mut seen_checksum = false;
        while let Some(field) = self.extract(trailer)? {
            let in_place = !seen_checksum && self.is_trailer_field(field.tag);
            if in_place && field.tag == tags::CHECK_SUM {
                seen_checksum = true;
                self.checksum_start = Some(field.start);
            }
            if in_place {
                self.store(trailer, field);
            } else {
                self.record(SessionRejectReason::TagSpecifiedOutOfRequiredOrder, field.tag);
                self.store(body, field);
            }
        }
        Ok(())
    }

    fn parse_group(
        &mut self,
        schema: &'s GroupSchema,
        count: RawField,
        parent: &mut FieldMap,
    ) -> Result<(), DecodeError> {
        if parent.is_set(count.tag) {
            self.record(SessionRejectReason::TagAppearsMoreThanOnce, count.tag);
        }
        let declared = match parse_u64(count.tag, &count.value) {
            Ok(n) => usize::try_from(n).unwrap_or(usize::MAX),
            Err(_) => {
                self.record(SessionRejectReason::IncorrectDataFormatForValue, count.tag);
                0
            }
        };
        let check_order = self.check_group_order();
        let mut instances = Vec::new();
        let mut current: Option<Group> = None;
        let mut previous = 0usize;

        loop {
            let container = current.as_ref().map_or(&*parent, Group::fields);
            let Some(field) = self.extract(container)? else {
                break;
            };
            let tag = field.tag;
            if tag == schema.delimiter() {
                if let Some(done) = current.take() {
                    instances.push(done);
                }
                let mut group = Group::from_schema(schema);
                group.fields_mut().set(Field::new(tag, field.value));
                current = Some(group);
                previous = 0;
                continue;
            }
            if !schema.contains(tag) {
                self.cursor.push_back(field);
                break;
            }
            let Some(group) = current.as_mut() else {
                return Err(DecodeError::MissingGroupDelimiter {
                    count_tag: schema.count_tag(),
                    delimiter: schema.delimiter(),
                    tag,
                });
            };
            if check_order && let Some(position) = schema.position(tag) {
                if position <= previous {
                    self.record(SessionRejectReason::RepeatingGroupFieldsOutOfOrder, tag);
                }
                previous = position;
            }
            match schema.group(tag) {
                Some(nested) => self.parse_group(nested, field, group.fields_mut())?,
                None => self.store(group.fields_mut(), field),
            }
        }
        if let Some(done) = current {
            instances.push(done);
        }
        parent.set_groups(count.tag, declared, instances);
        Ok(())
    }

    fn verify_framing(&self, header: &FieldMap, trailer: &FieldMap) -> Result<(), DecodeError> {
        let checksum_start = self.checksum_start.ok_or(DecodeError::InvalidChecksum)?;
        if let Some(body_start) = self.body_start {
            let declared = header
                .get_u64(tags::BODY_LENGTH)
                .ok()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or(DecodeError::InvalidBodyLength)?;
            let actual = checksum_start.saturating_sub(body_start);
            if declared != actual {
                return Err(DecodeError::BodyLengthMismatch { declared, actual });
            }
        }
        let declared = trailer
            .value(tags::CHECK_SUM)
            .and_then(parse_checksum)
            .ok_or(DecodeError::InvalidChecksum)?;
        let calculated = calculate_checksum(&self.cursor.input[..checksum_start]);
        if declared != calculated {
            return Err(DecodeError::ChecksumMismatch {
                calculated,
                declared,
            });
        }
        Ok(())
    }
}

/// Parses a tag number: up to ten ASCII digits, non-zero.
#[inline]
fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }
    let mut result: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        result = result.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }
    (result > 0).then_some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::format_checksum;

    /// Frames `fields` (with `|` standing for SOH) as a complete message.
    fn frame(begin_string: &str, fields: &str) -> Vec<u8> {
        let body = fields.replace('|', "\x01");
        let mut out = format!("8={begin_string}\x019={}\x01{body}", body.len()).into_bytes();
        let checksum = format_checksum(calculate_checksum(&out));
        out.extend_from_slice(b"10=");
        out.extend_from_slice(&checksum);
        out.push(SOH);
        out
    }

    struct OrderSchema {
        parties: GroupSchema,
    }

    impl OrderSchema {
        fn new() -> Self {
            Self {
                parties: GroupSchema::new(453, 448)
                    .with_field(447)
                    .with_field(452)
                    .with_group(GroupSchema::new(802, 523).with_field(803)),
            }
        }
    }

    impl ParseSchema for OrderSchema {
        fn is_header_field(&self, tag: u32) -> bool {
            is_standard_header_field(tag)
        }

        fn is_trailer_field(&self, tag: u32) -> bool {
            is_standard_trailer_field(tag)
        }

        fn is_data_field(&self, tag: u32) -> bool {
            is_standard_data_field(tag)
        }

        fn header_group(&self, count_tag: u32) -> Option<&GroupSchema> {
            standard_header_group(count_tag)
        }

        fn group(&self, msg_type: &str, count_tag: u32) -> Option<&GroupSchema> {
            (msg_type == "D" && count_tag == 453).then_some(&self.parties)
        }
    }

    const ORDER: &str = "35=D|49=CLIENT|56=SERVER|34=2|52=20240315-13:45:01.000|11=ORD1|\
453=2|448=BRK|447=D|452=1|802=2|523=X|803=1|523=Y|803=2|448=CLR|447=D|452=4|55=IBM|54=1|";

    #[test]
    fn test_decode_heartbeat() {
        let raw = frame("FIX.4.4", "35=0|49=A|56=B|34=7|52=20240315-13:45:01|");
        let message = Decoder::new().decode(&raw).unwrap();
        assert_eq!(message.msg_type_str().unwrap(), "0");
        assert_eq!(message.seq_num().unwrap(), 7);
        assert!(message.has_valid_structure());
        assert!(message.body().is_empty());
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut raw = frame("FIX.4.4", "35=0|34=1|");
        let len = raw.len();
        raw[len - 2] = if raw[len - 2] == b'9' { b'0' } else { raw[len - 2] + 1 };
        assert!(matches!(
            Decoder::new().decode(&raw),
            Err(DecodeError::ChecksumMismatch { .. })
        ));
        assert!(Decoder::new().with_validation(false).decode(&raw).is_ok());
    }

    #[test]
    fn test_body_length_mismatch() {
        let raw = b"8=FIX.4.4\x019=6\x0135=0\x0110=164\x01";
        assert_eq!(
            Decoder::new().decode(raw).unwrap_err(),
            DecodeError::BodyLengthMismatch {
                declared: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn test_prefix_out_of_order() {
        let raw = b"9=5\x018=FIX.4.4\x0135=0\x0110=163\x01";
        assert_eq!(
            Decoder::new().decode(raw).unwrap_err(),
            DecodeError::HeaderOrder { tag: 9 }
        );
        let message = Decoder::new().with_validation(false).decode(raw).unwrap();
        assert_eq!(
            message.structure_violation().unwrap().reason,
            SessionRejectReason::TagSpecifiedOutOfRequiredOrder
        );
        assert_eq!(message.begin_string().unwrap(), "FIX.4.4");
    }

    #[test]
    fn test_header_field_in_body_is_moved_and_flagged() {
        let raw = frame("FIX.4.2", "35=D|49=A|56=B|11=X|34=3|55=IBM|");
        let message = Decoder::new().decode(&raw).unwrap();
        let violation = message.structure_violation().unwrap();
        assert_eq!(
            violation.reason,
            SessionRejectReason::TagSpecifiedOutOfRequiredOrder
        );
        assert_eq!(violation.tag, 34);
        assert_eq!(message.seq_num().unwrap(), 3);
        assert!(!message.body().is_set(34));
        assert_eq!(message.body().get_str(55).unwrap(), "IBM");
    }

    #[test]
    fn test_duplicate_tag_flagged() {
        let raw = frame("FIX.4.4", "35=D|49=A|56=B|34=1|58=x|58=y|");
        let message = Decoder::new().decode(&raw).unwrap();
        assert_eq!(
            message.structure_violation(),
            Some(&FieldViolation::new(
                SessionRejectReason::TagAppearsMoreThanOnce,
                58
            ))
        );
    }

    #[test]
    fn test_group_without_schema_keeps_every_instance() {
        let raw = frame(
            "FIX.4.4",
            "35=D|49=A|56=B|34=1|11=G|453=2|448=BRK|452=1|448=CLR|452=4|55=IBM|",
        );
        let message = Decoder::new().decode(&raw).unwrap();
        let parties: Vec<&str> = message
            .body()
            .get_all(448)
            .map(|f| f.as_str().unwrap())
            .collect();
        assert_eq!(parties, vec!["BRK", "CLR"]);
        assert_eq!(message.body().get_str(448).unwrap(), "BRK");
        assert_eq!(message.to_bytes().unwrap(), &raw[..]);
    }

    #[test]
    fn test_repeated_data_fields_use_their_own_length() {
        let raw = frame("FIX.4.4", "35=B|34=1|95=2|96=ab|95=3|96=c|d|");
        let message = Decoder::new().decode(&raw).unwrap();
        let values: Vec<&[u8]> = message.body().get_all(96).map(Field::value).collect();
        assert_eq!(values, vec![&b"ab"[..], &b"c\x01d"[..]]);
        assert_eq!(message.to_bytes().unwrap(), &raw[..]);
    }

    #[test]
    fn test_data_field_may_contain_soh() {
        let raw = frame("FIX.4.4", "35=B|34=1|95=5|96=a|b=c|58=t|");
        let message = Decoder::new().decode(&raw).unwrap();
        assert_eq!(message.body().value(96).unwrap(), b"a\x01b=c");
        assert_eq!(message.body().get_str(58).unwrap(), "t");
        assert_eq!(message.to_bytes().unwrap(), &raw[..]);
    }

    #[test]
    fn test_data_field_without_length() {
        let raw = frame("FIX.4.4", "35=B|34=1|96=abc|");
        assert_eq!(
            Decoder::new().decode(&raw).unwrap_err(),
            DecodeError::MissingDataLength {
                tag: 96,
                length_tag: 95
            }
        );
    }

    #[test]
    fn test_nested_groups_round_trip() {
        let schema = OrderSchema::new();
        let raw = frame("FIX.4.4", ORDER);
        let message = Decoder::new()
            .with_session_schema(&schema)
            .with_app_schema(&schema)
            .decode(&raw)
            .unwrap();
        assert!(message.has_valid_structure());
        let body = message.body();
        assert_eq!(body.group_count(453), 2);
        let broker = body.group(453, 0).unwrap();
        assert_eq!(broker.group_count(802), 2);
        assert_eq!(broker.group(802, 1).unwrap().get_str(523).unwrap(), "Y");
        assert_eq!(body.group(453, 1).unwrap().get_str(448).unwrap(), "CLR");
        assert_eq!(body.get_str(55).unwrap(), "IBM");
        assert_eq!(message.to_bytes().unwrap(), &raw[..]);
    }

    #[test]
    fn test_group_field_before_delimiter() {
        let schema = OrderSchema::new();
        let raw = frame("FIX.4.4", "35=D|34=1|453=1|447=D|448=BRK|");
        let err = Decoder::new()
            .with_app_schema(&schema)
            .decode(&raw)
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingGroupDelimiter {
                count_tag: 453,
                delimiter: 448,
                tag: 447
            }
        );
    }

    #[test]
    fn test_group_members_out_of_order() {
        let schema = OrderSchema::new();
        let raw = frame("FIX.4.4", "35=D|34=1|453=1|448=BRK|452=1|447=D|55=IBM|");
        let message = Decoder::new().with_app_schema(&schema).decode(&raw).unwrap();
        assert_eq!(
            message.structure_violation(),
            Some(&FieldViolation::new(
                SessionRejectReason::RepeatingGroupFieldsOutOfOrder,
                447
            ))
        );
        assert_eq!(message.body().get_str(55).unwrap(), "IBM");
    }

    #[test]
    fn test_declared_count_is_kept() {
        let schema = OrderSchema::new();
        let raw = frame("FIX.4.4", "35=D|34=1|453=3|448=BRK|");
        let message = Decoder::new().with_app_schema(&schema).decode(&raw).unwrap();
        let entry = message
            .body()
            .entries()
            .find(|e| e.tag() == 453)
            .unwrap();
        assert!(matches!(
            entry,
            crate::field_map::Entry::Groups {
                declared: Some(3),
                ..
            }
        ));
        assert_eq!(message.body().group_count(453), 1);
    }

    #[test]
    fn test_no_hops_without_schema() {
        let raw = frame(
            "FIX.4.4",
            "35=0|49=A|56=B|34=1|627=2|628=X|629=20240315-13:45:01|628=Y|52=20240315-13:45:01|",
        );
        let message = Decoder::new().decode(&raw).unwrap();
        assert!(message.has_valid_structure());
        assert_eq!(message.header().group_count(627), 2);
        assert!(message.header().is_set(52));
        assert_eq!(message.to_bytes().unwrap(), &raw[..]);
    }

    #[test]
    fn test_stray_field_in_trailer() {
        let raw = frame("FIX.4.4", "35=0|34=1|93=2|89=ab|58=late|");
        let message = Decoder::new().decode(&raw).unwrap();
        assert_eq!(message.trailer().value(89).unwrap(), b"ab");
        assert_eq!(
            message.structure_violation(),
            Some(&FieldViolation::new(
                SessionRejectReason::TagSpecifiedOutOfRequiredOrder,
                58
            ))
        );
    }

    #[test]
    fn test_malformed_fields() {
        assert!(matches!(
            Decoder::new().decode(b"8=FIX.4.4\x019"),
            Err(DecodeError::MissingEquals { .. })
        ));
        assert!(matches!(
            Decoder::new().decode(b"8=FIX.4.4\x01x9=5\x01"),
            Err(DecodeError::InvalidTag(_))
        ));
        assert!(matches!(
            Decoder::new().decode(b"8=FIX.4.4\x019=5"),
            Err(DecodeError::MissingDelimiter { tag: 9 })
        ));
        assert!(matches!(
            Decoder::new().decode(b"8=FIX.4.4\x019=5\x0135=0\x01"),
            Err(DecodeError::InvalidChecksum)
        ));
    }

    #[test]
    fn test_peek_msg_type() {
        let raw = frame("FIX.4.4", "35=A|34=1|");
        assert_eq!(peek_msg_type(&raw), Some(&b"A"[..]));
        assert_eq!(peek_msg_type(b"8=FIX.4.4\x01"), None);
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag(b"35"), Some(35));
        assert_eq!(parse_tag(b"0"), None);
        assert_eq!(parse_tag(b""), None);
        assert_eq!(parse_tag(b"99999999999"), None);
        assert_eq!(parse_tag(b"3a"), None);
    }
}
