/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Compiled data dictionary.
//!
//! [`DataDictionary::compile`] expands components, derives repeating-group
//! layouts and indexes every message. The result serves two purposes:
//! - the decoder consults it through [`ParseSchema`] to classify tags and
//!   find group boundaries
//! - [`DataDictionary::validate`] checks a decoded message and reports the
//!   first violation with its session reject reason

use crate::schema::{Dictionary, FieldType, GroupDef, Member};
use rivetfix_core::error::FieldViolation;
use rivetfix_core::field::{FieldKind, parse_u64};
use rivetfix_core::reject::SessionRejectReason;
use rivetfix_core::tags;
use rivetfix_core::types::FixVersion;
use rivetfix_tagvalue::{Entry, Field, FieldMap, GroupSchema, Message, ParseSchema};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors raised while compiling a [`Dictionary`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DictionaryError {
    /// A member names a component that is not defined.
    #[error("component {name} is not defined")]
    UnknownComponent {
        /// Component name.
        name: String,
    },

    /// A member references a tag with no field definition.
    #[error("field {tag} is referenced but not defined")]
    UndefinedField {
        /// Referenced tag.
        tag: u32,
    },

    /// A repeating group has no members.
    #[error("group {count_tag} has no members")]
    EmptyGroup {
        /// Group count tag.
        count_tag: u32,
    },

    /// A component includes itself, directly or indirectly.
    #[error("component {name} includes itself")]
    RecursiveComponent {
        /// Component name.
        name: String,
    },
}

/// Outcome of a failed message validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// BeginString does not match the session dictionary.
    #[error("unsupported version: expected {expected}, received {received}")]
    UnsupportedVersion {
        /// Dictionary BeginString.
        expected: String,
        /// Message BeginString.
        received: String,
    },

    /// A field-level violation.
    #[error("{0}")]
    Violation(#[from] FieldViolation),
}

fn violation(reason: SessionRejectReason, tag: u32) -> ValidationError {
    FieldViolation::new(reason, tag).into()
}

#[derive(Debug, Clone)]
struct CompiledField {
    field_type: FieldType,
    values: HashSet<String>,
}

#[derive(Debug, Clone, Default)]
struct Layout {
    members: HashSet<u32>,
    required: Vec<u32>,
    groups: HashMap<u32, GroupLayout>,
}

#[derive(Debug, Clone)]
struct GroupLayout {
    schema: GroupSchema,
    layout: Layout,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Trailer,
    Body,
}

enum Flat<'d> {
    Field { tag: u32, required: bool },
    Group { def: &'d GroupDef, required: bool },
}

impl Flat<'_> {
    fn tag(&self) -> u32 {
        match self {
            Self::Field { tag, .. } => *tag,
            Self::Group { def, .. } => def.count_tag,
        }
    }
}

fn flatten<'d>(
    dict: &'d Dictionary,
    members: &'d [Member],
    required: bool,
    out: &mut Vec<Flat<'d>>,
    stack: &mut Vec<&'d str>,
) -> Result<(), DictionaryError> {
    for member in members {
        match member {
            Member::Field(field) => {
                if !dict.fields.contains_key(&field.tag) {
                    return Err(DictionaryError::UndefinedField { tag: field.tag });
                }
                out.push(Flat::Field {
                    tag: field.tag,
                    required: required && field.required,
                });
            }
            Member::Group(def) => {
                if !dict.fields.contains_key(&def.count_tag) {
                    return Err(DictionaryError::UndefinedField { tag: def.count_tag });
                }
                out.push(Flat::Group {
                    def,
                    required: required && def.required,
                });
            }
            Member::Component {
                name,
                required: component_required,
            } => {
                if stack.contains(&name.as_str()) {
                    return Err(DictionaryError::RecursiveComponent { name: name.clone() });
                }
                let component = dict
                    .get_component(name)
                    .ok_or_else(|| DictionaryError::UnknownComponent { name: name.clone() })?;
                stack.push(name);
                flatten(
                    dict,
                    &component.members,
                    required && *component_required,
                    out,
                    stack,
                )?;
                stack.pop();
            }
        }
    }
    Ok(())
}

/// Compiles members into a layout, returning the member order as well.
fn compile_layout(
    dict: &Dictionary,
    members: &[Member],
) -> Result<(Layout, Vec<u32>), DictionaryError> {
    let mut flat = Vec::new();
    flatten(dict, members, true, &mut flat, &mut Vec::new())?;

    let mut layout = Layout::default();
    let mut order = Vec::with_capacity(flat.len());
    for item in &flat {
        let (tag, required) = match item {
            Flat::Field { tag, required } => (*tag, *required),
            Flat::Group { def, required } => {
                layout.groups.insert(def.count_tag, compile_group(dict, def)?);
                (def.count_tag, *required)
            }
        };
        if layout.members.insert(tag) {
            order.push(item.tag());
            if required {
                layout.required.push(tag);
            }
        }
    }
    Ok((layout, order))
}

fn compile_group(dict: &Dictionary, def: &GroupDef) -> Result<GroupLayout, DictionaryError> {
    let (layout, order) = compile_layout(dict, &def.members)?;
    let (&delimiter, rest) = order.split_first().ok_or(DictionaryError::EmptyGroup {
        count_tag: def.count_tag,
    })?;
    let schema = rest.iter().fold(
        GroupSchema::new(def.count_tag, delimiter),
        |schema, tag| match layout.groups.get(tag) {
            Some(nested) => schema.with_group(nested.schema.clone()),
            None => schema.with_field(*tag),
        },
    );
    Ok(GroupLayout { schema, layout })
}

/// A compiled, immutable data dictionary.
#[derive(Debug, Clone)]
pub struct DataDictionary {
    version: FixVersion,
    fields: HashMap<u32, CompiledField>,
    header: Layout,
    trailer: Layout,
    messages: HashMap<String, Layout>,
    check_fields_out_of_order: bool,
    allow_unknown_message_fields: bool,
    check_user_defined_fields: bool,
    check_fields_have_values: bool,
    check_unordered_group_fields: bool,
}

impl DataDictionary {
    /// Compiles a dictionary.
    ///
    /// # Errors
    /// Returns a [`DictionaryError`] for dangling references, recursive
    /// components and empty groups.
    pub fn compile(dict: &Dictionary) -> Result<Self, DictionaryError> {
        let fields = dict
            .fields
            .values()
            .map(|def| {
                (
                    def.tag,
                    CompiledField {
                        field_type: def.field_type,
                        values: def.values.keys().cloned().collect(),
                    },
                )
            })
            .collect();
        let (header, _) = compile_layout(dict, &dict.header)?;
        let (trailer, _) = compile_layout(dict, &dict.trailer)?;
        let messages = dict
            .messages
            .values()
            .map(|def| {
                compile_layout(dict, &def.members).map(|(layout, _)| (def.msg_type.clone(), layout))
            })
            .collect::<Result<_, DictionaryError>>()?;
        Ok(Self {
            version: dict.version,
            fields,
            header,
            trailer,
            messages,
            check_fields_out_of_order: true,
            allow_unknown_message_fields: false,
            check_user_defined_fields: true,
            check_fields_have_values: true,
            check_unordered_group_fields: true,
        })
    }

    /// Whether header fields found in the body make a message invalid.
    #[must_use]
    pub fn with_check_fields_out_of_order(mut self, check: bool) -> Self {
        self.check_fields_out_of_order = check;
        self
    }

    /// Whether undefined tags below 5000 are tolerated.
    #[must_use]
    pub fn with_allow_unknown_message_fields(mut self, allow: bool) -> Self {
        self.allow_unknown_message_fields = allow;
        self
    }

    /// Whether user-defined tags (5000 and up) are checked.
    #[must_use]
    pub fn with_check_user_defined_fields(mut self, check: bool) -> Self {
        self.check_user_defined_fields = check;
        self
    }

    /// Whether empty values are rejected.
    #[must_use]
    pub fn with_check_fields_have_values(mut self, check: bool) -> Self {
        self.check_fields_have_values = check;
        self
    }

    /// Whether group members must follow the declared order.
    #[must_use]
    pub fn with_check_unordered_group_fields(mut self, check: bool) -> Self {
        self.check_unordered_group_fields = check;
        self
    }

    /// Returns the FIX version of this dictionary.
    #[must_use]
    pub const fn version(&self) -> FixVersion {
        self.version
    }

    /// Returns true if `msg_type` is defined.
    #[must_use]
    pub fn is_msg_type(&self, msg_type: &str) -> bool {
        self.messages.contains_key(msg_type)
    }

    /// Returns true if `tag` is defined.
    #[must_use]
    pub fn is_field(&self, tag: u32) -> bool {
        self.fields.contains_key(&tag)
    }

    /// Returns the declared type of `tag`.
    #[must_use]
    pub fn field_type(&self, tag: u32) -> Option<FieldType> {
        self.fields.get(&tag).map(|f| f.field_type)
    }

    /// Returns true if `tag` is a body member of `msg_type`.
    #[must_use]
    pub fn is_msg_field(&self, msg_type: &str, tag: u32) -> bool {
        self.messages
            .get(msg_type)
            .is_some_and(|layout| layout.members.contains(&tag))
    }

    /// Returns true if `tag` is required in the body of `msg_type`.
    #[must_use]
    pub fn is_required_field(&self, msg_type: &str, tag: u32) -> bool {
        self.messages
            .get(msg_type)
            .is_some_and(|layout| layout.required.contains(&tag))
    }

    /// Validates a message with this dictionary as both session and
    /// application dictionary.
    ///
    /// # Errors
    /// See [`DataDictionary::validate`].
    pub fn validate_message(&self, message: &Message) -> Result<(), ValidationError> {
        Self::validate(message, Some(self), self)
    }

    /// Validates a message.
    ///
    /// The session dictionary checks header and trailer. Without one only the
    /// body is checked. Checks run in this order: BeginString, parse
    /// structure, MsgType, required fields, then per field: value present,
    /// tag defined, tag allowed in the message, value format, enumerated
    /// value, group count.
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn validate(
        message: &Message,
        session: Option<&DataDictionary>,
        application: &DataDictionary,
    ) -> Result<(), ValidationError> {
        let header = message.header();
        let begin_string = header
            .get_str(tags::BEGIN_STRING)
            .map_err(FieldViolation::from)?;
        if let Some(session) = session {
            let expected = session.version.begin_string();
            if begin_string != expected && begin_string != FixVersion::Fixt11.begin_string() {
                return Err(ValidationError::UnsupportedVersion {
                    expected: expected.to_string(),
                    received: begin_string.to_string(),
                });
            }
        }

        if let Some(issue) = message.structure_violation() {
            let out_of_order = issue.reason == SessionRejectReason::TagSpecifiedOutOfRequiredOrder;
            if !out_of_order || application.check_fields_out_of_order {
                return Err(issue.clone().into());
            }
        }

        let msg_type = message.msg_type_str().map_err(FieldViolation::from)?;
        let body = application
            .messages
            .get(msg_type)
            .ok_or_else(|| violation(SessionRejectReason::InvalidMsgType, tags::MSG_TYPE))?;

        if let Some(session) = session {
            session.check_required(&session.header, header)?;
            session.check_required(&session.trailer, message.trailer())?;
        }
        application.check_required(body, message.body())?;

        if let Some(session) = session {
            session.iterate(&session.header, header, Section::Header)?;
            session.iterate(&session.trailer, message.trailer(), Section::Trailer)?;
        }
        application.iterate(body, message.body(), Section::Body)
    }

    fn check_required(&self, layout: &Layout, map: &FieldMap) -> Result<(), ValidationError> {
        // Framing fields are computed on serialization.
        if let Some(&tag) = layout.required.iter().find(|&&tag| {
            tag != tags::BODY_LENGTH && tag != tags::CHECK_SUM && !map.is_set(tag)
        }) {
            return Err(violation(SessionRejectReason::RequiredTagMissing, tag));
        }
        for (count_tag, group) in &layout.groups {
            for instance in map.groups(*count_tag) {
                self.check_required(&group.layout, instance.fields())?;
            }
        }
        Ok(())
    }

    fn should_check_tag(&self, tag: u32) -> bool {
        if tag >= tags::USER_DEFINED_MIN {
            self.check_user_defined_fields
        } else {
            !self.allow_unknown_message_fields
        }
    }

    fn check_tag(&self, layout: &Layout, tag: u32, section: Section) -> Result<(), ValidationError> {
        if !self.should_check_tag(tag) {
            return Ok(());
        }
        if !self.fields.contains_key(&tag) {
            return Err(violation(SessionRejectReason::InvalidTagNumber, tag));
        }
        if section == Section::Body && !layout.members.contains(&tag) {
            return Err(violation(
                SessionRejectReason::TagNotDefinedForMessageType,
                tag,
            ));
        }
        Ok(())
    }

    fn check_value(&self, field: &Field) -> Result<(), ValidationError> {
        let tag = field.tag();
        let Some(def) = self.fields.get(&tag) else {
            return Ok(());
        };
        def.field_type
            .kind()
            .check(tag, field.value())
            .map_err(|err| ValidationError::from(FieldViolation::from(err)))?;
        if def.values.is_empty() || def.field_type.kind() == FieldKind::Data {
            return Ok(());
        }
        let value = field.as_str().map_err(FieldViolation::from)?;
        let known = if def.field_type.is_multiple_value() {
            value.split(' ').all(|item| def.values.contains(item))
        } else {
            def.values.contains(value)
        };
        if known {
            Ok(())
        } else {
            Err(violation(SessionRejectReason::ValueIsIncorrect, tag))
        }
    }

    fn iterate(&self, layout: &Layout, map: &FieldMap, section: Section) -> Result<(), ValidationError> {
        for entry in map.entries() {
            match entry {
                Entry::Field(field) => {
                    let tag = field.tag();
                    if field.is_empty() {
                        if self.check_fields_have_values {
                            return Err(violation(
                                SessionRejectReason::TagSpecifiedWithoutValue,
                                tag,
                            ));
                        }
                        continue;
                    }
                    self.check_tag(layout, tag, section)?;
                    self.check_value(field)?;
                    if layout.groups.contains_key(&tag)
                        && parse_u64(tag, field.value()).is_ok_and(|n| n != 0)
                    {
                        return Err(violation(SessionRejectReason::IncorrectNumInGroupCount, tag));
                    }
                }
                Entry::Groups {
                    count_tag,
                    declared,
                    instances,
                } => {
                    self.check_tag(layout, count_tag, section)?;
                    let Some(group) = layout.groups.get(&count_tag) else {
                        continue;
                    };
                    if declared.is_some_and(|n| n != instances.len()) {
                        return Err(violation(
                            SessionRejectReason::IncorrectNumInGroupCount,
                            count_tag,
                        ));
                    }
                    for instance in instances {
                        self.iterate(&group.layout, instance.fields(), Section::Body)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl ParseSchema for DataDictionary {
    fn is_header_field(&self, tag: u32) -> bool {
        self.header.members.contains(&tag)
    }

    fn is_trailer_field(&self, tag: u32) -> bool {
        self.trailer.members.contains(&tag)
    }

    fn is_data_field(&self, tag: u32) -> bool {
        self.field_type(tag)
            .is_some_and(|t| t.kind() == FieldKind::Data)
    }

    fn header_group(&self, count_tag: u32) -> Option<&GroupSchema> {
        self.header.groups.get(&count_tag).map(|g| &g.schema)
    }

    fn group(&self, msg_type: &str, count_tag: u32) -> Option<&GroupSchema> {
        self.messages
            .get(msg_type)?
            .groups
            .get(&count_tag)
            .map(|g| &g.schema)
    }

    fn check_unordered_group_fields(&self) -> bool {
        self.check_unordered_group_fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ComponentDef, FieldDef, MessageCategory, MessageDef};
    use crate::standard::session_dictionary;
    use rivetfix_tagvalue::Decoder;
    use rivetfix_tagvalue::checksum::{calculate_checksum, format_checksum};

    const HEADER: &str = "35=D|49=CLIENT|56=SERVER|34=2|52=20240315-13:45:01.000|";

    fn order_dictionary() -> Dictionary {
        let mut dict = session_dictionary(FixVersion::Fix44);
        for def in [
            FieldDef::new(11, "ClOrdID", FieldType::String),
            FieldDef::new(38, "OrderQty", FieldType::Qty),
            FieldDef::new(40, "OrdType", FieldType::Char),
            FieldDef::new(54, "Side", FieldType::Char).with_values([("1", "BUY"), ("2", "SELL")]),
            FieldDef::new(55, "Symbol", FieldType::String),
            FieldDef::new(447, "PartyIDSource", FieldType::Char),
            FieldDef::new(448, "PartyID", FieldType::String),
            FieldDef::new(452, "PartyRole", FieldType::Int),
            FieldDef::new(453, "NoPartyIDs", FieldType::NumInGroup),
            FieldDef::new(523, "PartySubID", FieldType::String),
            FieldDef::new(802, "NoPartySubIDs", FieldType::NumInGroup),
            FieldDef::new(803, "PartySubIDType", FieldType::Int),
            FieldDef::new(5001, "Custom", FieldType::String),
        ] {
            dict.add_field(def);
        }
        dict.add_component(ComponentDef {
            name: "Parties".into(),
            members: vec![Member::Group(
                GroupDef::new(453, false)
                    .with(Member::field(448, false))
                    .with(Member::field(447, false))
                    .with(Member::field(452, true))
                    .with(Member::Group(
                        GroupDef::new(802, false)
                            .with(Member::field(523, false))
                            .with(Member::field(803, false)),
                    )),
            )],
        });
        dict.add_message(
            MessageDef::new("D", "NewOrderSingle", MessageCategory::App)
                .with(Member::field(11, true))
                .with(Member::component("Parties", false))
                .with(Member::field(55, true))
                .with(Member::field(54, true))
                .with(Member::field(38, false))
                .with(Member::field(40, false)),
        );
        dict
    }

    fn compiled() -> DataDictionary {
        DataDictionary::compile(&order_dictionary()).unwrap()
    }

    fn parse(dd: &DataDictionary, begin_string: &str, fields: &str) -> Message {
        let body = fields.replace('|', "\x01");
        let mut raw = format!("8={begin_string}\x019={}\x01{body}", body.len()).into_bytes();
        let checksum = format_checksum(calculate_checksum(&raw));
        raw.extend_from_slice(b"10=");
        raw.extend_from_slice(&checksum);
        raw.push(0x01);
        Decoder::new()
            .with_session_schema(dd)
            .with_app_schema(dd)
            .decode(&raw)
            .unwrap()
    }

    fn check(dd: &DataDictionary, body: &str) -> Result<(), ValidationError> {
        let message = parse(dd, "FIX.4.4", &format!("{HEADER}{body}"));
        dd.validate_message(&message)
    }

    fn rejected(reason: SessionRejectReason, tag: u32) -> Result<(), ValidationError> {
        Err(FieldViolation::new(reason, tag).into())
    }

    #[test]
    fn test_compile_derives_group_schema() {
        let dd = compiled();
        let parties = dd.group("D", 453).unwrap();
        assert_eq!(parties.delimiter(), 448);
        assert_eq!(&parties.field_order()[..], &[448, 447, 452, 802]);
        assert_eq!(parties.group(802).unwrap().delimiter(), 523);
        assert!(dd.header_group(tags::NO_HOPS).is_some());
        assert!(dd.is_data_field(tags::RAW_DATA));
        assert!(dd.is_header_field(tags::SENDING_TIME));
        assert!(dd.is_msg_field("D", 453));
        assert!(dd.is_required_field("D", 54));
    }

    #[test]
    fn test_compile_errors() {
        let mut dict = order_dictionary();
        dict.add_message(
            MessageDef::new("X", "Broken", MessageCategory::App)
                .with(Member::component("Missing", true)),
        );
        assert_eq!(
            DataDictionary::compile(&dict).unwrap_err(),
            DictionaryError::UnknownComponent {
                name: "Missing".into()
            }
        );

        let mut dict = order_dictionary();
        dict.add_message(
            MessageDef::new("X", "Broken", MessageCategory::App).with(Member::field(9999, true)),
        );
        assert_eq!(
            DataDictionary::compile(&dict).unwrap_err(),
            DictionaryError::UndefinedField { tag: 9999 }
        );

        let mut dict = order_dictionary();
        dict.add_message(
            MessageDef::new("X", "Broken", MessageCategory::App)
                .with(Member::Group(GroupDef::new(453, false))),
        );
        assert_eq!(
            DataDictionary::compile(&dict).unwrap_err(),
            DictionaryError::EmptyGroup { count_tag: 453 }
        );

        let mut dict = order_dictionary();
        dict.add_component(ComponentDef {
            name: "Loop".into(),
            members: vec![Member::component("Loop", true)],
        });
        dict.add_message(
            MessageDef::new("X", "Broken", MessageCategory::App)
                .with(Member::component("Loop", true)),
        );
        assert_eq!(
            DataDictionary::compile(&dict).unwrap_err(),
            DictionaryError::RecursiveComponent {
                name: "Loop".into()
            }
        );
    }

    #[test]
    fn test_valid_order() {
        let dd = compiled();
        assert_eq!(
            check(
                &dd,
                "11=A|453=1|448=BRK|452=1|802=1|523=X|803=2|55=IBM|54=1|38=100|"
            ),
            Ok(())
        );
    }

    #[test]
    fn test_required_fields() {
        let dd = compiled();
        assert_eq!(
            check(&dd, "11=A|55=IBM|"),
            rejected(SessionRejectReason::RequiredTagMissing, 54)
        );
        assert_eq!(
            check(&dd, "11=A|453=1|448=BRK|55=IBM|54=1|"),
            rejected(SessionRejectReason::RequiredTagMissing, 452)
        );
        let message = parse(
            &dd,
            "FIX.4.4",
            "35=D|49=CLIENT|56=SERVER|34=2|11=A|55=IBM|54=1|",
        );
        assert_eq!(
            dd.validate_message(&message),
            rejected(SessionRejectReason::RequiredTagMissing, tags::SENDING_TIME)
        );
    }

    #[test]
    fn test_invalid_msg_type() {
        let dd = compiled();
        let message = parse(
            &dd,
            "FIX.4.4",
            "35=ZZ|49=CLIENT|56=SERVER|34=2|52=20240315-13:45:01.000|",
        );
        assert_eq!(
            dd.validate_message(&message),
            rejected(SessionRejectReason::InvalidMsgType, tags::MSG_TYPE)
        );
    }

    #[test]
    fn test_enumerated_values() {
        let dd = compiled();
        assert_eq!(
            check(&dd, "11=A|55=IBM|54=9|"),
            rejected(SessionRejectReason::ValueIsIncorrect, 54)
        );
        // No enumerated values declared: anything goes.
        assert_eq!(check(&dd, "11=A|55=IBM|54=1|40=Z|"), Ok(()));
    }

    #[test]
    fn test_data_format() {
        let dd = compiled();
        assert_eq!(
            check(&dd, "11=A|55=IBM|54=1|38=abc|"),
            rejected(SessionRejectReason::IncorrectDataFormatForValue, 38)
        );
    }

    #[test]
    fn test_tag_not_in_message() {
        let dd = compiled();
        assert_eq!(
            check(&dd, "11=A|55=IBM|54=1|58=hello|"),
            rejected(SessionRejectReason::TagNotDefinedForMessageType, 58)
        );
        let lenient = compiled().with_allow_unknown_message_fields(true);
        assert_eq!(check(&lenient, "11=A|55=IBM|54=1|58=hello|"), Ok(()));
    }

    #[test]
    fn test_undefined_and_user_defined_tags() {
        let dd = compiled();
        assert_eq!(
            check(&dd, "11=A|55=IBM|54=1|4999=x|"),
            rejected(SessionRejectReason::InvalidTagNumber, 4999)
        );
        assert_eq!(
            check(&dd, "11=A|55=IBM|54=1|5002=x|"),
            rejected(SessionRejectReason::InvalidTagNumber, 5002)
        );
        let lenient = compiled().with_check_user_defined_fields(false);
        assert_eq!(check(&lenient, "11=A|55=IBM|54=1|5002=x|"), Ok(()));
    }

    #[test]
    fn test_group_count_mismatch() {
        let dd = compiled();
        assert_eq!(
            check(&dd, "11=A|453=2|448=BRK|452=1|55=IBM|54=1|"),
            rejected(SessionRejectReason::IncorrectNumInGroupCount, 453)
        );
    }

    #[test]
    fn test_empty_value() {
        let dd = compiled();
        assert_eq!(
            check(&dd, "11=A|55=|54=1|"),
            rejected(SessionRejectReason::TagSpecifiedWithoutValue, 55)
        );
    }

    #[test]
    fn test_unsupported_version() {
        let dd = compiled();
        let message = parse(&dd, "FIX.4.2", &format!("{HEADER}11=A|55=IBM|54=1|"));
        assert_eq!(
            dd.validate_message(&message),
            Err(ValidationError::UnsupportedVersion {
                expected: "FIX.4.4".into(),
                received: "FIX.4.2".into()
            })
        );
    }

    #[test]
    fn test_out_of_order_header_field() {
        let raw = "35=D|49=CLIENT|56=SERVER|52=20240315-13:45:01.000|11=A|34=2|55=IBM|54=1|";
        let dd = compiled();
        let message = parse(&dd, "FIX.4.4", raw);
        assert_eq!(
            dd.validate_message(&message),
            rejected(SessionRejectReason::TagSpecifiedOutOfRequiredOrder, 34)
        );
        let lenient = compiled().with_check_fields_out_of_order(false);
        let message = parse(&lenient, "FIX.4.4", raw);
        assert_eq!(lenient.validate_message(&message), Ok(()));
    }

    #[test]
    fn test_body_only_validation() {
        let dd = compiled();
        let message = parse(&dd, "FIX.4.4", "35=D|34=2|11=A|55=IBM|54=1|");
        assert_eq!(DataDictionary::validate(&message, None, &dd), Ok(()));
    }
}
