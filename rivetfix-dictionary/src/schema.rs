/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Schema definitions for FIX dictionaries.
//!
//! This module defines the structures that describe a FIX protocol version:
//! - [`FieldDef`]: Field definitions with tag, name, type and enumerated values
//! - [`Member`]: An ordered entry of a message, component or group
//! - [`MessageDef`]: Message definitions
//! - [`ComponentDef`]: Reusable component definitions
//! - [`GroupDef`]: Repeating group definitions
//! - [`Dictionary`]: Complete FIX version dictionary
//!
//! Members keep their declaration order, which becomes the serialization and
//! validation order of repeating groups.

use rivetfix_core::field::FieldKind;
use rivetfix_core::types::FixVersion;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// FIX field data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Integer value.
    Int,
    /// Length field (for data fields).
    Length,
    /// Sequence number.
    SeqNum,
    /// Number of entries in a repeating group.
    NumInGroup,
    /// Tag number reference.
    TagNum,
    /// Day of month (1-31).
    DayOfMonth,
    /// Floating point number.
    Float,
    /// Quantity.
    Qty,
    /// Price.
    Price,
    /// Price offset.
    PriceOffset,
    /// Amount (price * quantity).
    Amt,
    /// Percentage.
    Percentage,
    /// Single character.
    Char,
    /// Boolean (Y/N).
    Boolean,
    /// String.
    String,
    /// Multiple character value (space-separated).
    MultipleCharValue,
    /// Multiple string value (space-separated).
    MultipleStringValue,
    /// Country code (ISO 3166).
    Country,
    /// Currency code (ISO 4217).
    Currency,
    /// Exchange code (ISO 10383 MIC).
    Exchange,
    /// Month-year (YYYYMM or YYYYMMDD or YYYYMMWW).
    MonthYear,
    /// UTC timestamp.
    UtcTimestamp,
    /// UTC time only.
    UtcTimeOnly,
    /// UTC date only.
    UtcDateOnly,
    /// Local market date.
    LocalMktDate,
    /// Raw data (binary).
    Data,
    /// XML data.
    XmlData,
}

impl FieldType {
    /// Returns the value kind used for format checks.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Int
            | Self::Length
            | Self::SeqNum
            | Self::NumInGroup
            | Self::TagNum
            | Self::DayOfMonth => FieldKind::Int,
            Self::Float
            | Self::Qty
            | Self::Price
            | Self::PriceOffset
            | Self::Amt
            | Self::Percentage => FieldKind::Decimal,
            Self::Char => FieldKind::Char,
            Self::Boolean => FieldKind::Boolean,
            Self::UtcTimestamp => FieldKind::UtcTimestamp,
            Self::UtcTimeOnly => FieldKind::UtcTimeOnly,
            Self::UtcDateOnly => FieldKind::UtcDateOnly,
            Self::Data | Self::XmlData => FieldKind::Data,
            Self::String
            | Self::MultipleCharValue
            | Self::MultipleStringValue
            | Self::Country
            | Self::Currency
            | Self::Exchange
            | Self::MonthYear
            | Self::LocalMktDate => FieldKind::String,
        }
    }

    /// Returns true if values hold several space-separated enumerated items.
    #[must_use]
    pub const fn is_multiple_value(&self) -> bool {
        matches!(self, Self::MultipleCharValue | Self::MultipleStringValue)
    }
}

impl std::str::FromStr for FieldType {
    type Err = std::convert::Infallible;

    /// Reads a type name as written in QuickFIX-style dictionaries.
    ///
    /// Unknown names read as [`FieldType::String`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_uppercase().as_str() {
            "INT" => Self::Int,
            "LENGTH" => Self::Length,
            "SEQNUM" => Self::SeqNum,
            "NUMINGROUP" => Self::NumInGroup,
            "TAGNUM" => Self::TagNum,
            "DAYOFMONTH" => Self::DayOfMonth,
            "FLOAT" => Self::Float,
            "QTY" | "QUANTITY" => Self::Qty,
            "PRICE" => Self::Price,
            "PRICEOFFSET" => Self::PriceOffset,
            "AMT" | "AMOUNT" => Self::Amt,
            "PERCENTAGE" => Self::Percentage,
            "CHAR" => Self::Char,
            "BOOLEAN" => Self::Boolean,
            "MULTIPLECHARVALUE" => Self::MultipleCharValue,
            "MULTIPLESTRINGVALUE" | "MULTIPLEVALUESTRING" => Self::MultipleStringValue,
            "COUNTRY" => Self::Country,
            "CURRENCY" => Self::Currency,
            "EXCHANGE" => Self::Exchange,
            "MONTHYEAR" => Self::MonthYear,
            "UTCTIMESTAMP" => Self::UtcTimestamp,
            "UTCTIMEONLY" => Self::UtcTimeOnly,
            "UTCDATEONLY" | "UTCDATE" => Self::UtcDateOnly,
            "LOCALMKTDATE" => Self::LocalMktDate,
            "DATA" => Self::Data,
            "XMLDATA" => Self::XmlData,
            _ => Self::String,
        })
    }
}

/// Definition of a FIX field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field tag number.
    pub tag: u32,
    /// Field name.
    pub name: String,
    /// Field data type.
    pub field_type: FieldType,
    /// Enumerated values and their descriptions. Empty means any value.
    pub values: HashMap<String, String>,
}

impl FieldDef {
    /// Creates a new field definition.
    ///
    /// # Arguments
    /// * `tag` - The field tag number
    /// * `name` - The field name
    /// * `field_type` - The field data type
    #[must_use]
    pub fn new(tag: u32, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            tag,
            name: name.into(),
            field_type,
            values: HashMap::new(),
        }
    }

    /// Adds enumerated values, each with a description.
    #[must_use]
    pub fn with_values<'a>(mut self, values: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.values.extend(
            values
                .into_iter()
                .map(|(value, description)| (value.to_string(), description.to_string())),
        );
        self
    }
}

/// Reference to a field within a message, component or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    /// Field tag number.
    pub tag: u32,
    /// Whether the field is required.
    pub required: bool,
}

/// One ordered entry of a message, component or group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Member {
    /// A field.
    Field(FieldRef),
    /// A repeating group.
    Group(GroupDef),
    /// A named component, expanded in place.
    Component {
        /// Component name.
        name: String,
        /// Whether the component's required members are required here.
        required: bool,
    },
}

impl Member {
    /// A field member.
    #[must_use]
    pub const fn field(tag: u32, required: bool) -> Self {
        Self::Field(FieldRef { tag, required })
    }

    /// A component member.
    #[must_use]
    pub fn component(name: impl Into<String>, required: bool) -> Self {
        Self::Component {
            name: name.into(),
            required,
        }
    }
}

/// Definition of a repeating group.
///
/// The first member, after component expansion, is the group delimiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDef {
    /// Tag of the count field (NumInGroup).
    pub count_tag: u32,
    /// Whether the group is required.
    pub required: bool,
    /// Members of each group entry, in order.
    pub members: Vec<Member>,
}

impl GroupDef {
    /// Creates a group with no members.
    #[must_use]
    pub fn new(count_tag: u32, required: bool) -> Self {
        Self {
            count_tag,
            required,
            members: Vec::new(),
        }
    }

    /// Appends a member.
    #[must_use]
    pub fn with(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }
}

/// Definition of a reusable component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDef {
    /// Component name.
    pub name: String,
    /// Members, in order.
    pub members: Vec<Member>,
}

/// Message category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageCategory {
    /// Administrative message (session level).
    Admin,
    /// Application message.
    App,
}

/// Definition of a FIX message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDef {
    /// Message type value (tag 35).
    pub msg_type: String,
    /// Message name.
    pub name: String,
    /// Message category (admin or app).
    pub category: MessageCategory,
    /// Body members, in order.
    pub members: Vec<Member>,
}

impl MessageDef {
    /// Creates a message with no members.
    #[must_use]
    pub fn new(
        msg_type: impl Into<String>,
        name: impl Into<String>,
        category: MessageCategory,
    ) -> Self {
        Self {
            msg_type: msg_type.into(),
            name: name.into(),
            category,
            members: Vec::new(),
        }
    }

    /// Appends a member.
    #[must_use]
    pub fn with(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }
}

/// Complete FIX dictionary for a specific version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dictionary {
    /// FIX version.
    pub version: FixVersion,
    /// Field definitions indexed by tag.
    pub fields: HashMap<u32, FieldDef>,
    /// Field tags indexed by name.
    pub fields_by_name: HashMap<String, u32>,
    /// Message definitions indexed by msg_type.
    pub messages: HashMap<String, MessageDef>,
    /// Component definitions indexed by name.
    pub components: HashMap<String, ComponentDef>,
    /// Header members.
    pub header: Vec<Member>,
    /// Trailer members.
    pub trailer: Vec<Member>,
}

impl Dictionary {
    /// Creates a new empty dictionary for the specified version.
    #[must_use]
    pub fn new(version: FixVersion) -> Self {
        Self {
            version,
            fields: HashMap::new(),
            fields_by_name: HashMap::new(),
            messages: HashMap::new(),
            components: HashMap::new(),
            header: Vec::new(),
            trailer: Vec::new(),
        }
    }

    /// Adds a field definition.
    pub fn add_field(&mut self, field: FieldDef) {
        self.fields_by_name.insert(field.name.clone(), field.tag);
        self.fields.insert(field.tag, field);
    }

    /// Adds a message definition.
    pub fn add_message(&mut self, message: MessageDef) {
        self.messages.insert(message.msg_type.clone(), message);
    }

    /// Adds a component definition.
    pub fn add_component(&mut self, component: ComponentDef) {
        self.components.insert(component.name.clone(), component);
    }

    /// Gets a field definition by tag.
    #[must_use]
    pub fn get_field(&self, tag: u32) -> Option<&FieldDef> {
        self.fields.get(&tag)
    }

    /// Gets a field definition by name.
    #[must_use]
    pub fn get_field_by_name(&self, name: &str) -> Option<&FieldDef> {
        self.fields_by_name
            .get(name)
            .and_then(|tag| self.fields.get(tag))
    }

    /// Gets a message definition by type.
    #[must_use]
    pub fn get_message(&self, msg_type: &str) -> Option<&MessageDef> {
        self.messages.get(msg_type)
    }

    /// Gets a component definition by name.
    #[must_use]
    pub fn get_component(&self, name: &str) -> Option<&ComponentDef> {
        self.components.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_from_str() {
        assert_eq!("INT".parse::<FieldType>().unwrap(), FieldType::Int);
        assert_eq!(
            "UTCTIMESTAMP".parse::<FieldType>().unwrap(),
            FieldType::UtcTimestamp
        );
        assert_eq!("unknown".parse::<FieldType>().unwrap(), FieldType::String);
    }

    #[test]
    fn test_field_type_kind() {
        assert_eq!(FieldType::SeqNum.kind(), FieldKind::Int);
        assert_eq!(FieldType::Price.kind(), FieldKind::Decimal);
        assert_eq!(FieldType::XmlData.kind(), FieldKind::Data);
        assert_eq!(FieldType::Currency.kind(), FieldKind::String);
        assert!(FieldType::MultipleCharValue.is_multiple_value());
    }

    #[test]
    fn test_dictionary_lookup() {
        let mut dict = Dictionary::new(FixVersion::Fix44);
        dict.add_field(
            FieldDef::new(54, "Side", FieldType::Char).with_values([("1", "BUY"), ("2", "SELL")]),
        );
        assert_eq!(dict.get_field(54).unwrap().values.len(), 2);
        assert_eq!(dict.get_field_by_name("Side").unwrap().tag, 54);
        assert!(dict.get_field(999).is_none());
    }
}
