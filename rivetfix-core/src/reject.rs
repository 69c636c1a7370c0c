/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Reject reason codes.
//!
//! [`SessionRejectReason`] is carried in tag 373 of a Reject (35=3) and
//! [`BusinessRejectReason`] in tag 380 of a BusinessMessageReject (35=j).

use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SessionRejectReason (tag 373) values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(u32)]
pub enum SessionRejectReason {
    /// Invalid tag number.
    InvalidTagNumber = 0,
    /// Required tag missing.
    RequiredTagMissing = 1,
    /// Tag not defined for this message type.
    TagNotDefinedForMessageType = 2,
    /// Undefined tag.
    UndefinedTag = 3,
    /// Tag specified without a value.
    TagSpecifiedWithoutValue = 4,
    /// Value is incorrect (out of range) for this tag.
    ValueIsIncorrect = 5,
    /// Incorrect data format for value.
    IncorrectDataFormatForValue = 6,
    /// Decryption problem.
    DecryptionProblem = 7,
    /// Signature problem.
    SignatureProblem = 8,
    /// CompID problem.
    CompIdProblem = 9,
    /// SendingTime accuracy problem.
    SendingTimeAccuracyProblem = 10,
    /// Invalid MsgType.
    InvalidMsgType = 11,
    /// XML validation error.
    XmlValidationError = 12,
    /// Tag appears more than once.
    TagAppearsMoreThanOnce = 13,
    /// Tag specified out of required order.
    TagSpecifiedOutOfRequiredOrder = 14,
    /// Repeating group fields out of order.
    RepeatingGroupFieldsOutOfOrder = 15,
    /// Incorrect NumInGroup count for repeating group.
    IncorrectNumInGroupCount = 16,
    /// Non-data value includes field delimiter.
    NonDataValueIncludesFieldDelimiter = 17,
    /// Other.
    Other = 99,
}

impl SessionRejectReason {
    /// Returns the numeric code written to tag 373.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Returns the human-readable text written to tag 58.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::InvalidTagNumber => "Invalid tag number",
            Self::RequiredTagMissing => "Required tag missing",
            Self::TagNotDefinedForMessageType => "Tag not defined for this message type",
            Self::UndefinedTag => "Undefined Tag",
            Self::TagSpecifiedWithoutValue => "Tag specified without a value",
            Self::ValueIsIncorrect => "Value is incorrect (out of range) for this tag",
            Self::IncorrectDataFormatForValue => "Incorrect data format for value",
            Self::DecryptionProblem => "Decryption problem",
            Self::SignatureProblem => "Signature problem",
            Self::CompIdProblem => "CompID problem",
            Self::SendingTimeAccuracyProblem => "SendingTime accuracy problem",
            Self::InvalidMsgType => "Invalid MsgType",
            Self::XmlValidationError => "XML Validation error",
            Self::TagAppearsMoreThanOnce => "Tag appears more than once",
            Self::TagSpecifiedOutOfRequiredOrder => "Tag specified out of required order",
            Self::RepeatingGroupFieldsOutOfOrder => "Repeating group fields out of order",
            Self::IncorrectNumInGroupCount => "Incorrect NumInGroup count for repeating group",
            Self::NonDataValueIncludesFieldDelimiter => {
                "Non Data value includes field delimiter (SOH character)"
            }
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for SessionRejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// BusinessRejectReason (tag 380) values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(u32)]
pub enum BusinessRejectReason {
    /// Other.
    Other = 0,
    /// Unknown ID.
    UnknownId = 1,
    /// Unknown security.
    UnknownSecurity = 2,
    /// Unsupported message type.
    UnsupportedMessageType = 3,
    /// Application not available.
    ApplicationNotAvailable = 4,
    /// Conditionally required field missing.
    ConditionallyRequiredFieldMissing = 5,
    /// Not authorized.
    NotAuthorized = 6,
    /// DeliverTo firm not available at this time.
    DeliverToFirmNotAvailable = 7,
}

impl BusinessRejectReason {
    /// Returns the numeric code written to tag 380.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Returns the human-readable text written to tag 58.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Other => "Other",
            Self::UnknownId => "Unknown ID",
            Self::UnknownSecurity => "Unknown Security",
            Self::UnsupportedMessageType => "Unsupported Message Type",
            Self::ApplicationNotAvailable => "Application not available",
            Self::ConditionallyRequiredFieldMissing => "Conditionally required field missing",
            Self::NotAuthorized => "Not authorized",
            Self::DeliverToFirmNotAvailable => "DeliverToFirm not available at this time",
        }
    }
}

impl fmt::Display for BusinessRejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn test_session_reject_codes() {
        assert_eq!(SessionRejectReason::CompIdProblem.code(), 9);
        assert_eq!(SessionRejectReason::SendingTimeAccuracyProblem.code(), 10);
        assert_eq!(SessionRejectReason::Other.code(), 99);
        assert_eq!(
            SessionRejectReason::from_u32(16),
            Some(SessionRejectReason::IncorrectNumInGroupCount)
        );
        assert_eq!(SessionRejectReason::from_u32(42), None);
    }

    #[test]
    fn test_business_reject_text() {
        assert_eq!(BusinessRejectReason::UnsupportedMessageType.code(), 3);
        assert_eq!(
            BusinessRejectReason::ApplicationNotAvailable.to_string(),
            "Application not available"
        );
    }
}
