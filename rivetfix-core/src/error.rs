/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Error types for the RivetFix session engine.
//!
//! The hierarchy follows the way failures are handled by a session:
//! - [`DecodeError`]: structural problems that make a message unreadable
//! - [`FieldError`]: a missing field or a value that does not convert
//! - [`FieldViolation`]: a recoverable violation carrying a reject reason code
//! - [`SessionError`]: protocol and lifecycle failures of a session
//! - [`StoreError`]: persistence failures

use crate::reject::SessionRejectReason;
use std::ops::Range;
use thiserror::Error;

/// Result type alias using [`FixError`] as the error type.
pub type Result<T> = std::result::Result<T, FixError>;

/// Top-level error type for all RivetFix operations.
#[derive(Debug, Error)]
pub enum FixError {
    /// Error during message decoding.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error during message encoding.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Field lookup or conversion error.
    #[error("field error: {0}")]
    Field(#[from] FieldError),

    /// Error in session layer operations.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Error in message store operations.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error from underlying transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structural errors raised while decoding a FIX message.
///
/// Any of these makes the specific message unusable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Message buffer is incomplete, need more data.
    #[error("incomplete message, need more data")]
    Incomplete,

    /// Invalid BeginString field (tag 8).
    #[error("invalid begin string: expected 8=FIX.x.y")]
    InvalidBeginString,

    /// Missing BodyLength field (tag 9).
    #[error("missing body length field (tag 9)")]
    MissingBodyLength,

    /// Invalid BodyLength value.
    #[error("invalid body length value")]
    InvalidBodyLength,

    /// Missing MsgType field (tag 35).
    #[error("missing msg type field (tag 35)")]
    MissingMsgType,

    /// A field has no `=` separator.
    #[error("equal sign not found in field at offset {offset}")]
    MissingEquals {
        /// Byte offset where the field starts.
        offset: usize,
    },

    /// Invalid tag format (not a valid integer).
    #[error("invalid tag format: {0}")]
    InvalidTag(String),

    /// A field value is not terminated by SOH.
    #[error("SOH not found at end of field {tag}")]
    MissingDelimiter {
        /// Tag of the unterminated field.
        tag: u32,
    },

    /// A data field was found before its length field.
    #[error("did not find length field {length_tag} required to parse data field {tag}")]
    MissingDataLength {
        /// The data field tag.
        tag: u32,
        /// The length field tag it pairs with.
        length_tag: u32,
    },

    /// A data field's declared length does not end on a SOH.
    #[error("data field {tag} with declared length {length} is not terminated by SOH")]
    DataLengthOverrun {
        /// The data field tag.
        tag: u32,
        /// The declared length.
        length: usize,
    },

    /// Checksum mismatch between calculated and declared values.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum value.
        calculated: u8,
        /// Declared checksum value in message.
        declared: u8,
    },

    /// The CheckSum field is missing or not three digits.
    #[error("invalid or missing checksum field")]
    InvalidChecksum,

    /// BodyLength disagrees with the actual byte count.
    #[error("body length mismatch: declared {declared}, actual {actual}")]
    BodyLengthMismatch {
        /// Declared BodyLength value.
        declared: usize,
        /// Counted body length.
        actual: usize,
    },

    /// BeginString, BodyLength and MsgType are not the first three fields.
    #[error("header fields out of order at tag {tag}")]
    HeaderOrder {
        /// The first tag found in the wrong position.
        tag: u32,
    },

    /// A group field arrived before the group's delimiter field.
    #[error("the group {count_tag} must set the delimiter field {delimiter} (found {tag})")]
    MissingGroupDelimiter {
        /// Group count tag.
        count_tag: u32,
        /// Expected delimiter tag.
        delimiter: u32,
        /// The tag that arrived instead.
        tag: u32,
    },

    /// Message exceeds maximum allowed size.
    #[error("message too large: {size} bytes exceeds maximum {max_size}")]
    MessageTooLarge {
        /// Actual message size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max_size: usize,
    },
}

/// Errors that occur during FIX message encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Missing required field during encoding.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// The tag number of the missing field.
        tag: u32,
    },
}

/// Lookup and conversion errors of a single field.
///
/// A conversion failure is distinct from a parse failure of the message: the
/// message was read fine, only the typed accessor rejected the value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The field is not present.
    #[error("field not found: tag {tag}")]
    NotFound {
        /// The missing tag.
        tag: u32,
    },

    /// The field is present but its value does not convert to the requested type.
    #[error("incorrect data format for tag {tag}: cannot convert {value:?} to {target}")]
    Conversion {
        /// The field tag.
        tag: u32,
        /// The raw value, lossily decoded.
        value: String,
        /// Name of the requested type.
        target: &'static str,
    },
}

impl FieldError {
    /// Returns the tag this error refers to.
    #[must_use]
    pub const fn tag(&self) -> u32 {
        match self {
            Self::NotFound { tag } | Self::Conversion { tag, .. } => *tag,
        }
    }
}

/// A recoverable field-level violation mapped to a session reject reason.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{reason}, field={tag}")]
pub struct FieldViolation {
    /// Reject reason code.
    pub reason: SessionRejectReason,
    /// Offending tag, 0 when the violation is not tied to a tag.
    pub tag: u32,
}

impl FieldViolation {
    /// Creates a new violation.
    #[must_use]
    pub const fn new(reason: SessionRejectReason, tag: u32) -> Self {
        Self { reason, tag }
    }
}

impl From<FieldError> for FieldViolation {
    fn from(err: FieldError) -> Self {
        match err {
            FieldError::NotFound { tag } => Self::new(SessionRejectReason::RequiredTagMissing, tag),
            FieldError::Conversion { tag, .. } => {
                Self::new(SessionRejectReason::IncorrectDataFormatForValue, tag)
            }
        }
    }
}

/// Errors in FIX session layer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Incoming BeginString does not match the session.
    #[error("unsupported version: expected {expected}, received {received}")]
    UnsupportedVersion {
        /// Configured BeginString.
        expected: String,
        /// Received BeginString.
        received: String,
    },

    /// Message type is invalid for the current logon state.
    #[error("session lifecycle violation: {reason}")]
    LifecycleViolation {
        /// Description of the violation.
        reason: String,
    },

    /// Sequence number too low without PossDupFlag.
    #[error("sequence too low: expected >= {expected}, received {received}")]
    SequenceTooLow {
        /// Minimum expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },

    /// A session with the same identity is already registered.
    #[error("session already registered: {session_id}")]
    AlreadyRegistered {
        /// Canonical session id.
        session_id: String,
    },

    /// No session registered under the given identity.
    #[error("session not found: {session_id}")]
    NotFound {
        /// Canonical session id.
        session_id: String,
    },

    /// An application callback failed unexpectedly.
    #[error("application error: {0}")]
    Application(String),

    /// Session configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),
}

/// Errors in message store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Failed to store message.
    #[error("failed to store message seq={seq_num}: {reason}")]
    StoreFailed {
        /// Sequence number of the message.
        seq_num: u64,
        /// Reason for failure.
        reason: String,
    },

    /// Range of messages not available.
    #[error("messages not available for range: {range:?}")]
    RangeNotAvailable {
        /// The requested range of sequence numbers.
        range: Range<u64>,
    },

    /// Store is corrupted.
    #[error("store corrupted: {reason}")]
    Corrupted {
        /// Description of the corruption.
        reason: String,
    },

    /// I/O error in persistent store.
    #[error("store i/o error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::ChecksumMismatch {
            calculated: 100,
            declared: 200,
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch: calculated 100, declared 200"
        );
    }

    #[test]
    fn test_fix_error_from_decode() {
        let fix_err: FixError = DecodeError::Incomplete.into();
        assert!(matches!(fix_err, FixError::Decode(DecodeError::Incomplete)));
    }

    #[test]
    fn test_field_error_maps_to_violation() {
        let missing: FieldViolation = FieldError::NotFound { tag: 52 }.into();
        assert_eq!(missing.reason, SessionRejectReason::RequiredTagMissing);
        assert_eq!(missing.tag, 52);

        let format: FieldViolation = FieldError::Conversion {
            tag: 34,
            value: "x".into(),
            target: "int",
        }
        .into();
        assert_eq!(
            format.reason,
            SessionRejectReason::IncorrectDataFormatForValue
        );
    }

    #[test]
    fn test_violation_display() {
        let v = FieldViolation::new(SessionRejectReason::ValueIsIncorrect, 54);
        assert_eq!(
            v.to_string(),
            "Value is incorrect (out of range) for this tag, field=54"
        );
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::SequenceTooLow {
            expected: 5,
            received: 3,
        };
        assert_eq!(err.to_string(), "sequence too low: expected >= 5, received 3");
    }
}
