/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! A single tag=value pair.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rivetfix_core::error::FieldError;
use rivetfix_core::field;
use rust_decimal::Decimal;
use std::fmt;

/// A FIX field: a positive tag number and its raw value.
///
/// Values are kept as bytes and converted on access, so a field read off the
/// wire is re-serialized byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    tag: u32,
    value: Bytes,
}

impl Field {
    /// Creates a field.
    #[must_use]
    pub fn new(tag: u32, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// Returns the tag number.
    #[inline]
    #[must_use]
    pub const fn tag(&self) -> u32 {
        self.tag
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Returns the raw value as a shared buffer.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.value
    }

    /// Returns true when the value is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Reads the value as text.
    ///
    /// # Errors
    /// Returns [`FieldError::Conversion`] when the value is not UTF-8.
    pub fn as_str(&self) -> Result<&str, FieldError> {
        field::parse_str(self.tag, &self.value)
    }

    /// Reads the value as a single character.
    ///
    /// # Errors
    /// Returns [`FieldError::Conversion`] on a malformed value.
    pub fn as_char(&self) -> Result<char, FieldError> {
        field::parse_char(self.tag, &self.value)
    }

    /// Reads the value as a signed integer.
    ///
    /// # Errors
    /// Returns [`FieldError::Conversion`] on a malformed value.
    pub fn as_int(&self) -> Result<i64, FieldError> {
        field::parse_int(self.tag, &self.value)
    }

    /// Reads the value as an unsigned integer.
    ///
    /// # Errors
    /// Returns [`FieldError::Conversion`] on a malformed value.
    pub fn as_u64(&self) -> Result<u64, FieldError> {
        field::parse_u64(self.tag, &self.value)
    }

    /// Reads the value as a decimal.
    ///
    /// # Errors
    /// Returns [`FieldError::Conversion`] on a malformed value.
    pub fn as_decimal(&self) -> Result<Decimal, FieldError> {
        field::parse_decimal(self.tag, &self.value)
    }

    /// Reads the value as a FIX boolean.
    ///
    /// # Errors
    /// Returns [`FieldError::Conversion`] unless the value is `Y` or `N`.
    pub fn as_bool(&self) -> Result<bool, FieldError> {
        field::parse_bool(self.tag, &self.value)
    }

    /// Reads the value as a UTC timestamp.
    ///
    /// # Errors
    /// Returns [`FieldError::Conversion`] on a malformed value.
    pub fn as_utc_timestamp(&self) -> Result<DateTime<Utc>, FieldError> {
        field::parse_utc_timestamp(self.tag, &self.value)
    }

    /// Reads the value as a UTC date.
    ///
    /// # Errors
    /// Returns [`FieldError::Conversion`] on a malformed value.
    pub fn as_utc_date_only(&self) -> Result<NaiveDate, FieldError> {
        field::parse_utc_date_only(self.tag, &self.value)
    }

    /// Reads the value as a UTC time of day.
    ///
    /// # Errors
    /// Returns [`FieldError::Conversion`] on a malformed value.
    pub fn as_utc_time_only(&self) -> Result<NaiveTime, FieldError> {
        field::parse_utc_time_only(self.tag, &self.value)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.tag, String::from_utf8_lossy(&self.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_access() {
        let field = Field::new(34, &b"17"[..]);
        assert_eq!(field.tag(), 34);
        assert_eq!(field.as_u64().unwrap(), 17);
        assert_eq!(field.as_str().unwrap(), "17");
        assert!(field.as_bool().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Field::new(35, "A").to_string(), "35=A");
    }
}
