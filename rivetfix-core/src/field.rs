/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Typed conversions for FIX field values.
//!
//! Field values travel as raw bytes. This module converts them to and from
//! their semantic types. Every formatter produces a string that the matching
//! parser reads back to the same value, so a value set through a typed setter
//! round-trips exactly through the typed getter.
//!
//! Conversion failures are reported as [`FieldError::Conversion`].

use crate::error::FieldError;
use crate::types::TimestampPrecision;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

const DATE_FORMAT: &str = "%Y%m%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H:%M:%S";

/// Semantic type of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Free text.
    String,
    /// Single character.
    Char,
    /// Signed integer.
    Int,
    /// Decimal number.
    Decimal,
    /// `Y` or `N`.
    Boolean,
    /// `YYYYMMDD-HH:MM:SS[.fff]`.
    UtcTimestamp,
    /// `YYYYMMDD`.
    UtcDateOnly,
    /// `HH:MM:SS[.fff]`.
    UtcTimeOnly,
    /// Raw bytes.
    Bytes,
    /// Raw bytes whose length is carried by a preceding length field.
    Data,
}

impl FieldKind {
    /// Checks that `value` is a valid representation of this kind.
    ///
    /// # Errors
    /// Returns [`FieldError::Conversion`] when the value does not convert.
    pub fn check(self, tag: u32, value: &[u8]) -> Result<(), FieldError> {
        match self {
            Self::String => parse_str(tag, value).map(drop),
            Self::Char => parse_char(tag, value).map(drop),
            Self::Int => parse_int(tag, value).map(drop),
            Self::Decimal => parse_decimal(tag, value).map(drop),
            Self::Boolean => parse_bool(tag, value).map(drop),
            Self::UtcTimestamp => parse_utc_timestamp(tag, value).map(drop),
            Self::UtcDateOnly => parse_utc_date_only(tag, value).map(drop),
            Self::UtcTimeOnly => parse_utc_time_only(tag, value).map(drop),
            Self::Bytes | Self::Data => Ok(()),
        }
    }
}

fn conversion(tag: u32, value: &[u8], target: &'static str) -> FieldError {
    FieldError::Conversion {
        tag,
        value: String::from_utf8_lossy(value).into_owned(),
        target,
    }
}

/// Reads a value as UTF-8 text.
///
/// # Errors
/// Fails when the bytes are not valid UTF-8.
pub fn parse_str(tag: u32, value: &[u8]) -> Result<&str, FieldError> {
    std::str::from_utf8(value).map_err(|_| conversion(tag, value, "string"))
}

/// Reads a single ASCII character.
///
/// # Errors
/// Fails unless the value is exactly one ASCII byte.
pub fn parse_char(tag: u32, value: &[u8]) -> Result<char, FieldError> {
    match value {
        [b] if b.is_ascii() => Ok(*b as char),
        _ => Err(conversion(tag, value, "char")),
    }
}

/// Reads a signed integer.
///
/// # Errors
/// Fails on anything other than an optional sign followed by digits.
pub fn parse_int(tag: u32, value: &[u8]) -> Result<i64, FieldError> {
    parse_str(tag, value)?
        .parse()
        .map_err(|_| conversion(tag, value, "int"))
}

/// Reads an unsigned integer, as used by sequence numbers and lengths.
///
/// # Errors
/// Fails on anything other than digits.
pub fn parse_u64(tag: u32, value: &[u8]) -> Result<u64, FieldError> {
    if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
        return Err(conversion(tag, value, "unsigned int"));
    }
    parse_str(tag, value)?
        .parse()
        .map_err(|_| conversion(tag, value, "unsigned int"))
}

/// Reads a decimal, keeping the scale so that `1.50` formats back as `1.50`.
///
/// # Errors
/// Fails when the value is not a plain decimal number.
pub fn parse_decimal(tag: u32, value: &[u8]) -> Result<Decimal, FieldError> {
    parse_str(tag, value)?
        .parse()
        .map_err(|_| conversion(tag, value, "decimal"))
}

/// Reads a FIX boolean.
///
/// # Errors
/// Fails unless the value is `Y` or `N`.
pub fn parse_bool(tag: u32, value: &[u8]) -> Result<bool, FieldError> {
    match value {
        b"Y" => Ok(true),
        b"N" => Ok(false),
        _ => Err(conversion(tag, value, "boolean")),
    }
}

/// Formats a FIX boolean.
#[must_use]
pub const fn format_bool(value: bool) -> &'static str {
    if value { "Y" } else { "N" }
}

fn split_fraction(s: &str) -> (&str, Option<&str>) {
    match s.split_once('.') {
        Some((base, fraction)) => (base, Some(fraction)),
        None => (s, None),
    }
}

fn fraction_nanos(fraction: Option<&str>) -> Option<u32> {
    let Some(digits) = fraction else {
        return Some(0);
    };
    if digits.is_empty() || digits.len() > 9 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = digits.parse().ok()?;
    Some(value * 10u32.pow(9 - digits.len() as u32))
}

fn push_fraction(out: &mut String, nanos: u32, precision: TimestampPrecision) {
    let digits = precision.digits();
    if digits == 0 {
        return;
    }
    let scaled = nanos.min(999_999_999) / 10u32.pow(9 - digits as u32);
    let _ = write!(out, ".{scaled:0digits$}");
}

/// Reads a UTC timestamp with 0, 3, 6 or 9 fractional digits.
///
/// # Errors
/// Fails when the value is not a valid timestamp.
pub fn parse_utc_timestamp(tag: u32, value: &[u8]) -> Result<DateTime<Utc>, FieldError> {
    let err = || conversion(tag, value, "UTC timestamp");
    let (base, fraction) = split_fraction(parse_str(tag, value)?);
    let naive = NaiveDateTime::parse_from_str(base, TIMESTAMP_FORMAT).map_err(|_| err())?;
    let nanos = fraction_nanos(fraction).ok_or_else(err)?;
    let naive = naive.with_nanosecond(nanos).ok_or_else(err)?;
    Ok(naive.and_utc())
}

/// Formats a UTC timestamp at the given precision.
#[must_use]
pub fn format_utc_timestamp(value: &DateTime<Utc>, precision: TimestampPrecision) -> String {
    let mut out = String::with_capacity(27);
    let _ = write!(out, "{}", value.format(TIMESTAMP_FORMAT));
    push_fraction(&mut out, value.nanosecond(), precision);
    out
}

/// Reads a UTC date.
///
/// # Errors
/// Fails unless the value is a valid `YYYYMMDD` date.
pub fn parse_utc_date_only(tag: u32, value: &[u8]) -> Result<NaiveDate, FieldError> {
    let s = parse_str(tag, value)?;
    if s.len() != 8 {
        return Err(conversion(tag, value, "UTC date"));
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| conversion(tag, value, "UTC date"))
}

/// Formats a UTC date.
#[must_use]
pub fn format_utc_date_only(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

/// Reads a UTC time of day with 0, 3, 6 or 9 fractional digits.
///
/// # Errors
/// Fails when the value is not a valid time.
pub fn parse_utc_time_only(tag: u32, value: &[u8]) -> Result<NaiveTime, FieldError> {
    let err = || conversion(tag, value, "UTC time");
    let (base, fraction) = split_fraction(parse_str(tag, value)?);
    let time = NaiveTime::parse_from_str(base, TIME_FORMAT).map_err(|_| err())?;
    let nanos = fraction_nanos(fraction).ok_or_else(err)?;
    time.with_nanosecond(nanos).ok_or_else(err)
}

/// Formats a UTC time of day at the given precision.
#[must_use]
pub fn format_utc_time_only(value: &NaiveTime, precision: TimestampPrecision) -> String {
    let mut out = String::with_capacity(18);
    let _ = write!(out, "{}", value.format(TIME_FORMAT));
    push_fraction(&mut out, value.nanosecond(), precision);
    out
}

/// Infers the precision of a formatted timestamp or time value.
#[must_use]
pub fn precision_of(value: &[u8]) -> TimestampPrecision {
    match value.iter().position(|&b| b == b'.') {
        Some(pos) => TimestampPrecision::from_digits(value.len() - pos - 1)
            .unwrap_or(TimestampPrecision::Nanos),
        None => TimestampPrecision::Seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse_char(54, b"1").unwrap(), '1');
        assert!(parse_char(54, b"12").is_err());
        assert_eq!(parse_int(44, b"-17").unwrap(), -17);
        assert_eq!(parse_u64(34, b"42").unwrap(), 42);
        assert!(parse_u64(34, b"+42").is_err());
        assert!(parse_bool(141, b"Y").unwrap());
        assert!(!parse_bool(141, b"N").unwrap());
        assert!(parse_bool(141, b"y").is_err());
    }

    #[test]
    fn test_decimal_keeps_scale() {
        let d = parse_decimal(44, b"1.50").unwrap();
        assert_eq!(d.to_string(), "1.50");
    }

    #[test]
    fn test_conversion_error_is_not_a_lookup_error() {
        let err = parse_int(38, b"abc").unwrap_err();
        assert!(matches!(err, FieldError::Conversion { tag: 38, .. }));
    }

    #[test]
    fn test_timestamp_round_trip_by_precision() {
        for raw in [
            "20240315-13:45:01",
            "20240315-13:45:01.123",
            "20240315-13:45:01.123456",
            "20240315-13:45:01.123456789",
        ] {
            let parsed = parse_utc_timestamp(52, raw.as_bytes()).unwrap();
            let precision = precision_of(raw.as_bytes());
            assert_eq!(format_utc_timestamp(&parsed, precision), raw);
        }
    }

    #[test]
    fn test_timestamp_format_millis() {
        let dt = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            format_utc_timestamp(&dt, TimestampPrecision::Millis),
            "19700101-00:00:00.000"
        );
    }

    #[test]
    fn test_invalid_timestamp() {
        assert!(parse_utc_timestamp(52, b"20240315 13:45:01").is_err());
        assert!(parse_utc_timestamp(52, b"20240315-13:45:01.").is_err());
        assert!(parse_utc_timestamp(52, b"20240315-13:45:01.1234567890").is_err());
    }

    #[test]
    fn test_date_and_time_only() {
        let date = parse_utc_date_only(75, b"20240315").unwrap();
        assert_eq!(format_utc_date_only(&date), "20240315");
        assert!(parse_utc_date_only(75, b"2024031").is_err());

        let time = parse_utc_time_only(1079, b"13:45:01.500").unwrap();
        assert_eq!(
            format_utc_time_only(&time, TimestampPrecision::Millis),
            "13:45:01.500"
        );
    }

    #[test]
    fn test_kind_check() {
        assert!(FieldKind::Int.check(38, b"100").is_ok());
        assert!(FieldKind::Int.check(38, b"1e2").is_err());
        assert!(FieldKind::Data.check(96, &[0, 1, 2]).is_ok());
    }
}
