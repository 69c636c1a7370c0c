/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Core types for FIX protocol operations.
//!
//! - [`CompId`]: Component identifier (SenderCompID, TargetCompID)
//! - [`FixVersion`]: Protocol version carried in BeginString
//! - [`TimestampPrecision`]: Fractional-second precision of UTC timestamps

use arrayvec::ArrayString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length for CompID strings in bytes.
pub const COMP_ID_MAX_LEN: usize = 32;

/// Component identifier for FIX sessions.
///
/// Used for SenderCompID (tag 49), TargetCompID (tag 56), and related fields.
/// Maximum length is 32 characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct CompId(ArrayString<COMP_ID_MAX_LEN>);

impl CompId {
    /// Creates a new CompId from a string slice.
    ///
    /// # Returns
    /// `Some(CompId)` if the string is non-empty and fits within the maximum
    /// length, `None` otherwise.
    #[must_use]
    pub fn new(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        ArrayString::from(s).ok().map(Self)
    }

    /// Returns the CompId as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for CompId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CompId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompId {
    type Err = arrayvec::CapacityError<()>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or_else(|| arrayvec::CapacityError::new(()))
    }
}

/// FIX protocol version.
///
/// Versions are ordered, so `version >= FixVersion::Fix42` expresses the
/// "FIX.4.2 and later" rules of the session protocol. FIXT.1.1 sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FixVersion {
    /// FIX 4.0
    Fix40,
    /// FIX 4.1
    Fix41,
    /// FIX 4.2
    Fix42,
    /// FIX 4.3
    Fix43,
    /// FIX 4.4
    Fix44,
    /// FIXT 1.1 (transport layer for FIX 5.0+)
    Fixt11,
}

impl FixVersion {
    /// Returns the BeginString value for this version.
    #[must_use]
    pub const fn begin_string(&self) -> &'static str {
        match self {
            Self::Fix40 => "FIX.4.0",
            Self::Fix41 => "FIX.4.1",
            Self::Fix42 => "FIX.4.2",
            Self::Fix43 => "FIX.4.3",
            Self::Fix44 => "FIX.4.4",
            Self::Fixt11 => "FIXT.1.1",
        }
    }

    /// Parses a BeginString value.
    #[must_use]
    pub fn from_begin_string(s: &str) -> Option<Self> {
        Some(match s {
            "FIX.4.0" => Self::Fix40,
            "FIX.4.1" => Self::Fix41,
            "FIX.4.2" => Self::Fix42,
            "FIX.4.3" => Self::Fix43,
            "FIX.4.4" => Self::Fix44,
            "FIXT.1.1" => Self::Fixt11,
            _ => return None,
        })
    }

    /// Returns true if this version uses FIXT transport.
    #[must_use]
    pub const fn uses_fixt(&self) -> bool {
        matches!(self, Self::Fixt11)
    }

    /// The EndSeqNo value meaning "up to the latest message".
    ///
    /// FIX.4.2 and later use 0, earlier versions use 999999.
    #[must_use]
    pub fn infinity_seq_num(&self) -> u64 {
        if *self >= Self::Fix42 { 0 } else { 999_999 }
    }
}

impl fmt::Display for FixVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.begin_string())
    }
}

impl FromStr for FixVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_begin_string(s).ok_or_else(|| format!("unknown BeginString {s:?}"))
    }
}

/// Fractional-second precision used when formatting UTC timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimestampPrecision {
    /// `YYYYMMDD-HH:MM:SS`
    Seconds,
    /// `YYYYMMDD-HH:MM:SS.sss`
    #[default]
    Millis,
    /// `YYYYMMDD-HH:MM:SS.ssssss`
    Micros,
    /// `YYYYMMDD-HH:MM:SS.sssssssss`
    Nanos,
}

impl TimestampPrecision {
    /// Number of fractional digits.
    #[must_use]
    pub const fn digits(self) -> usize {
        match self {
            Self::Seconds => 0,
            Self::Millis => 3,
            Self::Micros => 6,
            Self::Nanos => 9,
        }
    }

    /// Infers the precision from a count of fractional digits.
    #[must_use]
    pub const fn from_digits(digits: usize) -> Option<Self> {
        match digits {
            0 => Some(Self::Seconds),
            3 => Some(Self::Millis),
            6 => Some(Self::Micros),
            9 => Some(Self::Nanos),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comp_id() {
        let id = CompId::new("SENDER").unwrap();
        assert_eq!(id.as_str(), "SENDER");
        assert_eq!(id.to_string(), "SENDER");
    }

    #[test]
    fn test_comp_id_rejects_empty_and_too_long() {
        assert!(CompId::new("").is_none());
        let long_str = "A".repeat(COMP_ID_MAX_LEN + 1);
        assert!(CompId::new(&long_str).is_none());
        assert!(long_str.parse::<CompId>().is_err());
    }

    #[test]
    fn test_version_ordering() {
        assert!(FixVersion::Fix42 > FixVersion::Fix41);
        assert!(FixVersion::Fixt11 > FixVersion::Fix44);
        assert_eq!(FixVersion::Fix41.infinity_seq_num(), 999_999);
        assert_eq!(FixVersion::Fix42.infinity_seq_num(), 0);
        assert_eq!(FixVersion::Fixt11.infinity_seq_num(), 0);
    }

    #[test]
    fn test_version_begin_string() {
        assert_eq!(FixVersion::Fix44.begin_string(), "FIX.4.4");
        assert_eq!("FIXT.1.1".parse::<FixVersion>(), Ok(FixVersion::Fixt11));
        assert!("FIX.9.9".parse::<FixVersion>().is_err());
    }

    #[test]
    fn test_precision_digits() {
        assert_eq!(TimestampPrecision::default(), TimestampPrecision::Millis);
        assert_eq!(
            TimestampPrecision::from_digits(6),
            Some(TimestampPrecision::Micros)
        );
        assert_eq!(TimestampPrecision::from_digits(2), None);
    }
}
