/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX message type (tag 35) enumeration.
//!
//! The session engine dispatches on [`MsgType`] instead of a per-message class
//! hierarchy. Session-level types are named explicitly; everything else is an
//! application message, either one of the common named types or
//! [`MsgType::Custom`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! msg_types {
    ($($(#[$meta:meta])* $variant:ident => $code:literal,)+) => {
        /// Standard FIX message types.
        ///
        /// Less common message types are represented as `Custom(String)`.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum MsgType {
            $($(#[$meta])* $variant,)+
            /// Any other message type value.
            Custom(String),
        }

        impl MsgType {
            /// Returns the wire value of this message type.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $code,)+
                    Self::Custom(s) => s.as_str(),
                }
            }
        }

        impl FromStr for MsgType {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(match s {
                    $($code => Self::$variant,)+
                    other => Self::Custom(other.to_string()),
                })
            }
        }
    };
}

msg_types! {
    /// Heartbeat (0).
    Heartbeat => "0",
    /// Test Request (1).
    TestRequest => "1",
    /// Resend Request (2).
    ResendRequest => "2",
    /// Reject (3).
    Reject => "3",
    /// Sequence Reset (4).
    SequenceReset => "4",
    /// Logout (5).
    Logout => "5",
    /// Indication of Interest (6).
    IndicationOfInterest => "6",
    /// Execution Report (8).
    ExecutionReport => "8",
    /// Order Cancel Reject (9).
    OrderCancelReject => "9",
    /// Logon (A).
    Logon => "A",
    /// News (B).
    News => "B",
    /// New Order Single (D).
    NewOrderSingle => "D",
    /// Order Cancel Request (F).
    OrderCancelRequest => "F",
    /// Order Cancel/Replace Request (G).
    OrderCancelReplaceRequest => "G",
    /// Order Status Request (H).
    OrderStatusRequest => "H",
    /// Quote Request (R).
    QuoteRequest => "R",
    /// Quote (S).
    Quote => "S",
    /// Market Data Request (V).
    MarketDataRequest => "V",
    /// Market Data Snapshot/Full Refresh (W).
    MarketDataSnapshotFullRefresh => "W",
    /// Market Data Incremental Refresh (X).
    MarketDataIncrementalRefresh => "X",
    /// Market Data Request Reject (Y).
    MarketDataRequestReject => "Y",
    /// Security Definition Request (c).
    SecurityDefinitionRequest => "c",
    /// Security Definition (d).
    SecurityDefinition => "d",
    /// Trading Session Status (h).
    TradingSessionStatus => "h",
    /// Business Message Reject (j).
    BusinessMessageReject => "j",
    /// XML message (n).
    XmlMessage => "n",
}

impl MsgType {
    /// Returns true for session-level (administrative) message types.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::Heartbeat
                | Self::TestRequest
                | Self::ResendRequest
                | Self::Reject
                | Self::SequenceReset
                | Self::Logout
                | Self::Logon
        )
    }

    /// Returns true for application message types.
    #[must_use]
    pub const fn is_app(&self) -> bool {
        !self.is_admin()
    }
}

/// Returns true if the raw MsgType value names a session-level message.
#[must_use]
pub fn is_admin_msg_type(value: &str) -> bool {
    matches!(value, "0" | "1" | "2" | "3" | "4" | "5" | "A")
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for MsgType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(msg_type) => msg_type,
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_type_round_trip() {
        for code in ["0", "A", "D", "j", "AE", "U1"] {
            assert_eq!(MsgType::from(code).as_str(), code);
        }
    }

    #[test]
    fn test_admin_classification() {
        assert!(MsgType::Logon.is_admin());
        assert!(MsgType::SequenceReset.is_admin());
        assert!(MsgType::NewOrderSingle.is_app());
        assert!(MsgType::BusinessMessageReject.is_app());
        assert!(MsgType::Custom("AE".into()).is_app());
        assert!(is_admin_msg_type("5"));
        assert!(!is_admin_msg_type("8"));
    }

    #[test]
    fn test_custom_display() {
        assert_eq!(MsgType::from("UZZ").to_string(), "UZZ");
        assert_eq!(MsgType::from("A"), MsgType::Logon);
    }
}
