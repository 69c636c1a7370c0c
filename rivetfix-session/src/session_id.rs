/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session identity.

use rivetfix_core::types::{CompId, FixVersion};
use std::fmt;
use std::str::FromStr;

/// Identity of a FIX session.
///
/// The canonical form is `version:sender->target[:qualifier]`. Two ids are
/// equal exactly when their canonical forms are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId {
    version: FixVersion,
    sender_comp_id: CompId,
    target_comp_id: CompId,
    qualifier: Option<String>,
}

impl SessionId {
    /// Creates a new session id without a qualifier.
    #[must_use]
    pub const fn new(
        version: FixVersion,
        sender_comp_id: CompId,
        target_comp_id: CompId,
    ) -> Self {
        Self {
            version,
            sender_comp_id,
            target_comp_id,
            qualifier: None,
        }
    }

    /// Sets the qualifier that distinguishes sessions sharing the same
    /// CompIDs. An empty qualifier is the same as none.
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        let qualifier = qualifier.into();
        self.qualifier = (!qualifier.is_empty()).then_some(qualifier);
        self
    }

    /// Returns the protocol version.
    #[must_use]
    pub const fn version(&self) -> FixVersion {
        self.version
    }

    /// Returns the BeginString of the protocol version.
    #[must_use]
    pub const fn begin_string(&self) -> &'static str {
        self.version.begin_string()
    }

    /// Returns our CompID as a [`CompId`].
    #[must_use]
    pub const fn sender(&self) -> CompId {
        self.sender_comp_id
    }

    /// Returns the counterparty CompID as a [`CompId`].
    #[must_use]
    pub const fn target(&self) -> CompId {
        self.target_comp_id
    }

    /// Returns our CompID (tag 49 on outgoing messages).
    #[must_use]
    pub fn sender_comp_id(&self) -> &str {
        self.sender_comp_id.as_str()
    }

    /// Returns the counterparty CompID (tag 56 on outgoing messages).
    #[must_use]
    pub fn target_comp_id(&self) -> &str {
        self.target_comp_id.as_str()
    }

    /// Returns the qualifier, if any.
    #[must_use]
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Returns true for FIXT.1.1 sessions.
    #[must_use]
    pub const fn is_fixt(&self) -> bool {
        self.version.uses_fixt()
    }

    /// Returns the id seen from the counterparty: sender and target swapped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            version: self.version,
            sender_comp_id: self.target_comp_id,
            target_comp_id: self.sender_comp_id,
            qualifier: self.qualifier.clone(),
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}",
            self.version, self.sender_comp_id, self.target_comp_id
        )?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, ":{qualifier}")?;
        }
        Ok(())
    }
}

impl FromStr for SessionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid session id {s:?}");
        let (version, rest) = s.split_once(':').ok_or_else(invalid)?;
        let version = FixVersion::from_begin_string(version).ok_or_else(invalid)?;
        let (sender, rest) = rest.split_once("->").ok_or_else(invalid)?;
        let (target, qualifier) = match rest.split_once(':') {
            Some((target, qualifier)) => (target, Some(qualifier)),
            None => (rest, None),
        };
        let sender = CompId::new(sender).ok_or_else(invalid)?;
        let target = CompId::new(target).ok_or_else(invalid)?;
        let id = Self::new(version, sender, target);
        Ok(match qualifier {
            Some(qualifier) => id.with_qualifier(qualifier),
            None => id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(sender: &str, target: &str) -> SessionId {
        SessionId::new(
            FixVersion::Fix44,
            CompId::new(sender).unwrap(),
            CompId::new(target).unwrap(),
        )
    }

    #[test]
    fn test_canonical_form() {
        let id = id("SENDER", "TARGET");
        assert_eq!(id.to_string(), "FIX.4.4:SENDER->TARGET");
        let id = id.with_qualifier("east");
        assert_eq!(id.to_string(), "FIX.4.4:SENDER->TARGET:east");
    }

    #[test]
    fn test_parse_round_trip() {
        for text in ["FIXT.1.1:A->B", "FIX.4.2:BUY->SELL:q1"] {
            let id: SessionId = text.parse().unwrap();
            assert_eq!(id.to_string(), text);
        }
        assert!("FIX.4.4:A".parse::<SessionId>().is_err());
        assert!("FIX.9.9:A->B".parse::<SessionId>().is_err());
        assert!("FIX.4.4:->B".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_empty_qualifier_is_none() {
        let plain = id("A", "B");
        assert_eq!(plain.clone().with_qualifier(""), plain);
        assert_ne!(plain.clone().with_qualifier("x"), plain);
    }

    #[test]
    fn test_reversed() {
        let id = id("A", "B").reversed();
        assert_eq!(id.sender_comp_id(), "B");
        assert_eq!(id.target_comp_id(), "A");
    }
}
