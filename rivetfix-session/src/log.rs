/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session event log.
//!
//! Every message in and out, every rejection and every disconnect is recorded
//! through [`SessionLog`]. [`TracingLog`] forwards to `tracing`;
//! [`MemoryLog`] keeps entries for inspection.

use crate::session_id::SessionId;
use parking_lot::Mutex;
use rivetfix_tagvalue::SOH;
use tracing::{debug, error, info};

/// Sink for session messages and events.
pub trait SessionLog: Send + Sync {
    /// Records a raw incoming message.
    fn on_incoming(&self, message: &[u8]);

    /// Records a raw outgoing message.
    fn on_outgoing(&self, message: &[u8]);

    /// Records a session event.
    fn on_event(&self, text: &str);

    /// Records an error event.
    fn on_error_event(&self, text: &str);
}

/// Renders a raw message with SOH shown as `|`.
#[must_use]
pub fn printable(message: &[u8]) -> String {
    message
        .iter()
        .map(|&b| if b == SOH { '|' } else { char::from(b) })
        .collect()
}

/// Log that emits `tracing` events with a `session` field.
#[derive(Debug, Clone)]
pub struct TracingLog {
    session: String,
}

impl TracingLog {
    /// Creates a log for `session_id`.
    #[must_use]
    pub fn new(session_id: &SessionId) -> Self {
        Self {
            session: session_id.to_string(),
        }
    }
}

impl SessionLog for TracingLog {
    fn on_incoming(&self, message: &[u8]) {
        debug!(session = %self.session, message = %printable(message), "incoming");
    }

    fn on_outgoing(&self, message: &[u8]) {
        debug!(session = %self.session, message = %printable(message), "outgoing");
    }

    fn on_event(&self, text: &str) {
        info!(session = %self.session, "{text}");
    }

    fn on_error_event(&self, text: &str) {
        error!(session = %self.session, "{text}");
    }
}

/// One recorded log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// Incoming message, SOH rendered as `|`.
    Incoming(String),
    /// Outgoing message, SOH rendered as `|`.
    Outgoing(String),
    /// Session event.
    Event(String),
    /// Error event.
    ErrorEvent(String),
}

/// Log that keeps every entry in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Returns the recorded event texts, errors included.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|entry| match entry {
                LogEntry::Event(text) | LogEntry::ErrorEvent(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns true if an event containing `needle` was recorded.
    #[must_use]
    pub fn has_event(&self, needle: &str) -> bool {
        self.events().iter().any(|text| text.contains(needle))
    }

    /// Drops all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl SessionLog for MemoryLog {
    fn on_incoming(&self, message: &[u8]) {
        self.entries
            .lock()
            .push(LogEntry::Incoming(printable(message)));
    }

    fn on_outgoing(&self, message: &[u8]) {
        self.entries
            .lock()
            .push(LogEntry::Outgoing(printable(message)));
    }

    fn on_event(&self, text: &str) {
        self.entries.lock().push(LogEntry::Event(text.to_string()));
    }

    fn on_error_event(&self, text: &str) {
        self.entries
            .lock()
            .push(LogEntry::ErrorEvent(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable() {
        assert_eq!(printable(b"8=FIX.4.4\x0135=0\x01"), "8=FIX.4.4|35=0|");
    }

    #[test]
    fn test_memory_log_records_entries() {
        let log = MemoryLog::new();
        log.on_incoming(b"35=A\x01");
        log.on_event("Logon contains ResetSeqNumFlag=Y");
        log.on_error_event("Timed out waiting for heartbeat");

        let entries = log.entries();
        assert_eq!(entries[0], LogEntry::Incoming("35=A|".into()));
        assert_eq!(log.events().len(), 2);
        assert!(log.has_event("heartbeat"));

        log.clear();
        assert!(log.entries().is_empty());
    }
}
