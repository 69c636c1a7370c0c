/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session state change notifications.

use crate::session_id::SessionId;
use parking_lot::RwLock;
use std::sync::Arc;

/// Observer of session state changes. Every method defaults to a no-op.
pub trait SessionStateListener: Send + Sync {
    /// A transport was attached.
    fn on_connect(&self, _session_id: &SessionId) {}

    /// The transport was closed.
    fn on_disconnect(&self, _session_id: &SessionId) {}

    /// The Logon exchange completed.
    fn on_logon(&self, _session_id: &SessionId) {}

    /// A logged on session ended.
    fn on_logout(&self, _session_id: &SessionId) {}

    /// Sequence numbers were reset.
    fn on_reset(&self, _session_id: &SessionId) {}

    /// The store was reloaded.
    fn on_refresh(&self, _session_id: &SessionId) {}

    /// A TestRequest was sent because the counterparty was silent.
    fn on_missed_heartbeat(&self, _session_id: &SessionId) {}

    /// The counterparty stayed silent past the heartbeat timeout.
    fn on_heartbeat_timeout(&self, _session_id: &SessionId) {}

    /// A ResendRequest was sent. `chunk_end` is 0 for unchunked requests.
    fn on_resend_request_sent(
        &self,
        _session_id: &SessionId,
        _begin: u64,
        _end: u64,
        _chunk_end: u64,
    ) {
    }

    /// The outstanding ResendRequest was satisfied.
    fn on_resend_request_satisfied(&self, _session_id: &SessionId, _begin: u64, _end: u64) {}

    /// A SequenceReset moved the expected target seq.
    fn on_sequence_reset_received(&self, _session_id: &SessionId, _new_seq: u64, _gap_fill: bool) {}
}

/// Registered listeners, notified in registration order.
#[derive(Default)]
pub struct Listeners {
    listeners: RwLock<Vec<Arc<dyn SessionStateListener>>>,
}

impl Listeners {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener.
    pub fn add(&self, listener: Arc<dyn SessionStateListener>) {
        self.listeners.write().push(listener);
    }

    /// Removes a listener by identity. Returns true if it was registered.
    pub fn remove(&self, listener: &Arc<dyn SessionStateListener>) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Returns true if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    // Callbacks run on a snapshot so a listener may register others.
    fn each(&self, f: impl Fn(&dyn SessionStateListener)) {
        let snapshot = self.listeners.read().clone();
        for listener in &snapshot {
            f(listener.as_ref());
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners").field("len", &self.len()).finish()
    }
}

impl SessionStateListener for Listeners {
    fn on_connect(&self, id: &SessionId) {
        self.each(|l| l.on_connect(id));
    }

    fn on_disconnect(&self, id: &SessionId) {
        self.each(|l| l.on_disconnect(id));
    }

    fn on_logon(&self, id: &SessionId) {
        self.each(|l| l.on_logon(id));
    }

    fn on_logout(&self, id: &SessionId) {
        self.each(|l| l.on_logout(id));
    }

    fn on_reset(&self, id: &SessionId) {
        self.each(|l| l.on_reset(id));
    }

    fn on_refresh(&self, id: &SessionId) {
        self.each(|l| l.on_refresh(id));
    }

    fn on_missed_heartbeat(&self, id: &SessionId) {
        self.each(|l| l.on_missed_heartbeat(id));
    }

    fn on_heartbeat_timeout(&self, id: &SessionId) {
        self.each(|l| l.on_heartbeat_timeout(id));
    }

    fn on_resend_request_sent(&self, id: &SessionId, begin: u64, end: u64, chunk_end: u64) {
        self.each(|l| l.on_resend_request_sent(id, begin, end, chunk_end));
    }

    fn on_resend_request_satisfied(&self, id: &SessionId, begin: u64, end: u64) {
        self.each(|l| l.on_resend_request_satisfied(id, begin, end));
    }

    fn on_sequence_reset_received(&self, id: &SessionId, new_seq: u64, gap_fill: bool) {
        self.each(|l| l.on_sequence_reset_received(id, new_seq, gap_fill));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rivetfix_core::types::{CompId, FixVersion};

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl SessionStateListener for Recorder {
        fn on_logon(&self, id: &SessionId) {
            self.calls.lock().push(format!("logon {id}"));
        }

        fn on_resend_request_sent(&self, _id: &SessionId, begin: u64, end: u64, _chunk: u64) {
            self.calls.lock().push(format!("resend {begin}-{end}"));
        }
    }

    #[test]
    fn test_fan_out_and_remove() {
        let id = SessionId::new(
            FixVersion::Fix44,
            CompId::new("A").unwrap(),
            CompId::new("B").unwrap(),
        );
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let listeners = Listeners::new();
        listeners.add(first.clone());
        let second_dyn: Arc<dyn SessionStateListener> = second.clone();
        listeners.add(second_dyn.clone());

        listeners.on_logon(&id);
        listeners.on_resend_request_sent(&id, 5, 6, 0);
        listeners.on_reset(&id);
        assert_eq!(
            *first.calls.lock(),
            vec!["logon FIX.4.4:A->B".to_string(), "resend 5-6".to_string()]
        );
        assert_eq!(second.calls.lock().len(), 2);

        assert!(listeners.remove(&second_dyn));
        assert!(!listeners.remove(&second_dyn));
        listeners.on_logon(&id);
        assert_eq!(first.calls.lock().len(), 3);
        assert_eq!(second.calls.lock().len(), 2);
    }
}
