/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Mutable runtime state of a session.
//!
//! [`SessionState`] holds the logon/logout flags, the send and receive timers
//! that drive heartbeating, the out-of-order queue and the outstanding resend
//! range. The session keeps it behind a single lock; every timing query takes
//! the current time from the session clock.

use crate::config::SessionConfig;
use chrono::{DateTime, Utc};
use rivetfix_tagvalue::Message;
use std::collections::BTreeMap;
use std::time::Duration;

/// Protocol state derived from the session flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// No transport attached.
    Disconnected,
    /// Connected, Logon exchange not complete.
    LogonPending,
    /// Logon sent and received.
    LoggedOn,
    /// Logout sent or received, waiting for the other side.
    LogoutPending,
}

/// Outstanding ResendRequest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendRange {
    /// First missing sequence number.
    pub begin: u64,
    /// Last missing sequence number.
    pub end: u64,
    /// Last sequence number of the chunk currently requested, 0 when the
    /// request is not chunked.
    pub chunk_end: u64,
}

impl ResendRange {
    /// Returns true when the current chunk stops short of the whole range.
    #[must_use]
    pub const fn has_more_chunks(&self) -> bool {
        self.chunk_end != 0 && self.chunk_end < self.end
    }
}

/// Flags, timers and queues of one session.
#[derive(Debug)]
pub struct SessionState {
    heartbeat_interval: Duration,
    test_request_delay_multiplier: f64,
    heartbeat_timeout_multiplier: f64,
    logon_timeout: Duration,
    logout_timeout: Duration,
    logon_intervals: Vec<Duration>,

    logon_sent: bool,
    logon_received: bool,
    logout_sent: bool,
    logout_received: bool,
    reset_sent: bool,
    reset_received: bool,
    logout_reason: Option<String>,

    last_sent_time: DateTime<Utc>,
    last_received_time: DateTime<Utc>,
    logout_sent_time: Option<DateTime<Utc>>,
    test_request_counter: u32,

    logon_attempts: u32,
    last_logon_attempt: Option<DateTime<Utc>>,
    next_expected_at_logon: u64,

    resend_range: Option<ResendRange>,
    queue: BTreeMap<u64, Message>,
}

impl SessionState {
    /// Creates the initial state from the timing settings of `config`.
    #[must_use]
    pub fn new(config: &SessionConfig, now: DateTime<Utc>) -> Self {
        Self {
            heartbeat_interval: config.heartbeat_interval,
            test_request_delay_multiplier: config.test_request_delay_multiplier,
            heartbeat_timeout_multiplier: config.heartbeat_timeout_multiplier,
            logon_timeout: config.logon_timeout,
            logout_timeout: config.logout_timeout,
            logon_intervals: config.logon_intervals.clone(),
            logon_sent: false,
            logon_received: false,
            logout_sent: false,
            logout_received: false,
            reset_sent: false,
            reset_received: false,
            logout_reason: None,
            last_sent_time: now,
            last_received_time: now,
            logout_sent_time: None,
            test_request_counter: 0,
            logon_attempts: 0,
            last_logon_attempt: None,
            next_expected_at_logon: 0,
            resend_range: None,
            queue: BTreeMap::new(),
        }
    }

    /// Returns the protocol status given whether a transport is attached.
    #[must_use]
    pub const fn status(&self, connected: bool) -> SessionStatus {
        if !connected {
            SessionStatus::Disconnected
        } else if self.logout_sent || self.logout_received {
            SessionStatus::LogoutPending
        } else if self.is_logged_on() {
            SessionStatus::LoggedOn
        } else {
            SessionStatus::LogonPending
        }
    }

    /// Returns true once Logon has been both sent and received.
    #[must_use]
    pub const fn is_logged_on(&self) -> bool {
        self.logon_sent && self.logon_received
    }

    /// Returns true while a sequence reset is being negotiated.
    #[must_use]
    pub const fn is_reset_pending(&self) -> bool {
        self.reset_sent || self.reset_received
    }

    pub const fn is_logon_sent(&self) -> bool {
        self.logon_sent
    }

    pub fn set_logon_sent(&mut self, sent: bool) {
        self.logon_sent = sent;
    }

    pub const fn is_logon_received(&self) -> bool {
        self.logon_received
    }

    pub fn set_logon_received(&mut self, received: bool) {
        self.logon_received = received;
    }

    pub const fn is_logout_sent(&self) -> bool {
        self.logout_sent
    }

    /// Marks Logout as sent and starts the logout timer.
    pub fn set_logout_sent(&mut self, sent: bool, now: DateTime<Utc>) {
        self.logout_sent = sent;
        self.logout_sent_time = sent.then_some(now);
    }

    pub const fn is_logout_received(&self) -> bool {
        self.logout_received
    }

    pub fn set_logout_received(&mut self, received: bool) {
        self.logout_received = received;
    }

    pub const fn is_reset_sent(&self) -> bool {
        self.reset_sent
    }

    pub fn set_reset_sent(&mut self, sent: bool) {
        self.reset_sent = sent;
    }

    pub const fn is_reset_received(&self) -> bool {
        self.reset_received
    }

    pub fn set_reset_received(&mut self, received: bool) {
        self.reset_received = received;
    }

    /// Returns the reason recorded for the pending logout.
    #[must_use]
    pub fn logout_reason(&self) -> Option<&str> {
        self.logout_reason.as_deref()
    }

    pub fn set_logout_reason(&mut self, reason: Option<String>) {
        self.logout_reason = reason;
    }

    /// Returns the heartbeat interval.
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    pub fn set_heartbeat_interval(&mut self, interval: Duration) {
        self.heartbeat_interval = interval;
    }

    /// Records that a message was sent.
    pub fn on_message_sent(&mut self, now: DateTime<Utc>) {
        self.last_sent_time = now;
    }

    /// Records that a message was received and clears the missed heartbeat
    /// count.
    pub fn on_message_received(&mut self, now: DateTime<Utc>) {
        self.last_received_time = now;
        self.test_request_counter = 0;
    }

    /// Returns the number of TestRequests sent since the last message arrived.
    #[must_use]
    pub const fn test_request_counter(&self) -> u32 {
        self.test_request_counter
    }

    /// Records that a TestRequest was sent.
    pub fn on_test_request_sent(&mut self) {
        self.test_request_counter += 1;
    }

    /// Returns true when nothing was sent for a heartbeat interval and no
    /// TestRequest is pending.
    #[must_use]
    pub fn is_heartbeat_needed(&self, now: DateTime<Utc>) -> bool {
        !self.heartbeat_interval.is_zero()
            && elapsed(self.last_sent_time, now) >= self.heartbeat_interval
            && self.test_request_counter == 0
    }

    /// Returns true when the receive silence reaches
    /// `(1 + delay multiplier) * (missed + 1) * heartbeat interval`.
    #[must_use]
    pub fn is_test_request_needed(&self, now: DateTime<Utc>) -> bool {
        if self.heartbeat_interval.is_zero() {
            return false;
        }
        let factor = (1.0 + self.test_request_delay_multiplier)
            * f64::from(self.test_request_counter + 1);
        elapsed(self.last_received_time, now) >= self.heartbeat_interval.mul_f64(factor)
    }

    /// Returns true when the receive silence reaches the heartbeat timeout.
    #[must_use]
    pub fn is_timed_out(&self, now: DateTime<Utc>) -> bool {
        if self.heartbeat_interval.is_zero() {
            return false;
        }
        let limit = self.heartbeat_interval.mul_f64(self.heartbeat_timeout_multiplier);
        elapsed(self.last_received_time, now) >= limit
    }

    /// Returns true when the logon timeout elapsed since the last message
    /// arrived, or since the Logon was sent or the transport attached.
    #[must_use]
    pub fn is_logon_timed_out(&self, now: DateTime<Utc>) -> bool {
        elapsed(self.last_received_time, now) >= self.logon_timeout
    }

    /// Returns true when a Logout was sent and not answered in time.
    #[must_use]
    pub fn is_logout_timed_out(&self, now: DateTime<Utc>) -> bool {
        self.logout_sent
            && self
                .logout_sent_time
                .is_some_and(|sent| elapsed(sent, now) >= self.logout_timeout)
    }

    /// Returns true when the logon backoff allows another attempt.
    ///
    /// The first attempt is immediate. Attempt `n` waits for the
    /// `n - 1`th interval, the last interval repeating.
    #[must_use]
    pub fn is_time_to_logon(&self, now: DateTime<Utc>) -> bool {
        let Some(last) = self.last_logon_attempt else {
            return true;
        };
        let index = (self.logon_attempts as usize)
            .saturating_sub(1)
            .min(self.logon_intervals.len().saturating_sub(1));
        let delay = self.logon_intervals.get(index).copied().unwrap_or_default();
        elapsed(last, now) >= delay
    }

    /// Records a logon attempt. The receive timer restarts so the logon
    /// timeout counts from now.
    pub fn on_logon_attempt(&mut self, now: DateTime<Utc>) {
        self.logon_attempts += 1;
        self.last_logon_attempt = Some(now);
        self.last_received_time = now;
        self.test_request_counter = 0;
    }

    /// Returns the number of logon attempts since the last successful logon.
    #[must_use]
    pub const fn logon_attempts(&self) -> u32 {
        self.logon_attempts
    }

    /// Forgets past logon attempts.
    pub fn clear_logon_attempts(&mut self) {
        self.logon_attempts = 0;
        self.last_logon_attempt = None;
    }

    /// Returns our next sender seq recorded when the Logon was processed.
    #[must_use]
    pub const fn next_expected_at_logon(&self) -> u64 {
        self.next_expected_at_logon
    }

    pub fn set_next_expected_at_logon(&mut self, seq_num: u64) {
        self.next_expected_at_logon = seq_num;
    }

    /// Returns the outstanding resend range.
    #[must_use]
    pub const fn resend_range(&self) -> Option<ResendRange> {
        self.resend_range
    }

    /// Returns true while a ResendRequest is outstanding.
    #[must_use]
    pub const fn is_resend_requested(&self) -> bool {
        self.resend_range.is_some()
    }

    pub fn set_resend_range(&mut self, range: Option<ResendRange>) {
        self.resend_range = range;
    }

    /// Holds an early message until the gap before it is filled.
    pub fn enqueue(&mut self, seq_num: u64, message: Message) {
        self.queue.insert(seq_num, message);
    }

    /// Takes the queued message for `seq_num`, dropping any stale entries
    /// below it.
    pub fn dequeue(&mut self, seq_num: u64) -> Option<Message> {
        let mut rest = self.queue.split_off(&seq_num);
        let message = rest.remove(&seq_num);
        self.queue = rest;
        message
    }

    /// Returns the number of queued messages.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if a message with `seq_num` is queued.
    #[must_use]
    pub fn is_queued(&self, seq_num: u64) -> bool {
        self.queue.contains_key(&seq_num)
    }

    /// Drops every queued message.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Clears the per-connection flags after a disconnect.
    pub fn clear_connection(&mut self) {
        self.logon_sent = false;
        self.logon_received = false;
        self.logout_sent = false;
        self.logout_received = false;
        self.reset_sent = false;
        self.reset_received = false;
        self.logout_reason = None;
        self.logout_sent_time = None;
        self.test_request_counter = 0;
        self.resend_range = None;
        self.queue.clear();
    }
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_id::SessionId;
    use chrono::{TimeDelta, TimeZone};
    use rivetfix_core::types::{CompId, FixVersion};

    fn config() -> SessionConfig {
        SessionConfig::new(SessionId::new(
            FixVersion::Fix44,
            CompId::new("A").unwrap(),
            CompId::new("B").unwrap(),
        ))
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()
    }

    fn ms(ms: i64) -> DateTime<Utc> {
        start() + TimeDelta::milliseconds(ms)
    }

    #[test]
    fn test_status() {
        let mut state = SessionState::new(&config(), start());
        assert_eq!(state.status(false), SessionStatus::Disconnected);
        assert_eq!(state.status(true), SessionStatus::LogonPending);
        state.set_logon_sent(true);
        assert_eq!(state.status(true), SessionStatus::LogonPending);
        state.set_logon_received(true);
        assert_eq!(state.status(true), SessionStatus::LoggedOn);
        state.set_logout_sent(true, start());
        assert_eq!(state.status(true), SessionStatus::LogoutPending);
        state.clear_connection();
        assert_eq!(state.status(true), SessionStatus::LogonPending);
    }

    #[test]
    fn test_heartbeat_timing() {
        // 30s heartbeat, 0.5 delay multiplier, 2.4 timeout multiplier.
        let mut state = SessionState::new(&config(), start());
        assert!(!state.is_heartbeat_needed(ms(29_999)));
        assert!(state.is_heartbeat_needed(ms(30_000)));

        assert!(!state.is_test_request_needed(ms(44_999)));
        assert!(state.is_test_request_needed(ms(45_000)));
        state.on_test_request_sent();
        assert!(!state.is_heartbeat_needed(ms(50_000)));
        assert!(!state.is_test_request_needed(ms(89_999)));
        assert!(state.is_test_request_needed(ms(90_000)));

        assert!(!state.is_timed_out(ms(71_999)));
        assert!(state.is_timed_out(ms(72_000)));

        state.on_message_received(ms(72_000));
        assert_eq!(state.test_request_counter(), 0);
        assert!(!state.is_timed_out(ms(100_000)));
    }

    #[test]
    fn test_zero_heartbeat_disables_timing() {
        let mut state = SessionState::new(&config(), start());
        state.set_heartbeat_interval(Duration::ZERO);
        assert!(!state.is_heartbeat_needed(ms(1_000_000)));
        assert!(!state.is_test_request_needed(ms(1_000_000)));
        assert!(!state.is_timed_out(ms(1_000_000)));
    }

    #[test]
    fn test_logon_backoff() {
        let config = config()
            .with_logon_intervals(vec![Duration::from_secs(5), Duration::from_secs(20)]);
        let mut state = SessionState::new(&config, start());
        assert!(state.is_time_to_logon(start()));

        state.on_logon_attempt(start());
        assert!(!state.is_time_to_logon(ms(4_999)));
        assert!(state.is_time_to_logon(ms(5_000)));

        state.on_logon_attempt(ms(5_000));
        assert!(!state.is_time_to_logon(ms(24_999)));
        assert!(state.is_time_to_logon(ms(25_000)));

        state.on_logon_attempt(ms(25_000));
        assert!(state.is_time_to_logon(ms(45_000)));

        state.clear_logon_attempts();
        assert_eq!(state.logon_attempts(), 0);
        assert!(state.is_time_to_logon(ms(45_000)));
    }

    #[test]
    fn test_logon_and_logout_timeouts() {
        let mut state = SessionState::new(&config(), start());
        state.on_logon_attempt(start());
        assert!(!state.is_logon_timed_out(ms(9_999)));
        assert!(state.is_logon_timed_out(ms(10_000)));

        assert!(!state.is_logout_timed_out(ms(100_000)));
        state.set_logout_sent(true, ms(100_000));
        assert!(!state.is_logout_timed_out(ms(109_999)));
        assert!(state.is_logout_timed_out(ms(110_000)));
    }

    #[test]
    fn test_queue_drops_stale_entries() {
        let mut state = SessionState::new(&config(), start());
        for seq in [3, 5, 7] {
            state.enqueue(seq, Message::new());
        }
        assert_eq!(state.queued(), 3);
        assert!(state.dequeue(4).is_none());
        assert!(!state.is_queued(3));
        assert!(state.dequeue(5).is_some());
        assert_eq!(state.queued(), 1);
        assert!(state.is_queued(7));
    }

    #[test]
    fn test_resend_range_chunks() {
        let range = ResendRange {
            begin: 1,
            end: 100,
            chunk_end: 10,
        };
        assert!(range.has_more_chunks());
        let last = ResendRange {
            chunk_end: 100,
            ..range
        };
        assert!(!last.has_more_chunks());
        let unchunked = ResendRange {
            chunk_end: 0,
            ..range
        };
        assert!(!unchunked.has_more_chunks());
    }
}
