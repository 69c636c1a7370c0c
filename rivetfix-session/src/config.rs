/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session configuration.
//!
//! Every setting has a default that matches what FIX counterparties
//! usually expect, so most sessions only set the identity and role.

use crate::schedule::SessionSchedule;
use crate::session_id::SessionId;
use rivetfix_core::error::SessionError;
use rivetfix_core::types::{CompId, FixVersion, TimestampPrecision};
use std::time::Duration;

/// Which side opens the connection and sends the first Logon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionRole {
    /// Sends Logon and retries on the logon backoff schedule.
    Initiator,
    /// Waits for the counterparty's Logon and answers it.
    #[default]
    Acceptor,
}

/// Configuration for a FIX session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session identity.
    pub session_id: SessionId,
    /// Initiator or acceptor.
    pub role: SessionRole,
    /// Heartbeat interval. An acceptor takes the counterparty's value at logon.
    pub heartbeat_interval: Duration,
    /// Whether to check SendingTime against the local clock.
    pub check_latency: bool,
    /// Maximum tolerated SendingTime deviation.
    pub max_latency: Duration,
    /// Whether to check SenderCompID and TargetCompID of incoming messages.
    pub check_comp_id: bool,
    /// Whether to reset sequence numbers on logon.
    pub reset_on_logon: bool,
    /// Whether to reset sequence numbers on logout.
    pub reset_on_logout: bool,
    /// Whether to reset sequence numbers on disconnect.
    pub reset_on_disconnect: bool,
    /// Whether to reset the session on a store or decode error.
    pub reset_on_error: bool,
    /// Whether to disconnect on a store or decode error.
    pub disconnect_on_error: bool,
    /// Whether to reload the store when a Logon arrives or is sent.
    pub refresh_on_logon: bool,
    /// Whether to persist outgoing messages for resending.
    pub persist_messages: bool,
    /// Whether to answer a resend with heartbeats when the store cannot be read.
    pub force_resend_when_corrupted_store: bool,
    /// Whether to send a ResendRequest even when one covering the gap is
    /// outstanding.
    pub send_redundant_resend_requests: bool,
    /// Maximum number of messages per ResendRequest, 0 for no limit.
    pub resend_request_chunk_size: u64,
    /// Whether ResendRequests name the last missing seq instead of infinity.
    pub use_closed_resend_interval: bool,
    /// Extra fraction of the heartbeat interval to wait before a TestRequest.
    pub test_request_delay_multiplier: f64,
    /// Multiple of the heartbeat interval after which the peer is timed out.
    pub heartbeat_timeout_multiplier: f64,
    /// Whether to skip the heartbeat timeout disconnect.
    pub disable_heartbeat_check: bool,
    /// Whether to validate incoming messages against the data dictionary.
    pub validate_incoming_messages: bool,
    /// Whether to check incoming sequence numbers for gaps.
    pub validate_sequence_numbers: bool,
    /// Whether PossDup messages must carry OrigSendingTime.
    pub requires_orig_sending_time: bool,
    /// Whether to send and honor NextExpectedMsgSeqNum (tag 789) on Logon.
    pub enable_next_expected_msg_seq_num: bool,
    /// Whether to stamp LastMsgSeqNumProcessed (tag 369) on outgoing messages.
    pub enable_last_msg_seq_num_processed: bool,
    /// Whether invalid messages are rejected rather than processed with a warning.
    pub reject_invalid_message: bool,
    /// Whether an unexpected application error rejects the message.
    pub reject_message_on_unhandled_error: bool,
    /// Time to wait for the counterparty's Logon.
    pub logon_timeout: Duration,
    /// Time to wait for the counterparty's Logout.
    pub logout_timeout: Duration,
    /// Delays between initiator logon attempts; the last one repeats.
    pub logon_intervals: Vec<Duration>,
    /// Precision of SendingTime and OrigSendingTime.
    pub timestamp_precision: TimestampPrecision,
    /// Trading window of the session.
    pub schedule: SessionSchedule,
    /// DefaultApplVerID (tag 1137) sent on FIXT.1.1 Logon.
    pub default_appl_ver_id: Option<String>,
    /// Maximum message size in bytes.
    pub max_message_size: usize,
    /// Optional sender sub ID (tag 50).
    pub sender_sub_id: Option<String>,
    /// Optional target sub ID (tag 57).
    pub target_sub_id: Option<String>,
    /// Optional sender location ID (tag 142).
    pub sender_location_id: Option<String>,
    /// Optional target location ID (tag 143).
    pub target_location_id: Option<String>,
}

impl SessionConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            role: SessionRole::default(),
            heartbeat_interval: Duration::from_secs(30),
            check_latency: true,
            max_latency: Duration::from_secs(120),
            check_comp_id: true,
            reset_on_logon: false,
            reset_on_logout: false,
            reset_on_disconnect: false,
            reset_on_error: false,
            disconnect_on_error: false,
            refresh_on_logon: false,
            persist_messages: true,
            force_resend_when_corrupted_store: false,
            send_redundant_resend_requests: false,
            resend_request_chunk_size: 0,
            use_closed_resend_interval: true,
            test_request_delay_multiplier: 0.5,
            heartbeat_timeout_multiplier: 2.4,
            disable_heartbeat_check: false,
            validate_incoming_messages: true,
            validate_sequence_numbers: true,
            requires_orig_sending_time: true,
            enable_next_expected_msg_seq_num: false,
            enable_last_msg_seq_num_processed: false,
            reject_invalid_message: true,
            reject_message_on_unhandled_error: false,
            logon_timeout: Duration::from_secs(10),
            logout_timeout: Duration::from_secs(10),
            logon_intervals: vec![Duration::from_secs(30)],
            timestamp_precision: TimestampPrecision::default(),
            schedule: SessionSchedule::default(),
            default_appl_ver_id: None,
            max_message_size: 1024 * 1024, // 1MB
            sender_sub_id: None,
            target_sub_id: None,
            sender_location_id: None,
            target_location_id: None,
        }
    }

    /// Sets the role.
    #[must_use]
    pub const fn with_role(mut self, role: SessionRole) -> Self {
        self.role = role;
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub const fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets latency checking and its tolerance.
    #[must_use]
    pub const fn with_latency_check(mut self, check: bool, max_latency: Duration) -> Self {
        self.check_latency = check;
        self.max_latency = max_latency;
        self
    }

    /// Sets whether to check incoming CompIDs.
    #[must_use]
    pub const fn with_check_comp_id(mut self, check: bool) -> Self {
        self.check_comp_id = check;
        self
    }

    /// Sets whether to reset sequence numbers on logon.
    #[must_use]
    pub const fn with_reset_on_logon(mut self, reset: bool) -> Self {
        self.reset_on_logon = reset;
        self
    }

    /// Sets whether to reset sequence numbers on logout.
    #[must_use]
    pub const fn with_reset_on_logout(mut self, reset: bool) -> Self {
        self.reset_on_logout = reset;
        self
    }

    /// Sets whether to reset sequence numbers on disconnect.
    #[must_use]
    pub const fn with_reset_on_disconnect(mut self, reset: bool) -> Self {
        self.reset_on_disconnect = reset;
        self
    }

    /// Sets whether to reset on a store or decode error.
    #[must_use]
    pub const fn with_reset_on_error(mut self, reset: bool) -> Self {
        self.reset_on_error = reset;
        self
    }

    /// Sets whether to disconnect on a store or decode error.
    #[must_use]
    pub const fn with_disconnect_on_error(mut self, disconnect: bool) -> Self {
        self.disconnect_on_error = disconnect;
        self
    }

    /// Sets whether to refresh the store on logon.
    #[must_use]
    pub const fn with_refresh_on_logon(mut self, refresh: bool) -> Self {
        self.refresh_on_logon = refresh;
        self
    }

    /// Sets whether outgoing messages are persisted.
    #[must_use]
    pub const fn with_persist_messages(mut self, persist: bool) -> Self {
        self.persist_messages = persist;
        self
    }

    /// Sets whether to resend heartbeats when the store cannot be read.
    #[must_use]
    pub const fn with_force_resend_when_corrupted_store(mut self, force: bool) -> Self {
        self.force_resend_when_corrupted_store = force;
        self
    }

    /// Sets whether redundant ResendRequests are sent.
    #[must_use]
    pub const fn with_send_redundant_resend_requests(mut self, send: bool) -> Self {
        self.send_redundant_resend_requests = send;
        self
    }

    /// Sets the ResendRequest chunk size, 0 for no limit.
    #[must_use]
    pub const fn with_resend_request_chunk_size(mut self, size: u64) -> Self {
        self.resend_request_chunk_size = size;
        self
    }

    /// Sets whether ResendRequests use a closed interval.
    #[must_use]
    pub const fn with_closed_resend_interval(mut self, closed: bool) -> Self {
        self.use_closed_resend_interval = closed;
        self
    }

    /// Sets the TestRequest delay multiplier.
    #[must_use]
    pub const fn with_test_request_delay_multiplier(mut self, multiplier: f64) -> Self {
        self.test_request_delay_multiplier = multiplier;
        self
    }

    /// Sets the heartbeat timeout multiplier.
    #[must_use]
    pub const fn with_heartbeat_timeout_multiplier(mut self, multiplier: f64) -> Self {
        self.heartbeat_timeout_multiplier = multiplier;
        self
    }

    /// Sets whether the heartbeat timeout disconnect is skipped.
    #[must_use]
    pub const fn with_disable_heartbeat_check(mut self, disable: bool) -> Self {
        self.disable_heartbeat_check = disable;
        self
    }

    /// Sets whether incoming messages are validated.
    #[must_use]
    pub const fn with_validate_incoming_messages(mut self, validate: bool) -> Self {
        self.validate_incoming_messages = validate;
        self
    }

    /// Sets whether incoming sequence numbers are checked.
    #[must_use]
    pub const fn with_validate_sequence_numbers(mut self, validate: bool) -> Self {
        self.validate_sequence_numbers = validate;
        self
    }

    /// Sets whether PossDup messages require OrigSendingTime.
    #[must_use]
    pub const fn with_requires_orig_sending_time(mut self, requires: bool) -> Self {
        self.requires_orig_sending_time = requires;
        self
    }

    /// Sets whether NextExpectedMsgSeqNum is used on Logon.
    #[must_use]
    pub const fn with_next_expected_msg_seq_num(mut self, enable: bool) -> Self {
        self.enable_next_expected_msg_seq_num = enable;
        self
    }

    /// Sets whether LastMsgSeqNumProcessed is stamped.
    #[must_use]
    pub const fn with_last_msg_seq_num_processed(mut self, enable: bool) -> Self {
        self.enable_last_msg_seq_num_processed = enable;
        self
    }

    /// Sets whether invalid messages are rejected.
    #[must_use]
    pub const fn with_reject_invalid_message(mut self, reject: bool) -> Self {
        self.reject_invalid_message = reject;
        self
    }

    /// Sets whether unexpected application errors reject the message.
    #[must_use]
    pub const fn with_reject_message_on_unhandled_error(mut self, reject: bool) -> Self {
        self.reject_message_on_unhandled_error = reject;
        self
    }

    /// Sets the logon timeout.
    #[must_use]
    pub const fn with_logon_timeout(mut self, timeout: Duration) -> Self {
        self.logon_timeout = timeout;
        self
    }

    /// Sets the logout timeout.
    #[must_use]
    pub const fn with_logout_timeout(mut self, timeout: Duration) -> Self {
        self.logout_timeout = timeout;
        self
    }

    /// Sets the logon retry intervals.
    #[must_use]
    pub fn with_logon_intervals(mut self, intervals: Vec<Duration>) -> Self {
        self.logon_intervals = intervals;
        self
    }

    /// Sets the timestamp precision.
    #[must_use]
    pub const fn with_timestamp_precision(mut self, precision: TimestampPrecision) -> Self {
        self.timestamp_precision = precision;
        self
    }

    /// Sets the schedule.
    #[must_use]
    pub const fn with_schedule(mut self, schedule: SessionSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Sets the DefaultApplVerID.
    #[must_use]
    pub fn with_default_appl_ver_id(mut self, appl_ver_id: impl Into<String>) -> Self {
        self.default_appl_ver_id = Some(appl_ver_id.into());
        self
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets the sender sub ID.
    #[must_use]
    pub fn with_sender_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.sender_sub_id = Some(sub_id.into());
        self
    }

    /// Sets the target sub ID.
    #[must_use]
    pub fn with_target_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.target_sub_id = Some(sub_id.into());
        self
    }

    /// Sets the sender location ID.
    #[must_use]
    pub fn with_sender_location_id(mut self, location_id: impl Into<String>) -> Self {
        self.sender_location_id = Some(location_id.into());
        self
    }

    /// Sets the target location ID.
    #[must_use]
    pub fn with_target_location_id(mut self, location_id: impl Into<String>) -> Self {
        self.target_location_id = Some(location_id.into());
        self
    }

    /// Returns true for initiators.
    #[must_use]
    pub fn is_initiator(&self) -> bool {
        self.role == SessionRole::Initiator
    }

    /// Returns the heartbeat interval in seconds.
    #[must_use]
    pub fn heartbeat_interval_secs(&self) -> u64 {
        self.heartbeat_interval.as_secs()
    }

    /// Checks that the settings are usable together.
    ///
    /// # Errors
    /// [`SessionError::Configuration`] naming the offending setting.
    pub fn validate(&self) -> Result<(), SessionError> {
        let invalid = |reason: &str| Err(SessionError::Configuration(reason.to_string()));
        if self.logon_intervals.is_empty() {
            return invalid("logon intervals must not be empty");
        }
        if self.is_initiator() && self.heartbeat_interval.is_zero() {
            return invalid("initiator heartbeat interval must be positive");
        }
        if !self.test_request_delay_multiplier.is_finite() || self.test_request_delay_multiplier < 0.0
        {
            return invalid("test request delay multiplier must be a non-negative number");
        }
        if !self.heartbeat_timeout_multiplier.is_finite() || self.heartbeat_timeout_multiplier <= 0.0
        {
            return invalid("heartbeat timeout multiplier must be a positive number");
        }
        if self.max_message_size == 0 {
            return invalid("max message size must be positive");
        }
        Ok(())
    }
}

/// Builder for session configuration.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    version: Option<FixVersion>,
    sender_comp_id: Option<String>,
    target_comp_id: Option<String>,
    qualifier: Option<String>,
    role: SessionRole,
    heartbeat_interval: Option<Duration>,
    reset_on_logon: bool,
    schedule: SessionSchedule,
    logon_intervals: Option<Vec<Duration>>,
    resend_request_chunk_size: u64,
    default_appl_ver_id: Option<String>,
    max_message_size: Option<usize>,
}

impl SessionConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the FIX version. Defaults to FIX.4.4.
    #[must_use]
    pub const fn version(mut self, version: FixVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the sender CompID.
    #[must_use]
    pub fn sender_comp_id(mut self, id: impl Into<String>) -> Self {
        self.sender_comp_id = Some(id.into());
        self
    }

    /// Sets the target CompID.
    #[must_use]
    pub fn target_comp_id(mut self, id: impl Into<String>) -> Self {
        self.target_comp_id = Some(id.into());
        self
    }

    /// Sets the session qualifier.
    #[must_use]
    pub fn qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Sets the role.
    #[must_use]
    pub const fn role(mut self, role: SessionRole) -> Self {
        self.role = role;
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub const fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    /// Sets whether to reset on logon.
    #[must_use]
    pub const fn reset_on_logon(mut self, reset: bool) -> Self {
        self.reset_on_logon = reset;
        self
    }

    /// Sets the schedule.
    #[must_use]
    pub const fn schedule(mut self, schedule: SessionSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Sets the logon retry intervals.
    #[must_use]
    pub fn logon_intervals(mut self, intervals: Vec<Duration>) -> Self {
        self.logon_intervals = Some(intervals);
        self
    }

    /// Sets the ResendRequest chunk size.
    #[must_use]
    pub const fn resend_request_chunk_size(mut self, size: u64) -> Self {
        self.resend_request_chunk_size = size;
        self
    }

    /// Sets the DefaultApplVerID.
    #[must_use]
    pub fn default_appl_ver_id(mut self, appl_ver_id: impl Into<String>) -> Self {
        self.default_appl_ver_id = Some(appl_ver_id.into());
        self
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = Some(size);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    /// [`SessionError::Configuration`] when a CompID is missing or invalid,
    /// or when [`SessionConfig::validate`] fails.
    pub fn build(self) -> Result<SessionConfig, SessionError> {
        let comp_id = |value: Option<String>, name: &str| {
            let value = value
                .ok_or_else(|| SessionError::Configuration(format!("{name} is required")))?;
            CompId::new(&value)
                .ok_or_else(|| SessionError::Configuration(format!("invalid {name} {value:?}")))
        };
        let sender = comp_id(self.sender_comp_id, "sender_comp_id")?;
        let target = comp_id(self.target_comp_id, "target_comp_id")?;
        let version = self.version.unwrap_or(FixVersion::Fix44);

        let mut session_id = SessionId::new(version, sender, target);
        if let Some(qualifier) = self.qualifier {
            session_id = session_id.with_qualifier(qualifier);
        }

        let mut config = SessionConfig::new(session_id)
            .with_role(self.role)
            .with_reset_on_logon(self.reset_on_logon)
            .with_schedule(self.schedule)
            .with_resend_request_chunk_size(self.resend_request_chunk_size);
        if let Some(interval) = self.heartbeat_interval {
            config.heartbeat_interval = interval;
        }
        if let Some(intervals) = self.logon_intervals {
            config.logon_intervals = intervals;
        }
        if let Some(size) = self.max_message_size {
            config.max_message_size = size;
        }
        config.default_appl_ver_id = self.default_appl_ver_id;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_id() -> SessionId {
        SessionId::new(
            FixVersion::Fix44,
            CompId::new("SENDER").unwrap(),
            CompId::new("TARGET").unwrap(),
        )
    }

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::new(session_id());

        assert_eq!(config.role, SessionRole::Acceptor);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.max_latency, Duration::from_secs(120));
        assert!(config.check_latency && config.check_comp_id);
        assert!(config.persist_messages);
        assert!(config.use_closed_resend_interval);
        assert_eq!(config.resend_request_chunk_size, 0);
        assert!((config.test_request_delay_multiplier - 0.5).abs() < f64::EPSILON);
        assert!((config.heartbeat_timeout_multiplier - 2.4).abs() < f64::EPSILON);
        assert!(config.requires_orig_sending_time);
        assert!(!config.enable_next_expected_msg_seq_num);
        assert_eq!(config.logon_intervals, vec![Duration::from_secs(30)]);
        assert!(config.schedule.is_non_stop());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_session_config_builder() {
        let config = SessionConfigBuilder::new()
            .version(FixVersion::Fix42)
            .sender_comp_id("SENDER")
            .target_comp_id("TARGET")
            .qualifier("east")
            .role(SessionRole::Initiator)
            .heartbeat_interval(Duration::from_secs(60))
            .reset_on_logon(true)
            .build()
            .unwrap();

        assert_eq!(config.session_id.to_string(), "FIX.4.2:SENDER->TARGET:east");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(60));
        assert!(config.reset_on_logon);
        assert!(config.is_initiator());
    }

    #[test]
    fn test_builder_requires_comp_ids() {
        let err = SessionConfigBuilder::new()
            .sender_comp_id("SENDER")
            .build()
            .unwrap_err();
        assert!(matches!(err, SessionError::Configuration(reason) if reason.contains("target")));

        let too_long = "X".repeat(40);
        assert!(
            SessionConfigBuilder::new()
                .sender_comp_id(too_long)
                .target_comp_id("TARGET")
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_validate_rejects_unusable_settings() {
        let config = SessionConfig::new(session_id()).with_logon_intervals(Vec::new());
        assert!(config.validate().is_err());

        let config = SessionConfig::new(session_id())
            .with_role(SessionRole::Initiator)
            .with_heartbeat_interval(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = SessionConfig::new(session_id()).with_heartbeat_timeout_multiplier(0.0);
        assert!(config.validate().is_err());
    }
}
