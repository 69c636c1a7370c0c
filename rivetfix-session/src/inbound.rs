/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Inbound path: decoding, verification and the per-type handlers.
//!
//! Every handler runs `verify` first. A message that fails verification has
//! already been answered with a Reject, a Logout or a ResendRequest and is
//! not counted. Anything a handler cannot process surfaces as a `Fault`, and
//! each fault maps to exactly one protocol action in `handle_fault`.

use crate::application::ApplicationError;
use crate::listener::SessionStateListener;
use crate::log::printable;
use crate::session::Session;
use crate::state::ResendRange;
use bytes::Bytes;
use rivetfix_core::error::{FieldError, FieldViolation, StoreError};
use rivetfix_core::message::{MsgType, is_admin_msg_type};
use rivetfix_core::reject::{BusinessRejectReason, SessionRejectReason};
use rivetfix_core::tags;
use rivetfix_core::types::FixVersion;
use rivetfix_dictionary::{DataDictionary, ValidationError};
use rivetfix_tagvalue::{Decoder, Message, peek_msg_type};
use std::time::Duration;
use thiserror::Error;

/// Why an inbound message could not be processed normally.
#[derive(Debug, Error)]
pub(crate) enum Fault {
    #[error("required tag {tag} missing")]
    FieldNotFound { tag: u32 },

    #[error("{0}")]
    Field(FieldViolation),

    #[error("unsupported message type")]
    UnsupportedMessageType,

    #[error("incorrect BeginString {received}")]
    UnsupportedVersion { received: String },

    #[error("logon rejected: {text}")]
    RejectLogon { text: String },

    #[error("{reason}")]
    Disconnect { reason: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Application(String),
}

impl From<FieldError> for Fault {
    fn from(err: FieldError) -> Self {
        match err {
            FieldError::NotFound { tag } => Self::FieldNotFound { tag },
            FieldError::Conversion { tag, .. } => Self::Field(FieldViolation::new(
                SessionRejectReason::IncorrectDataFormatForValue,
                tag,
            )),
        }
    }
}

impl From<ApplicationError> for Fault {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::Field(err) => err.into(),
            ApplicationError::IncorrectTagValue { tag } => {
                Self::Field(FieldViolation::new(SessionRejectReason::ValueIsIncorrect, tag))
            }
            ApplicationError::UnsupportedMessageType => Self::UnsupportedMessageType,
            ApplicationError::RejectLogon { text } => Self::RejectLogon { text },
            ApplicationError::Other(reason) => Self::Application(reason),
        }
    }
}

type Flow = Result<(), Fault>;

impl Session {
    /// Processes one framed message read off the wire.
    ///
    /// A message that does not decode is logged and skipped without
    /// touching the target sequence number, so the next good message
    /// exposes the gap.
    pub async fn next_raw(&self, data: Bytes) {
        let _inbound = self.inbound_lock.lock().await;
        self.log.on_incoming(&data);

        let decoded = self.decoder().decode_bytes(data.clone());
        match decoded {
            Ok(message) => self.process(message).await,
            Err(err) => {
                self.log.on_error_event(&format!(
                    "Skipping invalid message: {err}: {}",
                    printable(&data)
                ));
                let msg_type = peek_msg_type(&data).map(|t| String::from_utf8_lossy(t).into_owned());
                let logon = msg_type.as_deref() == Some(MsgType::Logon.as_str());
                if logon && !self.is_logged_on() {
                    self.disconnect("Invalid Logon message", true).await;
                } else {
                    let admin = msg_type.as_deref().is_some_and(is_admin_msg_type);
                    self.reset_or_disconnect_if_required(admin).await;
                }
            }
        }
    }

    /// Processes one parsed message.
    pub async fn next(&self, message: Message) {
        let _inbound = self.inbound_lock.lock().await;
        if let Ok(data) = message.to_bytes() {
            self.log.on_incoming(&data);
        }
        self.process(message).await;
    }

    pub(crate) fn decoder(&self) -> Decoder<'_> {
        let application: &DataDictionary = self
            .application_dictionary
            .as_deref()
            .unwrap_or(&self.session_dictionary);
        Decoder::new()
            .with_session_schema(self.session_dictionary.as_ref())
            .with_app_schema(application)
    }

    async fn process(&self, message: Message) {
        self.process_one(message).await;
        self.drain_queue().await;
        if self.is_logged_on() {
            self.tick().await;
        }
    }

    async fn process_one(&self, message: Message) {
        if let Err(fault) = self.dispatch(&message).await {
            self.handle_fault(&message, fault).await;
        }
    }

    /// Replays queued messages that are now in sequence.
    async fn drain_queue(&self) {
        loop {
            let expected = self.expected_target_num();
            let queued = self.state.lock().dequeue(expected);
            let Some(message) = queued else {
                break;
            };
            self.log
                .on_event(&format!("Processing queued message: {expected}"));
            // The Logon was handled when it arrived; only its number is owed.
            if message.msg_type_str().is_ok_and(|t| t == MsgType::Logon.as_str()) {
                self.incr_target().await;
            } else {
                self.process_one(message).await;
            }
        }
    }

    async fn dispatch(&self, message: &Message) -> Flow {
        let msg_type = message.msg_type()?;
        let begin_string = message.begin_string()?;
        if begin_string != self.session_id().begin_string() {
            return Err(Fault::UnsupportedVersion {
                received: begin_string.to_string(),
            });
        }

        if !message.header().is_set(tags::MSG_SEQ_NUM) {
            let reason = "Received message without MsgSeqNum";
            self.generate_logout(Some(reason), None).await;
            return Err(Fault::Disconnect {
                reason: format!("{reason}: {message}"),
            });
        }

        if !self.config.schedule.is_session_time(self.now()) {
            if msg_type == MsgType::Logon {
                return Err(Fault::Disconnect {
                    reason: "Logon attempt not within session time".to_string(),
                });
            }
            self.log.on_event("Message received outside of session time");
            self.reset().await?;
            return Ok(());
        }

        self.validate(message, msg_type.is_admin())?;

        match msg_type {
            MsgType::Logon => self.on_logon(message).await,
            MsgType::Heartbeat => self.on_heartbeat(message).await,
            MsgType::TestRequest => self.on_test_request(message).await,
            MsgType::ResendRequest => self.on_resend_request(message).await,
            MsgType::Reject => self.on_reject(message).await,
            MsgType::SequenceReset => self.on_sequence_reset(message).await,
            MsgType::Logout => self.on_logout(message).await,
            _ => self.on_app(message).await,
        }
    }

    /// Checks the message against the dictionaries.
    ///
    /// Session messages are always checked against the session dictionary.
    /// Application messages are checked only when an application dictionary
    /// is configured.
    fn validate(&self, message: &Message, admin: bool) -> Flow {
        if !self.config.validate_incoming_messages {
            return Ok(());
        }
        let session = self.session_dictionary.as_ref();
        let result = if admin {
            session.validate_message(message)
        } else if let Some(application) = self.application_dictionary.as_deref() {
            DataDictionary::validate(message, Some(session), application)
        } else {
            return Ok(());
        };

        match result {
            Ok(()) => Ok(()),
            Err(ValidationError::UnsupportedVersion { received, .. }) => {
                Err(Fault::UnsupportedVersion { received })
            }
            Err(ValidationError::Violation(violation)) => {
                let present = violation.tag == 0 || message.is_set_anywhere(violation.tag);
                if present && !self.config.reject_invalid_message {
                    self.log.on_error_event(&format!(
                        "Warn: incoming message with {violation}: {message}"
                    ));
                    Ok(())
                } else {
                    Err(Fault::Field(violation))
                }
            }
        }
    }

    fn valid_logon_state(&self, msg_type: &MsgType) -> bool {
        let state = self.state.lock();
        let logon = *msg_type == MsgType::Logon;
        (logon && state.is_reset_sent())
            || state.is_reset_received()
            || (logon && !state.is_logon_received())
            || (!logon && state.is_logon_received())
            || (*msg_type == MsgType::Logout && state.is_logon_sent())
            || (*msg_type != MsgType::Logout && state.is_logout_sent())
            || *msg_type == MsgType::SequenceReset
            || *msg_type == MsgType::Reject
    }

    fn is_good_time(&self, message: &Message) -> Result<bool, Fault> {
        if !self.config.check_latency {
            return Ok(true);
        }
        let sending_time = message.header().get_utc_timestamp(tags::SENDING_TIME)?;
        let now = self.now();
        let skew = if now >= sending_time {
            now - sending_time
        } else {
            sending_time - now
        };
        Ok(skew
            .to_std()
            .is_ok_and(|skew| skew <= self.config.max_latency))
    }

    fn is_correct_comp_id(&self, message: &Message) -> Result<bool, Fault> {
        if !self.config.check_comp_id {
            return Ok(true);
        }
        let header = message.header();
        let sender = header.get_str(tags::SENDER_COMP_ID)?;
        let target = header.get_str(tags::TARGET_COMP_ID)?;
        let id = self.session_id();
        Ok(sender == id.target_comp_id() && target == id.sender_comp_id())
    }

    /// Common checks run before a message is handed to a handler.
    ///
    /// Returns false when the message was answered here and must not be
    /// processed further. On success the application callback has run.
    async fn verify(
        &self,
        message: &Message,
        check_too_high: bool,
        check_too_low: bool,
    ) -> Result<bool, Fault> {
        let msg_type = message.msg_type()?;
        let seq = message.seq_num()?;

        if !self.valid_logon_state(&msg_type) {
            return Err(Fault::Disconnect {
                reason: format!("Logon state is not valid for message (MsgType={msg_type})"),
            });
        }

        if !self.is_good_time(message)? {
            self.generate_reject(message, SessionRejectReason::SendingTimeAccuracyProblem, 0)
                .await;
            self.generate_logout(None, None).await;
            return Ok(false);
        }

        if !self.is_correct_comp_id(message)? {
            self.generate_reject(message, SessionRejectReason::CompIdProblem, 0)
                .await;
            self.generate_logout(None, None).await;
            return Ok(false);
        }

        let validate = self.config.validate_sequence_numbers;
        let expected = self.expected_target_num();
        if validate && check_too_high && seq > expected {
            self.do_target_too_high(message, seq).await;
            return Ok(false);
        }
        if validate && check_too_low && seq < expected {
            self.do_target_too_low(message, seq, expected).await?;
            return Ok(false);
        }

        let checks_seq = check_too_high || check_too_low;
        if checks_seq && message.is_poss_dup() && !self.validate_poss_dup(message).await? {
            return Ok(false);
        }
        if checks_seq && msg_type != MsgType::SequenceReset {
            self.check_resend_progress(seq).await;
        }

        self.state.lock().on_message_received(self.now());

        let id = self.session_id();
        if msg_type.is_admin() {
            self.application.from_admin(message, id).await?;
        } else {
            self.application.from_app(message, id).await?;
        }
        Ok(true)
    }

    async fn do_target_too_high(&self, message: &Message, seq: u64) {
        let expected = self.expected_target_num();
        self.log.on_error_event(&format!(
            "MsgSeqNum too high, expecting {expected} but received {seq}: {message}"
        ));
        self.state.lock().enqueue(seq, message.clone());
        self.request_resend_for(seq).await;
    }

    /// Asks for everything between the expected target and `seq`, unless an
    /// outstanding request already covers it.
    async fn request_resend_for(&self, seq: u64) {
        let outstanding = self.state.lock().resend_range();
        if let Some(range) = outstanding
            && !self.config.send_redundant_resend_requests
            && seq >= range.begin
        {
            self.log.on_event(&format!(
                "Already sent ResendRequest FROM: {} TO: {}. Not sending another.",
                range.begin, range.end
            ));
            return;
        }
        let expected = self.expected_target_num();
        self.send_resend_request(expected, seq.saturating_sub(1))
            .await;
    }

    async fn do_target_too_low(&self, message: &Message, seq: u64, expected: u64) -> Flow {
        if !message.is_poss_dup() {
            let text = format!("MsgSeqNum too low, expecting {expected} but received {seq}");
            self.generate_logout(Some(&text), None).await;
            return Err(Fault::Disconnect { reason: text });
        }
        self.validate_poss_dup(message).await?;
        Ok(())
    }

    /// A possible duplicate must not claim to be older than its original.
    async fn validate_poss_dup(&self, message: &Message) -> Result<bool, Fault> {
        if message.msg_type_str()? == MsgType::SequenceReset.as_str() {
            return Ok(true);
        }
        let header = message.header();
        if header.is_set(tags::ORIG_SENDING_TIME) {
            let original = header.get_utc_timestamp(tags::ORIG_SENDING_TIME)?;
            let sending = header.get_utc_timestamp(tags::SENDING_TIME)?;
            if original > sending {
                self.generate_reject(message, SessionRejectReason::SendingTimeAccuracyProblem, 0)
                    .await;
                self.generate_logout(None, None).await;
                return Ok(false);
            }
        } else if self.config.requires_orig_sending_time {
            self.generate_reject(
                message,
                SessionRejectReason::RequiredTagMissing,
                tags::ORIG_SENDING_TIME,
            )
            .await;
            return Ok(false);
        }
        Ok(true)
    }

    /// Clears a satisfied ResendRequest or asks for its next chunk.
    async fn check_resend_progress(&self, seq: u64) {
        let range = self.state.lock().resend_range();
        let Some(range) = range else {
            return;
        };
        if seq >= range.end {
            self.resend_satisfied(range);
        } else if range.chunk_end != 0 && seq >= range.chunk_end {
            self.send_resend_request(seq + 1, range.end).await;
        }
    }

    fn resend_satisfied(&self, range: ResendRange) {
        self.log.on_event(&format!(
            "ResendRequest for messages FROM {} TO {} has been satisfied.",
            range.begin, range.end
        ));
        self.state.lock().set_resend_range(None);
        self.listeners
            .on_resend_request_satisfied(self.session_id(), range.begin, range.end);
    }

    /// Counts a message that is not subject to gap detection, or asks for
    /// the gap in front of it.
    async fn advance_or_request(&self, seq: u64) {
        let expected = self.expected_target_num();
        if seq == expected {
            self.incr_target().await;
        } else if seq > expected && self.config.validate_sequence_numbers {
            self.request_resend_for(seq).await;
        }
    }

    async fn on_logon(&self, logon: &Message) -> Flow {
        let seq = logon.seq_num()?;
        let initiator = self.config.is_initiator();

        if self.config.refresh_on_logon && !initiator {
            self.refresh().await?;
        }

        let body = logon.body();
        let reset_sent = self.state.lock().is_reset_sent();
        if body.is_set(tags::RESET_SEQ_NUM_FLAG) {
            let flag = body.get_bool(tags::RESET_SEQ_NUM_FLAG)?;
            self.state.lock().set_reset_received(flag);
        } else if reset_sent && seq == 1 {
            self.log.on_event(
                "Inferring ResetSeqNumFlag as sequence number is 1 in response to reset request",
            );
            self.state.lock().set_reset_received(true);
        }

        let reset_received = self.state.lock().is_reset_received();
        if reset_sent && !reset_received {
            return Err(Fault::Disconnect {
                reason: "Received logon response without ResetSeqNumFlag after requesting a reset"
                    .to_string(),
            });
        }
        if reset_received {
            self.log
                .on_event("Logon contains ResetSeqNumFlag=Y, resetting sequence numbers to 1");
            if !reset_sent {
                self.reset_state().await?;
            }
        }

        let logon_sent = self.state.lock().is_logon_sent();
        if initiator && !logon_sent && !reset_received {
            return Err(Fault::Disconnect {
                reason: "Received logon response before sending request".to_string(),
            });
        }
        if !initiator && self.config.reset_on_logon {
            self.reset_state().await?;
        }

        if !self.verify(logon, false, !reset_received).await? {
            return Ok(());
        }
        let heartbeat = body.get_u64(tags::HEART_BT_INT)?;

        let now = self.now();
        {
            let mut state = self.state.lock();
            state.set_logout_received(false);
            state.set_logout_sent(false, now);
            state.set_logon_received(true);
        }

        let next_sender_at_logon = self.expected_sender_num();
        let too_high = seq > self.expected_target_num();
        let in_sequence = !(too_high && !self.config.reset_on_logon);

        let wanted = if self.config.enable_next_expected_msg_seq_num
            && body.is_set(tags::NEXT_EXPECTED_MSG_SEQ_NUM)
        {
            Some(body.get_u64(tags::NEXT_EXPECTED_MSG_SEQ_NUM)?)
        } else {
            None
        };
        if let Some(wanted) = wanted
            && wanted > next_sender_at_logon
        {
            let text = format!(
                "Tag 789 (NextExpectedMsgSeqNum) is higher than expected. \
                 Expected {next_sender_at_logon}, Received {wanted}"
            );
            self.generate_logout(Some(&text), None).await;
            return Err(Fault::Disconnect { reason: text });
        }

        self.log.on_event("Received logon");
        if !initiator || (reset_received && !reset_sent) {
            if !initiator {
                self.state
                    .lock()
                    .set_heartbeat_interval(Duration::from_secs(heartbeat));
            }
            let next_expected = self.expected_target_num() + u64::from(in_sequence);
            self.generate_logon_response(logon, next_expected).await;
        } else {
            self.log.on_event("Received logon response");
        }

        {
            let mut state = self.state.lock();
            state.set_reset_sent(false);
            state.set_reset_received(false);
        }

        if !in_sequence && self.config.validate_sequence_numbers {
            let sent_789 = self.state.lock().next_expected_at_logon();
            if self.config.enable_next_expected_msg_seq_num && sent_789 > 0 {
                // The 789 we sent already asks for the gap.
                self.state.lock().set_resend_range(Some(ResendRange {
                    begin: sent_789,
                    end: seq - 1,
                    chunk_end: 0,
                }));
                self.log
                    .on_event("Required resend will be suppressed as we are setting tag 789");
            }
            self.do_target_too_high(logon, seq).await;
        } else {
            self.incr_target().await;
        }

        if let Some(wanted) = wanted
            && wanted < next_sender_at_logon
        {
            let end = next_sender_at_logon - 1;
            self.log.on_event(&format!(
                "Received implicit ResendRequest via Logon FROM: {wanted} TO: {end}"
            ));
            self.resend_between(logon, wanted, end).await?;
        }

        if self.is_logged_on() {
            self.application.on_logon(self.session_id()).await;
            self.listeners.on_logon(self.session_id());
            self.state.lock().clear_logon_attempts();
        }
        Ok(())
    }

    async fn on_heartbeat(&self, message: &Message) -> Flow {
        if self.verify(message, true, true).await? {
            self.incr_target().await;
        }
        Ok(())
    }

    async fn on_test_request(&self, message: &Message) -> Flow {
        if !self.verify(message, true, true).await? {
            return Ok(());
        }
        let id = message.body().get_str(tags::TEST_REQ_ID).ok();
        self.generate_heartbeat(id).await;
        self.incr_target().await;
        Ok(())
    }

    async fn on_resend_request(&self, message: &Message) -> Flow {
        if !self.verify(message, false, false).await? {
            return Ok(());
        }
        let body = message.body();
        let begin = body.get_u64(tags::BEGIN_SEQ_NO)?;
        let end = body.get_u64(tags::END_SEQ_NO)?;
        self.log
            .on_event(&format!("Received ResendRequest FROM: {begin} TO: {end}"));
        self.manage_gap_fill(message, begin, end).await?;
        self.advance_or_request(message.seq_num()?).await;
        Ok(())
    }

    async fn on_reject(&self, message: &Message) -> Flow {
        if !self.verify(message, false, false).await? {
            return Ok(());
        }
        self.advance_or_request(message.seq_num()?).await;
        Ok(())
    }

    async fn on_sequence_reset(&self, message: &Message) -> Flow {
        let body = message.body();
        let gap_fill_flag =
            body.is_set(tags::GAP_FILL_FLAG) && body.get_bool(tags::GAP_FILL_FLAG)?;
        let gap_fill = gap_fill_flag && self.config.validate_sequence_numbers;
        if !self.verify(message, gap_fill, gap_fill).await? {
            return Ok(());
        }
        if !self.config.validate_sequence_numbers {
            return Ok(());
        }

        let new_seq = body.get_u64(tags::NEW_SEQ_NO)?;
        let expected = self.expected_target_num();
        self.log
            .on_event(&format!("Received SequenceReset FROM: {expected} TO: {new_seq}"));

        if new_seq > expected {
            self.store.set_next_target_seq_num(new_seq).await?;
            self.listeners
                .on_sequence_reset_received(self.session_id(), new_seq, gap_fill_flag);
            let range = self.state.lock().resend_range();
            if let Some(range) = range {
                if new_seq > range.end {
                    self.resend_satisfied(range);
                } else if range.chunk_end != 0 && new_seq > range.chunk_end {
                    self.send_resend_request(new_seq, range.end).await;
                }
            }
        } else if new_seq < expected {
            self.log.on_error_event(&format!(
                "Invalid SequenceReset: newSequence={new_seq} < expected={expected}"
            ));
            self.generate_reject(message, SessionRejectReason::ValueIsIncorrect, tags::NEW_SEQ_NO)
                .await;
        }
        Ok(())
    }

    async fn on_logout(&self, message: &Message) -> Flow {
        if !self.verify(message, false, false).await? {
            return Ok(());
        }
        let logout_sent = self.state.lock().is_logout_sent();
        let reason = if logout_sent {
            let reason = "Received logout response".to_string();
            self.log.on_event(&reason);
            reason
        } else {
            let reason = match message.body().get_str(tags::TEXT) {
                Ok(text) => format!("Received logout request: {text}"),
                Err(_) => "Received logout request".to_string(),
            };
            self.log.on_event(&reason);
            self.generate_logout(None, Some(message)).await;
            self.log.on_event("Sent logout response");
            reason
        };

        self.state.lock().set_logout_received(true);
        if message.seq_num()? == self.expected_target_num() {
            self.incr_target().await;
        }
        if self.config.reset_on_logout {
            self.reset_state().await?;
        }
        self.disconnect(&reason, false).await;
        Ok(())
    }

    async fn on_app(&self, message: &Message) -> Flow {
        if self.verify(message, true, true).await? {
            self.incr_target().await;
        }
        Ok(())
    }

    /// Applies the configured error policy to a failed application message.
    ///
    /// Returns true if the session was reset or disconnected.
    async fn reset_or_disconnect_if_required(&self, admin: bool) -> bool {
        let config = &self.config;
        if !config.reset_on_error && !config.disconnect_on_error {
            return false;
        }
        if admin || !self.is_logged_on() {
            return false;
        }
        if config.reset_on_error {
            self.log.on_error_event("Auto reset");
            if let Err(err) = self.reset().await {
                self.log
                    .on_error_event(&format!("Auto reset failed: {err}"));
            }
        } else {
            self.disconnect("Auto disconnect", false).await;
        }
        true
    }

    async fn handle_fault(&self, message: &Message, fault: Fault) {
        let msg_type = message.msg_type_str().unwrap_or_default().to_string();
        let logon = msg_type == MsgType::Logon.as_str();
        let admin = is_admin_msg_type(&msg_type);
        let fix42 = self.session_id().version() >= FixVersion::Fix42;

        let fault = match fault {
            Fault::RejectLogon { text } if !logon => Fault::Application(text),
            other => other,
        };

        match fault {
            Fault::Field(violation) => {
                self.log.on_error_event(&format!(
                    "Rejecting invalid message: {violation}: {message}"
                ));
                if self.reset_or_disconnect_if_required(admin).await {
                    return;
                }
                if logon {
                    let text = format!("Invalid Logon message: {violation}");
                    self.generate_logout(Some(&text), None).await;
                    self.incr_target().await;
                    self.disconnect(&text, true).await;
                } else {
                    self.generate_reject(message, violation.reason, violation.tag)
                        .await;
                }
            }
            Fault::FieldNotFound { tag } => {
                self.log.on_error_event(&format!(
                    "Rejecting invalid message: required tag {tag} missing: {message}"
                ));
                if self.reset_or_disconnect_if_required(admin).await {
                    return;
                }
                if fix42 && !admin {
                    self.generate_business_reject(
                        message,
                        BusinessRejectReason::ConditionallyRequiredFieldMissing,
                        tag,
                    )
                    .await;
                } else if logon {
                    self.disconnect("Required field missing from logon", true)
                        .await;
                } else {
                    self.generate_reject(message, SessionRejectReason::RequiredTagMissing, tag)
                        .await;
                }
            }
            Fault::UnsupportedMessageType => {
                if self.reset_or_disconnect_if_required(admin).await {
                    return;
                }
                if fix42 {
                    self.generate_business_reject(
                        message,
                        BusinessRejectReason::UnsupportedMessageType,
                        0,
                    )
                    .await;
                } else {
                    self.generate_reject(message, SessionRejectReason::InvalidMsgType, 0)
                        .await;
                }
            }
            Fault::UnsupportedVersion { received } => {
                let reason = format!("Incorrect BeginString: {received}");
                if msg_type == MsgType::Logout.as_str() {
                    self.disconnect(&reason, true).await;
                } else {
                    self.generate_logout(Some(&reason), None).await;
                    self.incr_target().await;
                    self.disconnect(&reason, true).await;
                }
            }
            Fault::RejectLogon { text } => {
                self.log.on_error_event(&format!("Logon rejected: {text}"));
                let text = (!text.is_empty()).then_some(text);
                self.generate_logout(text.as_deref(), None).await;
                if message
                    .seq_num()
                    .is_ok_and(|seq| seq == self.expected_target_num())
                {
                    self.incr_target().await;
                }
                self.disconnect("Logon rejected", true).await;
            }
            Fault::Disconnect { reason } => {
                self.disconnect(&reason, true).await;
            }
            Fault::Store(err) => {
                self.log.on_error_event(&format!(
                    "Error processing message: {err}: {message}"
                ));
                self.reset_or_disconnect_if_required(admin).await;
            }
            Fault::Application(reason) => {
                if !self.config.reject_message_on_unhandled_error {
                    self.log.on_error_event(&format!(
                        "Unhandled application error: {reason}: {message}"
                    ));
                    return;
                }
                self.log
                    .on_error_event(&format!("Rejecting message: {reason}: {message}"));
                if self.reset_or_disconnect_if_required(admin).await {
                    return;
                }
                if fix42 && !admin {
                    self.generate_business_reject(
                        message,
                        BusinessRejectReason::ApplicationNotAvailable,
                        0,
                    )
                    .await;
                } else if logon {
                    self.disconnect("Problem processing Logon message", true)
                        .await;
                } else {
                    self.generate_reject(message, SessionRejectReason::Other, 0)
                        .await;
                }
            }
        }
    }
}
