/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Outbound path: header stamping, persistence and the session-level
//! message generators.

use crate::listener::SessionStateListener;
use crate::session::Session;
use crate::state::ResendRange;
use bytes::Bytes;
use rivetfix_core::message::MsgType;
use rivetfix_core::reject::{BusinessRejectReason, SessionRejectReason};
use rivetfix_core::tags;
use rivetfix_core::types::FixVersion;
use rivetfix_tagvalue::Message;
use tokio::sync::MutexGuard;

/// Proof that the caller holds the sender lock.
pub(crate) type SenderGuard<'a> = MutexGuard<'a, ()>;

impl Session {
    /// Sends an application or session message.
    ///
    /// PossDupFlag and OrigSendingTime are stripped, the header is stamped
    /// and the message gets the next sender sequence number. It is stored
    /// and the sequence number consumed even when not logged on, so that it
    /// can be resent later. Returns false if the application vetoed the
    /// message, if it could not be encoded, or if the transport did not take
    /// it.
    pub async fn send(&self, mut message: Message) -> bool {
        let header = message.header_mut();
        header.remove(tags::POSS_DUP_FLAG);
        header.remove(tags::ORIG_SENDING_TIME);
        self.send_raw(message, None).await
    }

    /// Sends a message stamped with a new sequence number, or with
    /// `seq_num` when one is given. Explicitly numbered messages are neither
    /// stored nor counted.
    pub(crate) async fn send_raw(&self, message: Message, seq_num: Option<u64>) -> bool {
        let guard = self.sender_lock.lock().await;
        self.send_raw_locked(message, seq_num, &guard).await
    }

    pub(crate) async fn send_raw_locked(
        &self,
        mut message: Message,
        seq_num: Option<u64>,
        _sender: &SenderGuard<'_>,
    ) -> bool {
        let msg_type = match message.msg_type() {
            Ok(msg_type) => msg_type,
            Err(err) => {
                self.log
                    .on_error_event(&format!("Refusing to send message without MsgType: {err}"));
                return false;
            }
        };

        let mut seq = self.initialize_header(&mut message);
        if let Some(explicit) = seq_num {
            seq = explicit;
            message.header_mut().set_u64(tags::MSG_SEQ_NUM, seq);
        }

        if msg_type.is_admin() {
            self.application
                .to_admin(&mut message, self.session_id())
                .await;
            let reset_received = self.state.lock().is_reset_received();
            if msg_type == MsgType::Logon && !reset_received {
                let reset = message
                    .body()
                    .get_bool(tags::RESET_SEQ_NUM_FLAG)
                    .unwrap_or(false);
                if reset {
                    if let Err(err) = self.reset_state().await {
                        self.log
                            .on_error_event(&format!("Failed to reset store for Logon: {err}"));
                        return false;
                    }
                    seq = self.expected_sender_num();
                    let header = message.header_mut();
                    header.set_u64(tags::MSG_SEQ_NUM, seq);
                    if self.config.enable_last_msg_seq_num_processed {
                        header.set_u64(tags::LAST_MSG_SEQ_NUM_PROCESSED, 0);
                    }
                }
                self.state.lock().set_reset_sent(reset);
            }
        } else if self
            .application
            .to_app(&mut message, self.session_id())
            .await
            .is_err()
        {
            return false;
        }

        let data = match message.to_bytes() {
            Ok(data) => data,
            Err(err) => {
                self.log.on_error_event(&format!(
                    "Failed to encode outgoing {msg_type} message: {err}"
                ));
                return false;
            }
        };

        let always_sent = matches!(
            msg_type,
            MsgType::Logon | MsgType::Logout | MsgType::ResendRequest | MsgType::SequenceReset
        );
        let sent = if always_sent || self.is_logged_on() {
            self.transmit(data.clone())
        } else {
            false
        };

        if seq_num.is_none() {
            if self.config.persist_messages
                && let Err(err) = self.store.set(seq, data).await
            {
                self.log
                    .on_error_event(&format!("Failed to store message {seq}: {err}"));
            }
            if let Err(err) = self.store.incr_next_sender_seq_num().await {
                self.log
                    .on_error_event(&format!("Failed to advance sender sequence number: {err}"));
            }
        }
        sent
    }

    /// Hands serialized bytes to the transport.
    pub(crate) fn transmit(&self, data: Bytes) -> bool {
        let Some(responder) = self.responder() else {
            self.log.on_event("No responder, not sending message");
            return false;
        };
        self.log.on_outgoing(&data);
        self.state.lock().on_message_sent(self.now());
        responder.send(data)
    }

    /// Stamps the standard header and returns the sequence number used.
    pub(crate) fn initialize_header(&self, message: &mut Message) -> u64 {
        let seq = self.expected_sender_num();
        let target = self.expected_target_num();
        let now = self.now();
        let id = self.session_id();
        let config = &self.config;

        let header = message.header_mut();
        header.set_str(tags::BEGIN_STRING, id.begin_string());
        header.set_str(tags::SENDER_COMP_ID, id.sender_comp_id());
        if let Some(sub_id) = &config.sender_sub_id {
            header.set_str(tags::SENDER_SUB_ID, sub_id);
        }
        if let Some(location_id) = &config.sender_location_id {
            header.set_str(tags::SENDER_LOCATION_ID, location_id);
        }
        header.set_str(tags::TARGET_COMP_ID, id.target_comp_id());
        if let Some(sub_id) = &config.target_sub_id {
            header.set_str(tags::TARGET_SUB_ID, sub_id);
        }
        if let Some(location_id) = &config.target_location_id {
            header.set_str(tags::TARGET_LOCATION_ID, location_id);
        }
        header.set_u64(tags::MSG_SEQ_NUM, seq);
        header.set_utc_timestamp(tags::SENDING_TIME, &now, config.timestamp_precision);
        if config.enable_last_msg_seq_num_processed && !header.is_set(tags::LAST_MSG_SEQ_NUM_PROCESSED)
        {
            header.set_u64(tags::LAST_MSG_SEQ_NUM_PROCESSED, target.saturating_sub(1));
        }
        seq
    }

    fn is_reset_needed(&self) -> bool {
        let config = &self.config;
        self.session_id().version() >= FixVersion::Fix41
            && (config.reset_on_logon || config.reset_on_logout || config.reset_on_disconnect)
            && self.expected_sender_num() == 1
            && self.expected_target_num() == 1
    }

    fn with_default_appl_ver_id(&self, logon: &mut Message) {
        if self.session_id().is_fixt()
            && let Some(appl_ver_id) = &self.config.default_appl_ver_id
        {
            logon
                .body_mut()
                .set_str(tags::DEFAULT_APPL_VER_ID, appl_ver_id);
        }
    }

    /// Sends the initiator's Logon.
    pub(crate) async fn generate_logon(&self) -> bool {
        if self.config.refresh_on_logon
            && let Err(err) = self.refresh().await
        {
            self.log
                .on_error_event(&format!("Failed to refresh store at logon: {err}"));
        }
        if self.config.reset_on_logon
            && let Err(err) = self.reset_state().await
        {
            self.log
                .on_error_event(&format!("Failed to reset store at logon: {err}"));
            return false;
        }

        let mut logon = Message::with_type(&MsgType::Logon);
        {
            let body = logon.body_mut();
            body.set_u64(tags::ENCRYPT_METHOD, 0);
            body.set_u64(tags::HEART_BT_INT, self.config.heartbeat_interval_secs());
            if self.is_reset_needed() {
                body.set_bool(tags::RESET_SEQ_NUM_FLAG, true);
            }
        }
        self.with_default_appl_ver_id(&mut logon);
        if self.config.enable_next_expected_msg_seq_num {
            let next = self.expected_target_num();
            logon.body_mut().set_u64(tags::NEXT_EXPECTED_MSG_SEQ_NUM, next);
            self.state.lock().set_next_expected_at_logon(next);
        }

        let now = self.now();
        {
            let mut state = self.state.lock();
            state.on_logon_attempt(now);
            state.set_logon_sent(true);
        }
        self.send_raw(logon, None).await
    }

    /// Answers a received Logon.
    pub(crate) async fn generate_logon_response(&self, received: &Message, next_expected: u64) {
        let (reset_received, heartbeat) = {
            let state = self.state.lock();
            (state.is_reset_received(), state.heartbeat_interval().as_secs())
        };

        let mut logon = Message::with_type(&MsgType::Logon);
        {
            let body = logon.body_mut();
            body.set_u64(tags::ENCRYPT_METHOD, 0);
            body.set_u64(tags::HEART_BT_INT, heartbeat);
            if reset_received {
                body.set_bool(tags::RESET_SEQ_NUM_FLAG, true);
            }
        }
        self.with_default_appl_ver_id(&mut logon);
        if self.config.enable_last_msg_seq_num_processed
            && let Ok(seq) = received.seq_num()
        {
            logon
                .header_mut()
                .set_u64(tags::LAST_MSG_SEQ_NUM_PROCESSED, seq);
        }
        if self.config.enable_next_expected_msg_seq_num {
            logon
                .body_mut()
                .set_u64(tags::NEXT_EXPECTED_MSG_SEQ_NUM, next_expected);
            self.state.lock().set_next_expected_at_logon(next_expected);
            self.log.on_event(&format!(
                "Responding to Logon request with tag 789={next_expected}"
            ));
        } else {
            self.log.on_event("Responding to Logon request");
        }

        self.send_raw(logon, None).await;
        self.state.lock().set_logon_sent(true);
    }

    /// Sends Logout and starts the logout timer.
    pub(crate) async fn generate_logout(&self, text: Option<&str>, received: Option<&Message>) {
        let mut logout = Message::with_type(&MsgType::Logout);
        if let Some(text) = text {
            logout.body_mut().set_str(tags::TEXT, text);
        }
        if self.config.enable_last_msg_seq_num_processed
            && let Some(Ok(seq)) = received.map(Message::seq_num)
        {
            logout
                .header_mut()
                .set_u64(tags::LAST_MSG_SEQ_NUM_PROCESSED, seq);
        }
        let now = self.now();
        self.send_raw(logout, None).await;
        self.state.lock().set_logout_sent(true, now);
    }

    /// Sends a Heartbeat, echoing `test_req_id` when answering a TestRequest.
    pub(crate) async fn generate_heartbeat(&self, test_req_id: Option<&str>) {
        let mut heartbeat = Message::with_type(&MsgType::Heartbeat);
        if let Some(id) = test_req_id {
            heartbeat.body_mut().set_str(tags::TEST_REQ_ID, id);
        }
        self.send_raw(heartbeat, None).await;
    }

    pub(crate) async fn generate_test_request(&self, id: &str) {
        let mut request = Message::with_type(&MsgType::TestRequest);
        request.body_mut().set_str(tags::TEST_REQ_ID, id);
        self.send_raw(request, None).await;
        self.state.lock().on_test_request_sent();
    }

    /// Sends a session-level Reject for `message`.
    ///
    /// The target sequence number advances unless the rejected message is a
    /// Logon, a SequenceReset or a possible duplicate.
    pub(crate) async fn generate_reject(
        &self,
        message: &Message,
        reason: SessionRejectReason,
        tag: u32,
    ) {
        let header = message.header();
        let msg_type = header.get_str(tags::MSG_TYPE).unwrap_or_default().to_string();
        let ref_seq = header.get_u64(tags::MSG_SEQ_NUM).unwrap_or(0);

        let mut reject = Message::with_type(&MsgType::Reject);
        reject.reverse_route(header);
        let body = reject.body_mut();
        body.set_u64(tags::REF_SEQ_NUM, ref_seq);
        if self.session_id().version() >= FixVersion::Fix42 {
            if !msg_type.is_empty() {
                body.set_str(tags::REF_MSG_TYPE, &msg_type);
            }
            body.set_u64(tags::SESSION_REJECT_REASON, u64::from(reason.code()));
            if tag > 0 {
                body.set_u64(tags::REF_TAG_ID, u64::from(tag));
            }
            body.set_str(tags::TEXT, reason.text());
        } else if tag > 0 {
            body.set_str(tags::TEXT, &format!("{} ({tag})", reason.text()));
        } else {
            body.set_str(tags::TEXT, reason.text());
        }

        let counts = msg_type != MsgType::Logon.as_str()
            && msg_type != MsgType::SequenceReset.as_str()
            && !message.is_poss_dup();
        if counts {
            self.incr_target().await;
        }

        if tag > 0 {
            self.log.on_error_event(&format!(
                "Reject sent for message {ref_seq}: {}:{tag}",
                reason.text()
            ));
        } else {
            self.log
                .on_error_event(&format!("Reject sent for message {ref_seq}: {}", reason.text()));
        }
        self.send_raw(reject, None).await;
    }

    /// Sends a BusinessMessageReject for `message` and advances the target
    /// sequence number.
    pub(crate) async fn generate_business_reject(
        &self,
        message: &Message,
        reason: BusinessRejectReason,
        tag: u32,
    ) {
        let msg_type = message.msg_type_str().unwrap_or_default().to_string();
        let ref_seq = message.seq_num().unwrap_or(0);
        let text = if tag > 0 {
            format!("{} ({tag})", reason.text())
        } else {
            reason.text().to_string()
        };

        let mut reject = Message::with_type(&MsgType::BusinessMessageReject);
        let body = reject.body_mut();
        body.set_u64(tags::REF_SEQ_NUM, ref_seq);
        body.set_str(tags::REF_MSG_TYPE, &msg_type);
        body.set_u64(tags::BUSINESS_REJECT_REASON, u64::from(reason.code()));
        body.set_str(tags::TEXT, &text);

        self.incr_target().await;
        self.log
            .on_error_event(&format!("Reject sent for message {ref_seq}: {text}"));
        self.send_raw(reject, None).await;
    }

    /// Sends a gap-fill SequenceReset numbered `begin` that moves the
    /// counterparty to `new_seq`.
    pub(crate) async fn generate_sequence_reset(
        &self,
        received: Option<&Message>,
        begin: u64,
        new_seq: u64,
        sender: &SenderGuard<'_>,
    ) {
        let now = self.now();
        let mut reset = Message::with_type(&MsgType::SequenceReset);
        {
            let header = reset.header_mut();
            header.set_bool(tags::POSS_DUP_FLAG, true);
            header.set_utc_timestamp(
                tags::ORIG_SENDING_TIME,
                &now,
                self.config.timestamp_precision,
            );
            if self.config.enable_last_msg_seq_num_processed
                && let Some(Ok(seq)) = received.map(Message::seq_num)
            {
                header.set_u64(tags::LAST_MSG_SEQ_NUM_PROCESSED, seq);
            }
        }
        let body = reset.body_mut();
        body.set_bool(tags::GAP_FILL_FLAG, true);
        body.set_u64(tags::NEW_SEQ_NO, new_seq);

        self.send_raw_locked(reset, Some(begin), sender).await;
        self.log
            .on_event(&format!("Sent SequenceReset TO: {new_seq}"));
    }

    /// Requests `begin..=end` from the counterparty, in chunks when a chunk
    /// size is configured, and records the outstanding range.
    pub(crate) async fn send_resend_request(&self, begin: u64, end: u64) {
        let chunk_size = self.config.resend_request_chunk_size;
        let chunk_end = if chunk_size == 0 {
            end
        } else {
            begin.saturating_add(chunk_size - 1).min(end)
        };
        let open_ended = !self.config.use_closed_resend_interval
            && (chunk_size == 0 || chunk_end == end);
        let wire_end = if open_ended {
            self.session_id().version().infinity_seq_num()
        } else {
            chunk_end
        };

        let mut request = Message::with_type(&MsgType::ResendRequest);
        let body = request.body_mut();
        body.set_u64(tags::BEGIN_SEQ_NO, begin);
        body.set_u64(tags::END_SEQ_NO, wire_end);
        self.send_raw(request, None).await;

        self.log
            .on_event(&format!("Sent ResendRequest FROM: {begin} TO: {chunk_end}"));
        let recorded_chunk = if chunk_size == 0 { 0 } else { chunk_end };
        self.state.lock().set_resend_range(Some(ResendRange {
            begin,
            end,
            chunk_end: recorded_chunk,
        }));
        self.listeners
            .on_resend_request_sent(self.session_id(), begin, end, recorded_chunk);
    }

    /// Advances the target sequence number, logging store failures.
    pub(crate) async fn incr_target(&self) {
        if let Err(err) = self.store.incr_next_target_seq_num().await {
            self.log
                .on_error_event(&format!("Failed to advance target sequence number: {err}"));
        }
    }
}
