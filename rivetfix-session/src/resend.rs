/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Answering ResendRequests.
//!
//! Stored application messages are replayed with PossDupFlag=Y and their
//! original SendingTime in OrigSendingTime. Session messages, messages the
//! application declines to resend and messages missing from the store are
//! collapsed into gap-fill SequenceResets. The whole walk holds the sender
//! lock so no new message can take a sequence number inside the range.

use crate::outbound::SenderGuard;
use crate::session::Session;
use rivetfix_core::error::StoreError;
use rivetfix_core::message::MsgType;
use rivetfix_core::tags;
use rivetfix_core::types::FixVersion;
use rivetfix_tagvalue::Message;

impl Session {
    /// Answers a ResendRequest for `begin..=end`.
    ///
    /// An open-ended or overlong `end` is clamped to the last sequence number
    /// sent.
    pub(crate) async fn manage_gap_fill(
        &self,
        received: &Message,
        begin: u64,
        end: u64,
    ) -> Result<(), StoreError> {
        let version = self.session_id().version();
        let next_sender = self.expected_sender_num();
        let open_ended = (end == 0 && version >= FixVersion::Fix42)
            || (end == 999_999 && version <= FixVersion::Fix42);
        let end = if open_ended || end >= next_sender {
            next_sender.saturating_sub(1)
        } else {
            end
        };
        self.resend_between(received, begin, end).await
    }

    /// Resends `begin..=end`, or gap-fills it when messages are not
    /// persisted.
    pub(crate) async fn resend_between(
        &self,
        received: &Message,
        begin: u64,
        end: u64,
    ) -> Result<(), StoreError> {
        if begin == 0 || begin > end {
            self.log
                .on_event(&format!("Nothing to resend FROM: {begin} TO: {end}"));
            return Ok(());
        }

        let guard = self.sender_lock.lock().await;
        if !self.config.persist_messages {
            let new_seq = (end + 1).min(self.expected_sender_num());
            self.generate_sequence_reset(Some(received), begin, new_seq, &guard)
                .await;
            return Ok(());
        }
        self.resend_messages(received, begin, end, &guard).await
    }

    async fn resend_messages(
        &self,
        received: &Message,
        begin: u64,
        end: u64,
        guard: &SenderGuard<'_>,
    ) -> Result<(), StoreError> {
        let stored = match self.store.get(begin, end).await {
            Ok(stored) => stored,
            Err(err) if self.config.force_resend_when_corrupted_store => {
                self.log.on_error_event(&format!(
                    "Cannot read messages from store, resending Heartbeats: {err}"
                ));
                self.resend_heartbeats(begin, end);
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let mut gap_start: Option<u64> = None;
        let mut current = begin;
        for data in stored {
            let mut message = match self.decoder().decode_bytes(data) {
                Ok(message) => message,
                Err(err) => {
                    self.log
                        .on_error_event(&format!("Skipping unreadable stored message: {err}"));
                    continue;
                }
            };
            let Ok(seq) = message.seq_num() else {
                continue;
            };
            if seq != current && gap_start.is_none() {
                gap_start = Some(current);
            }
            current = seq + 1;

            if message.is_admin() {
                gap_start.get_or_insert(seq);
                continue;
            }
            self.mark_resent(&mut message);
            if self
                .application
                .to_app(&mut message, self.session_id())
                .await
                .is_err()
            {
                gap_start.get_or_insert(seq);
                continue;
            }

            if let Some(gap) = gap_start.take() {
                self.generate_sequence_reset(Some(received), gap, seq, guard)
                    .await;
            }
            match message.to_bytes() {
                Ok(data) => {
                    self.log.on_event(&format!("Resending message: {seq}"));
                    self.transmit(data);
                }
                Err(err) => self
                    .log
                    .on_error_event(&format!("Failed to encode message {seq} for resend: {err}")),
            }
        }

        let trailing = gap_start.or((current <= end).then_some(current));
        if let Some(gap) = trailing {
            self.generate_sequence_reset(Some(received), gap, end + 1, guard)
                .await;
        }
        Ok(())
    }

    /// Stands in a PossDup Heartbeat for every message in the range.
    fn resend_heartbeats(&self, begin: u64, end: u64) {
        for seq in begin..=end {
            let mut heartbeat = Message::with_type(&MsgType::Heartbeat);
            self.initialize_header(&mut heartbeat);
            heartbeat.header_mut().set_u64(tags::MSG_SEQ_NUM, seq);
            self.mark_resent(&mut heartbeat);
            match heartbeat.to_bytes() {
                Ok(data) => {
                    self.transmit(data);
                }
                Err(err) => self
                    .log
                    .on_error_event(&format!("Failed to encode Heartbeat {seq}: {err}")),
            }
        }
    }

    /// Sets PossDupFlag, moves SendingTime to OrigSendingTime and restamps
    /// SendingTime.
    fn mark_resent(&self, message: &mut Message) {
        let now = self.now();
        let precision = self.config.timestamp_precision;
        let header = message.header_mut();
        let original = header.get_utc_timestamp(tags::SENDING_TIME).unwrap_or(now);
        header.set_bool(tags::POSS_DUP_FLAG, true);
        header.set_utc_timestamp(tags::ORIG_SENDING_TIME, &original, precision);
        header.set_utc_timestamp(tags::SENDING_TIME, &now, precision);
    }
}
