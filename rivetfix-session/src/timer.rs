/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Periodic session work: schedule enforcement, logon attempts, timeouts,
//! heartbeats and test requests.

use crate::listener::SessionStateListener;
use crate::session::Session;

impl Session {
    /// Drives the session timers. Call about once a second.
    ///
    /// In order: a disabled session that is logged on sends Logout; outside
    /// the schedule a connected session is reset; a store from an earlier
    /// session period is reset; an initiator sends Logon when its backoff
    /// allows; pending logon and logout exchanges time out; a silent
    /// counterparty gets a TestRequest and is eventually disconnected; an
    /// idle link gets a Heartbeat.
    pub async fn tick(&self) {
        let now = self.now();

        if !self.is_enabled() {
            let (logged_on, logout_sent, reason) = {
                let state = self.state.lock();
                (
                    state.is_logged_on(),
                    state.is_logout_sent(),
                    state.logout_reason().map(str::to_string),
                )
            };
            if !logged_on {
                return;
            }
            if !logout_sent {
                self.log.on_event("Initiated logout request");
                self.generate_logout(reason.as_deref(), None).await;
            }
        }

        if !self.config.schedule.is_session_time(now) {
            if self.has_responder() {
                self.log.on_event("Session outside of scheduled time");
                if let Err(err) = self.reset().await {
                    self.log
                        .on_error_event(&format!("Failed to reset session: {err}"));
                }
            }
            return;
        }

        if !self.config.schedule.is_same_session(self.store.creation_time(), now) {
            self.log
                .on_event("Session state is not current; resetting session");
            if let Err(err) = self.reset().await {
                self.log
                    .on_error_event(&format!("Failed to reset session: {err}"));
            }
        }

        if !self.has_responder() {
            return;
        }

        let (logon_received, logon_sent, logon_due, logon_timed_out) = {
            let state = self.state.lock();
            (
                state.is_logon_received(),
                state.is_logon_sent(),
                state.is_time_to_logon(now),
                state.is_logon_timed_out(now),
            )
        };
        if !logon_received {
            if self.config.is_initiator() && !logon_sent {
                if logon_due {
                    if self.generate_logon().await {
                        self.log.on_event("Initiated logon request");
                    } else {
                        self.log
                            .on_error_event("Error during logon request initiation");
                    }
                }
            } else if logon_timed_out {
                let reason = if self.config.is_initiator() {
                    "Timed out waiting for logon response"
                } else {
                    "Timed out waiting for logon request"
                };
                self.disconnect(reason, true).await;
            }
            return;
        }

        let (heartbeat_disabled, logout_timed_out, timed_out, test_request_needed, heartbeat_needed) = {
            let state = self.state.lock();
            (
                state.heartbeat_interval().is_zero(),
                state.is_logout_timed_out(now),
                state.is_timed_out(now),
                state.is_test_request_needed(now),
                state.is_heartbeat_needed(now),
            )
        };

        if logout_timed_out {
            self.disconnect("Timed out waiting for logout response", true)
                .await;
            return;
        }
        if heartbeat_disabled {
            return;
        }

        if timed_out {
            if self.config.disable_heartbeat_check {
                self.log
                    .on_event("Heartbeat failure detected but deactivated");
            } else {
                self.log.on_error_event("Timed out waiting for heartbeat");
                self.listeners.on_heartbeat_timeout(self.session_id());
                self.disconnect("Timed out waiting for heartbeat", true)
                    .await;
            }
        } else if test_request_needed {
            self.generate_test_request("TEST").await;
            self.log.on_event("Sent test request TEST");
            self.listeners.on_missed_heartbeat(self.session_id());
        } else if heartbeat_needed {
            self.generate_heartbeat(None).await;
        }
    }
}
