/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! The session engine.
//!
//! A [`Session`] owns the protocol state of one FIX conversation. Inbound
//! traffic enters through [`Session::next_raw`] or [`Session::next`],
//! outbound application traffic through [`Session::send`], and the owner
//! drives timers by calling [`Session::tick`] about once a second.
//!
//! Outbound sends are serialized by a sender lock so that sequence numbers
//! are assigned, stored and transmitted in one order. Inbound processing is
//! serialized by a second lock. Neither lock is held while the other is
//! being acquired in the opposite order.

use crate::application::{Application, NoOpApplication};
use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::listener::{Listeners, SessionStateListener};
use crate::log::{SessionLog, TracingLog};
use crate::responder::Responder;
use crate::session_id::SessionId;
use crate::state::{SessionState, SessionStatus};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rivetfix_core::error::{Result, SessionError, StoreError};
use rivetfix_dictionary::{DataDictionary, session_dictionary};
use rivetfix_store::{MemoryStore, MessageStore};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One FIX session.
pub struct Session {
    pub(crate) config: SessionConfig,
    pub(crate) application: Arc<dyn Application>,
    pub(crate) store: Arc<dyn MessageStore>,
    pub(crate) log: Arc<dyn SessionLog>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) session_dictionary: Arc<DataDictionary>,
    pub(crate) application_dictionary: Option<Arc<DataDictionary>>,
    pub(crate) listeners: Listeners,
    pub(crate) state: Mutex<SessionState>,
    pub(crate) sender_lock: tokio::sync::Mutex<()>,
    pub(crate) inbound_lock: tokio::sync::Mutex<()>,
    responder: Mutex<Option<Arc<dyn Responder>>>,
    enabled: AtomicBool,
    resetting: AtomicBool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.config.session_id)
            .field("status", &self.status())
            .field("next_sender_seq_num", &self.expected_sender_num())
            .field("next_target_seq_num", &self.expected_target_num())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Starts building a session for `config`.
    #[must_use]
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    /// Returns the session identity.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.config.session_id
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the message store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    /// Returns the session log.
    #[must_use]
    pub fn log(&self) -> &Arc<dyn SessionLog> {
        &self.log
    }

    /// Current protocol status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        let connected = self.has_responder();
        self.state.lock().status(connected)
    }

    /// Returns true once Logon has been both sent and received.
    #[must_use]
    pub fn is_logged_on(&self) -> bool {
        self.state.lock().is_logged_on()
    }

    /// Returns true while a transport is attached.
    #[must_use]
    pub fn has_responder(&self) -> bool {
        self.responder.lock().is_some()
    }

    /// Returns true unless [`Session::logout`] disabled the session.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Sequence number the next outgoing message will carry.
    #[must_use]
    pub fn expected_sender_num(&self) -> u64 {
        self.store.next_sender_seq_num()
    }

    /// Sequence number the next incoming message must carry.
    #[must_use]
    pub fn expected_target_num(&self) -> u64 {
        self.store.next_target_seq_num()
    }

    /// Returns true if the session schedule covers the current time.
    #[must_use]
    pub fn is_session_time(&self) -> bool {
        self.config.schedule.is_session_time(self.now())
    }

    /// Registers a state listener.
    pub fn add_listener(&self, listener: Arc<dyn SessionStateListener>) {
        self.listeners.add(listener);
    }

    /// Unregisters a state listener.
    pub fn remove_listener(&self, listener: &Arc<dyn SessionStateListener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Attaches a transport.
    ///
    /// Connecting starts the logon clock: an acceptor that receives no Logon
    /// within the logon timeout is disconnected.
    pub fn set_responder(&self, responder: Arc<dyn Responder>) {
        let now = self.now();
        let address = responder.remote_address();
        *self.responder.lock() = Some(responder);
        self.state.lock().on_message_received(now);
        match address {
            Some(address) => self.log.on_event(&format!("Connected to {address}")),
            None => self.log.on_event("Connected"),
        }
        self.listeners.on_connect(self.session_id());
    }

    /// Enables the session so that an initiator starts logging on.
    pub fn logon(&self) {
        self.state.lock().set_logout_reason(None);
        self.enabled.store(true, Ordering::Release);
    }

    /// Disables the session. The next [`Session::tick`] sends Logout if the
    /// session is logged on.
    pub fn logout(&self, reason: Option<&str>) {
        self.enabled.store(false, Ordering::Release);
        self.state.lock().set_logout_reason(reason.map(str::to_string));
    }

    /// Drops the transport and clears per-connection state.
    ///
    /// `on_logout` fires only if a Logon had been sent or received on this
    /// connection.
    pub async fn disconnect(&self, reason: &str, log_error: bool) {
        let responder = self.responder.lock().take();
        let (logon_received, logon_sent) = {
            let state = self.state.lock();
            (state.is_logon_received(), state.is_logon_sent())
        };

        match responder {
            Some(responder) => {
                if log_error {
                    self.log.on_error_event(&format!("Disconnecting: {reason}"));
                } else {
                    self.log.on_event(&format!("Disconnecting: {reason}"));
                }
                responder.disconnect();
                self.listeners.on_disconnect(self.session_id());
                if logon_received || logon_sent {
                    self.application.on_logout(self.session_id()).await;
                    self.listeners.on_logout(self.session_id());
                }
            }
            None => self.log.on_event(&format!("Already disconnected: {reason}")),
        }

        if !self.config.is_initiator() {
            self.enabled.store(true, Ordering::Release);
        }
        self.state.lock().clear_connection();

        if self.config.reset_on_disconnect
            && let Err(err) = self.reset_state().await
        {
            self.log
                .on_error_event(&format!("Failed to reset store on disconnect: {err}"));
        }
    }

    /// Ends the current session period.
    ///
    /// A logged-on session sends Logout and disconnects first. Sequence
    /// numbers and stored messages are then cleared. Concurrent calls are
    /// coalesced.
    ///
    /// # Errors
    /// Returns the store error if the store cannot be reset.
    pub async fn reset(&self) -> std::result::Result<(), StoreError> {
        if self
            .resetting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        let logged_on = self.has_responder() && self.state.lock().is_logon_received();
        if logged_on {
            self.generate_logout(None, None).await;
            self.disconnect("Session reset", false).await;
        }
        let result = self.reset_state().await;
        self.resetting.store(false, Ordering::Release);
        result
    }

    /// Resets the store and the in-memory queues without touching the
    /// connection.
    pub(crate) async fn reset_state(&self) -> std::result::Result<(), StoreError> {
        self.store.reset(self.now()).await?;
        {
            let mut state = self.state.lock();
            state.clear_queue();
            state.set_resend_range(None);
        }
        self.log.on_event("Session state reset");
        self.listeners.on_reset(self.session_id());
        Ok(())
    }

    /// Reloads the store from its backing medium.
    ///
    /// # Errors
    /// Returns the store error if the refresh fails.
    pub async fn refresh(&self) -> std::result::Result<(), StoreError> {
        self.store.refresh().await?;
        self.log.on_event("Message store refreshed");
        self.listeners.on_refresh(self.session_id());
        Ok(())
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn responder(&self) -> Option<Arc<dyn Responder>> {
        self.responder.lock().clone()
    }
}

/// Assembles a [`Session`] from its collaborators.
///
/// Every collaborator has a default: [`NoOpApplication`], [`MemoryStore`],
/// [`TracingLog`], [`SystemClock`] and the built-in session dictionary for
/// the configured version.
pub struct SessionBuilder {
    config: SessionConfig,
    application: Option<Arc<dyn Application>>,
    store: Option<Arc<dyn MessageStore>>,
    log: Option<Arc<dyn SessionLog>>,
    clock: Option<Arc<dyn Clock>>,
    session_dictionary: Option<Arc<DataDictionary>>,
    application_dictionary: Option<Arc<DataDictionary>>,
    listeners: Vec<Arc<dyn SessionStateListener>>,
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl SessionBuilder {
    /// Creates a builder with default collaborators.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            application: None,
            store: None,
            log: None,
            clock: None,
            session_dictionary: None,
            application_dictionary: None,
            listeners: Vec::new(),
        }
    }

    /// Sets the application callbacks.
    #[must_use]
    pub fn with_application(mut self, application: Arc<dyn Application>) -> Self {
        self.application = Some(application);
        self
    }

    /// Sets the message store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn MessageStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the session log.
    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn SessionLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// Sets the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replaces the dictionary used for session-level messages.
    #[must_use]
    pub fn with_session_dictionary(mut self, dictionary: Arc<DataDictionary>) -> Self {
        self.session_dictionary = Some(dictionary);
        self
    }

    /// Sets the dictionary used to parse and validate application messages.
    ///
    /// Without one, application messages are parsed flat and not validated.
    #[must_use]
    pub fn with_application_dictionary(mut self, dictionary: Arc<DataDictionary>) -> Self {
        self.application_dictionary = Some(dictionary);
        self
    }

    /// Adds a state listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn SessionStateListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Builds the session and calls `on_create`.
    ///
    /// A store whose creation time falls in an earlier session period is
    /// reset first.
    ///
    /// # Errors
    /// Fails on an invalid configuration, a dictionary that does not compile,
    /// or a store that cannot be reset.
    pub async fn build(self) -> Result<Session> {
        self.config.validate()?;

        let session_dictionary = match self.session_dictionary {
            Some(dictionary) => dictionary,
            None => {
                let dictionary = session_dictionary(self.config.session_id.version());
                let compiled = DataDictionary::compile(&dictionary)
                    .map_err(|err| SessionError::Configuration(err.to_string()))?;
                Arc::new(compiled)
            }
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let now = clock.now();
        let log = self
            .log
            .unwrap_or_else(|| Arc::new(TracingLog::new(&self.config.session_id)));
        let listeners = Listeners::new();
        for listener in self.listeners {
            listeners.add(listener);
        }

        let session = Session {
            state: Mutex::new(SessionState::new(&self.config, now)),
            application: self
                .application
                .unwrap_or_else(|| Arc::new(NoOpApplication)),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryStore::new().with_creation_time(now))),
            log,
            clock,
            session_dictionary,
            application_dictionary: self.application_dictionary,
            listeners,
            sender_lock: tokio::sync::Mutex::new(()),
            inbound_lock: tokio::sync::Mutex::new(()),
            responder: Mutex::new(None),
            enabled: AtomicBool::new(true),
            resetting: AtomicBool::new(false),
            config: self.config,
        };

        let created = session.store.creation_time();
        if !session.config.schedule.is_same_session(created, now) {
            session
                .log
                .on_event("Session state is not current; resetting session");
            session.reset_state().await?;
        }

        session.log.on_event(&format!(
            "Session {} created, next sender {} next target {}",
            session.session_id(),
            session.expected_sender_num(),
            session.expected_target_num()
        ));
        session.application.on_create(session.session_id()).await;
        Ok(session)
    }
}
