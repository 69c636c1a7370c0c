/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Lookup of live sessions by identity.
//!
//! [`SessionRegistry::global`] is the process-wide registry. Separate
//! registries can be created for tests or for hosting unrelated engines in
//! one process.

use crate::session::Session;
use crate::session_id::SessionId;
use parking_lot::RwLock;
use rivetfix_core::error::SessionError;
use rivetfix_core::tags;
use rivetfix_core::types::{CompId, FixVersion};
use rivetfix_tagvalue::Message;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, OnceLock};

static GLOBAL: OnceLock<SessionRegistry> = OnceLock::new();

/// Sessions keyed by [`SessionId`].
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::new)
    }

    /// Adds a session.
    ///
    /// # Errors
    /// [`SessionError::AlreadyRegistered`] if a session with the same
    /// identity is present.
    pub fn register(&self, session: Arc<Session>) -> Result<(), SessionError> {
        let id = session.session_id().clone();
        match self.sessions.write().entry(id) {
            Entry::Occupied(entry) => Err(SessionError::AlreadyRegistered {
                session_id: entry.key().to_string(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(session);
                Ok(())
            }
        }
    }

    /// Removes a session, returning it if it was present.
    pub fn unregister(&self, session_id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.write().remove(session_id)
    }

    /// Looks up a session.
    #[must_use]
    pub fn lookup(&self, session_id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Returns true if a session with this identity is registered.
    #[must_use]
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    /// Identities of every registered session.
    #[must_use]
    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Sends `message` through a registered session.
    ///
    /// Without an explicit `session_id` the session is found from the
    /// message's BeginString, SenderCompID and TargetCompID.
    ///
    /// # Returns
    /// Whether the session handed the message to its transport.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no matching session is registered.
    pub async fn send_to_target(
        &self,
        message: Message,
        session_id: Option<&SessionId>,
    ) -> Result<bool, SessionError> {
        let id = match session_id {
            Some(id) => id.clone(),
            None => session_id_of(&message)?,
        };
        let session = self
            .lookup(&id)
            .ok_or_else(|| SessionError::NotFound {
                session_id: id.to_string(),
            })?;
        Ok(session.send(message).await)
    }
}

/// Derives the sending session's identity from a message header.
fn session_id_of(message: &Message) -> Result<SessionId, SessionError> {
    let header = message.header();
    let begin_string = header.get_str(tags::BEGIN_STRING).unwrap_or_default();
    let sender = header.get_str(tags::SENDER_COMP_ID).unwrap_or_default();
    let target = header.get_str(tags::TARGET_COMP_ID).unwrap_or_default();
    let not_found = || SessionError::NotFound {
        session_id: format!("{begin_string}:{sender}->{target}"),
    };

    let version = FixVersion::from_begin_string(begin_string).ok_or_else(not_found)?;
    let sender = CompId::new(sender).ok_or_else(not_found)?;
    let target = CompId::new(target).ok_or_else(not_found)?;
    Ok(SessionId::new(version, sender, target))
}
