/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Callbacks through which a session hands messages to business logic.
//!
//! Admin and application traffic arrive on separate hooks, and every
//! outgoing message passes through one before it is stamped and sent.

use crate::session_id::SessionId;
use async_trait::async_trait;
use rivetfix_core::error::FieldError;
use rivetfix_tagvalue::Message;
use thiserror::Error;

/// Reasons an application refuses an incoming message.
///
/// The session turns each variant into one protocol action: a Reject, a
/// BusinessMessageReject, or a Logout for a refused Logon.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    /// A field is missing or does not convert.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// A field holds a value the application does not accept.
    #[error("incorrect value for tag {tag}")]
    IncorrectTagValue {
        /// The offending tag.
        tag: u32,
    },

    /// The application does not handle this message type.
    #[error("unsupported message type")]
    UnsupportedMessageType,

    /// The Logon is refused. The text is sent in the Logout.
    #[error("logon rejected: {text}")]
    RejectLogon {
        /// Logout text.
        text: String,
    },

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

/// Returned by [`Application::to_app`] to stop a message from being sent.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Default)]
#[error("do not send")]
pub struct DoNotSend;

/// Application callback interface for handling FIX messages.
///
/// Implement this trait to receive callbacks for session events
/// and message processing.
#[async_trait]
pub trait Application: Send + Sync {
    /// Called when a session is created.
    async fn on_create(&self, session_id: &SessionId);

    /// Called on successful logon.
    async fn on_logon(&self, session_id: &SessionId);

    /// Called when a logged on session disconnects.
    async fn on_logout(&self, session_id: &SessionId);

    /// Called before sending an admin message.
    ///
    /// Allows modification of outgoing admin messages (Logon, Heartbeat, etc.).
    async fn to_admin(&self, message: &mut Message, session_id: &SessionId);

    /// Called when an admin message is received.
    ///
    /// # Returns
    /// `Ok(())` to accept, an [`ApplicationError`] to refuse.
    #[allow(clippy::wrong_self_convention)]
    async fn from_admin(
        &self,
        message: &Message,
        session_id: &SessionId,
    ) -> Result<(), ApplicationError>;

    /// Called before sending an application message, including resends.
    ///
    /// # Returns
    /// `Err(DoNotSend)` drops the message without consuming a sequence number.
    async fn to_app(&self, message: &mut Message, session_id: &SessionId) -> Result<(), DoNotSend>;

    /// Called when an application message is received.
    ///
    /// # Returns
    /// `Ok(())` to accept, an [`ApplicationError`] to refuse.
    #[allow(clippy::wrong_self_convention)]
    async fn from_app(
        &self,
        message: &Message,
        session_id: &SessionId,
    ) -> Result<(), ApplicationError>;
}

/// Default no-op application implementation.
#[derive(Debug, Default)]
pub struct NoOpApplication;

#[async_trait]
impl Application for NoOpApplication {
    async fn on_create(&self, _session_id: &SessionId) {}

    async fn on_logon(&self, _session_id: &SessionId) {}

    async fn on_logout(&self, _session_id: &SessionId) {}

    async fn to_admin(&self, _message: &mut Message, _session_id: &SessionId) {}

    async fn from_admin(
        &self,
        _message: &Message,
        _session_id: &SessionId,
    ) -> Result<(), ApplicationError> {
        Ok(())
    }

    async fn to_app(
        &self,
        _message: &mut Message,
        _session_id: &SessionId,
    ) -> Result<(), DoNotSend> {
        Ok(())
    }

    async fn from_app(
        &self,
        _message: &Message,
        _session_id: &SessionId,
    ) -> Result<(), ApplicationError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivetfix_core::message::MsgType;
    use rivetfix_core::types::{CompId, FixVersion};

    #[tokio::test]
    async fn test_noop_application_accepts_everything() {
        let id = SessionId::new(
            FixVersion::Fix44,
            CompId::new("A").unwrap(),
            CompId::new("B").unwrap(),
        );
        let app = NoOpApplication;
        let mut message = Message::with_type(&MsgType::NewOrderSingle);

        app.on_create(&id).await;
        assert!(app.to_app(&mut message, &id).await.is_ok());
        assert!(app.from_app(&message, &id).await.is_ok());
        assert!(app.from_admin(&message, &id).await.is_ok());
    }

    #[test]
    fn test_application_error_from_field_error() {
        let err: ApplicationError = FieldError::NotFound { tag: 11 }.into();
        assert_eq!(err, ApplicationError::Field(FieldError::NotFound { tag: 11 }));
        assert_eq!(err.to_string(), "field not found: tag 11");
    }
}
