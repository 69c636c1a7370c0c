/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # RivetFix
//!
//! A FIX session engine for Rust.
//!
//! RivetFix runs the FIX session layer for FIX.4.0 through FIXT.1.1: logon
//! and logout, heartbeats, sequence-number gap detection, resends and
//! rejects. It carries application messages reliably and in order and leaves
//! their meaning to the [`Application`](session::Application) you plug in.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rivetfix::prelude::*;
//! use std::sync::Arc;
//!
//! let id = SessionId::new(
//!     FixVersion::Fix44,
//!     CompId::new("CLIENT").unwrap(),
//!     CompId::new("SERVER").unwrap(),
//! );
//! let session = Session::builder(SessionConfig::new(id).with_role(SessionRole::Initiator))
//!     .with_application(Arc::new(MyApplication))
//!     .build()
//!     .await?;
//! let stream = tokio::net::TcpStream::connect("127.0.0.1:9876").await?;
//! run_connection(Arc::new(session), stream, None, ConnectionOptions::default()).await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Error taxonomy, tags, message types and reject codes
//! - [`dictionary`]: Data dictionaries and message validation
//! - [`tagvalue`]: Tag=value messages, encoding and decoding
//! - [`session`]: Session layer protocol implementation
//! - [`store`]: Message persistence
//! - [`transport`]: Framing codec and connection driver

pub mod core {
    //! Error taxonomy, tags, message types and reject codes.
    pub use rivetfix_core::*;
}

pub mod dictionary {
    //! Data dictionaries and message validation.
    pub use rivetfix_dictionary::*;
}

pub mod tagvalue {
    //! Tag=value messages, encoding and decoding.
    pub use rivetfix_tagvalue::*;
}

pub mod session {
    //! Session layer protocol implementation.
    pub use rivetfix_session::*;
}

pub mod store {
    //! Message persistence.
    pub use rivetfix_store::*;
}

pub mod transport {
    //! Framing codec and connection driver.
    pub use rivetfix_transport::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use rivetfix_core::{
        BusinessRejectReason, CompId, DecodeError, EncodeError, FieldError, FixError, FixVersion,
        MsgType, Result, SessionError, SessionRejectReason, StoreError, TimestampPrecision, tags,
    };

    // Dictionary
    pub use rivetfix_dictionary::{DataDictionary, Dictionary, ValidationError};

    // Tag-value encoding
    pub use rivetfix_tagvalue::{Decoder, FieldMap, Group, Message};

    // Session
    pub use rivetfix_session::{
        Application, ApplicationError, DoNotSend, Responder, Session, SessionBuilder,
        SessionConfig, SessionId, SessionLog, SessionRegistry, SessionRole, SessionSchedule,
        SessionStateListener, SessionStatus,
    };

    // Store
    pub use rivetfix_store::{MemoryStore, MessageStore};

    // Transport
    pub use rivetfix_transport::{ConnectionOptions, FixCodec, run_connection};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let id = SessionId::new(
            FixVersion::Fix44,
            CompId::new("CLIENT").unwrap(),
            CompId::new("SERVER").unwrap(),
        );
        let config = SessionConfig::new(id).with_role(SessionRole::Initiator);
        assert!(config.is_initiator());
        assert_eq!(config.session_id.to_string(), "FIX.4.4:CLIENT->SERVER");
    }

    #[test]
    fn test_message_round_trip_through_facade() {
        let mut message = Message::with_type(&MsgType::Heartbeat);
        message.header_mut().set_str(tags::BEGIN_STRING, "FIX.4.4");
        let bytes = message.to_bytes().unwrap();
        let parsed = Message::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.msg_type().unwrap(), MsgType::Heartbeat);
    }
}
