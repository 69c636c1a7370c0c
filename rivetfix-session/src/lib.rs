/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # RivetFix Session
//!
//! FIX session layer protocol implementation for the RivetFix engine.
//!
//! This crate provides:
//! - **Session engine**: Logon/Logout, heartbeats, gap detection, resends and
//!   rejects for one counterparty ([`Session`])
//! - **State**: Per-connection flags, timers and the out-of-order queue
//! - **Schedule**: Daily and weekly session windows
//! - **Configuration**: Session configuration options
//! - **Collaborators**: Application callbacks, transport responder, event
//!   log, clock and state listeners
//! - **Registry**: Process-wide lookup of sessions by identity

pub mod application;
pub mod clock;
pub mod config;
pub mod listener;
pub mod log;
pub mod registry;
pub mod responder;
pub mod schedule;
pub mod session;
pub mod session_id;
pub mod state;

mod inbound;
mod outbound;
mod resend;
mod timer;


pub use application::{Application, ApplicationError, DoNotSend, NoOpApplication};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{SessionConfig, SessionConfigBuilder, SessionRole};
pub use listener::{Listeners, SessionStateListener};
pub use log::{LogEntry, MemoryLog, SessionLog, TracingLog};
pub use registry::SessionRegistry;
pub use responder::Responder;
pub use schedule::SessionSchedule;
pub use session::{Session, SessionBuilder};
pub use session_id::SessionId;
pub use state::{ResendRange, SessionState, SessionStatus};
