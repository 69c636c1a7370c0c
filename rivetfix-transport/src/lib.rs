/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # RivetFix Transport
//!
//! Network plumbing for the RivetFix session engine.
//!
//! This crate provides:
//! - **Codec**: Tokio codec that frames FIX messages by BodyLength and
//!   CheckSum
//! - **Connection driver**: Binds a session to any async byte stream and
//!   drives its timers

pub mod codec;
pub mod connection;

pub use codec::{CodecError, FixCodec};
pub use connection::{ChannelResponder, ConnectionError, ConnectionOptions, run_connection};
