/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # RivetFix Store
//!
//! Message persistence for the RivetFix session engine.
//!
//! This crate provides:
//! - **MessageStore trait**: sequence counters, the sequence → raw message
//!   index used to answer resend requests, and the session creation time
//! - **MemoryStore**: an in-memory store for tests and sessions that do not
//!   need to survive a restart

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::MessageStore;
