/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # RivetFix Core
//!
//! Core types and error definitions shared by every RivetFix crate.
//!
//! This crate provides the fundamental building blocks of the session engine:
//! - **Error types**: the structural, field, session and store error taxonomy
//! - **Field conversions**: typed parsing and formatting of FIX field values
//! - **Message types**: the [`MsgType`] enum and admin/application classification
//! - **Reject codes**: [`SessionRejectReason`] and [`BusinessRejectReason`]
//! - **Core types**: [`CompId`], [`FixVersion`], [`TimestampPrecision`]
//! - **Tags**: numeric constants for the session-level fields

pub mod error;
pub mod field;
pub mod message;
pub mod reject;
pub mod tags;
pub mod types;

pub use error::{
    DecodeError, EncodeError, FieldError, FieldViolation, FixError, Result, SessionError,
    StoreError,
};
pub use field::FieldKind;
pub use message::MsgType;
pub use reject::{BusinessRejectReason, SessionRejectReason};
pub use types::{CompId, FixVersion, TimestampPrecision};
