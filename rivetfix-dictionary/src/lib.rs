/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # RivetFix Dictionary
//!
//! FIX data dictionaries for the RivetFix engine.
//!
//! This crate provides:
//! - **Schema definitions**: serializable field, message, component and group
//!   definitions ([`Dictionary`])
//! - **Session dictionaries**: the session-level layout of each FIX version
//!   ([`session_dictionary`])
//! - **Compiled dictionaries**: [`DataDictionary`], which drives the decoder
//!   through [`rivetfix_tagvalue::ParseSchema`] and validates decoded messages

pub mod dictionary;
pub mod schema;
pub mod standard;

pub use dictionary::{DataDictionary, DictionaryError, ValidationError};
pub use schema::{
    ComponentDef, Dictionary, FieldDef, FieldRef, FieldType, GroupDef, Member, MessageCategory,
    MessageDef,
};
pub use standard::session_dictionary;
