/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # RivetFix Tag-Value
//!
//! FIX tag=value data model and wire codec for the RivetFix engine.
//!
//! This crate provides:
//! - [`FieldMap`]: ordered tag → value container with nested repeating groups
//! - [`Group`] and [`GroupSchema`]: group instances and their parse schema
//! - [`Message`]: header, body and trailer with canonical serialization
//! - [`Decoder`]: recursive-descent parser driven by a [`ParseSchema`]
//! - [`Encoder`]: BodyLength and CheckSum framing
//!
//! ## Framing
//!
//! Every message starts `8=<version>|9=<length>|35=<type>|` and ends with
//! `10=<checksum>|`, where `|` is SOH (0x01). The checksum is the byte sum
//! modulo 256 of everything before the `10=` field.

pub mod checksum;
pub mod decoder;
pub mod encoder;
pub mod field;
pub mod field_map;
pub mod group;
pub mod message;
pub mod schema;

pub use checksum::calculate_checksum;
pub use decoder::{Decoder, peek_msg_type};
pub use encoder::{Encoder, SOH};
pub use field::Field;
pub use field_map::{Entry, FieldMap};
pub use group::{Group, GroupSchema};
pub use message::Message;
pub use schema::ParseSchema;
