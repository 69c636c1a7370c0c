/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Parse-time message layout.
//!
//! The decoder needs to know which tags belong in the header and trailer,
//! which tags carry raw data, and how repeating groups are laid out. A data
//! dictionary supplies this through [`ParseSchema`]. Without one, the decoder
//! falls back on the standard header and trailer of the session protocol.

use crate::group::GroupSchema;
use rivetfix_core::tags;
use std::sync::LazyLock;

/// Layout information consulted while parsing.
pub trait ParseSchema: Send + Sync {
    /// Returns true if `tag` belongs in the standard header.
    fn is_header_field(&self, tag: u32) -> bool;

    /// Returns true if `tag` belongs in the standard trailer.
    fn is_trailer_field(&self, tag: u32) -> bool;

    /// Returns true if `tag` is a length-prefixed data field.
    fn is_data_field(&self, tag: u32) -> bool;

    /// Returns the header group counted by `count_tag`.
    fn header_group(&self, count_tag: u32) -> Option<&GroupSchema>;

    /// Returns the body group counted by `count_tag` in messages of `msg_type`.
    fn group(&self, msg_type: &str, count_tag: u32) -> Option<&GroupSchema>;

    /// Whether group members must follow the declared member order.
    fn check_unordered_group_fields(&self) -> bool {
        true
    }
}

const STANDARD_HEADER: [u32; 30] = [
    tags::BEGIN_STRING,
    tags::BODY_LENGTH,
    tags::MSG_TYPE,
    tags::SENDER_COMP_ID,
    tags::TARGET_COMP_ID,
    tags::ON_BEHALF_OF_COMP_ID,
    tags::DELIVER_TO_COMP_ID,
    tags::SECURE_DATA_LEN,
    tags::SECURE_DATA,
    tags::MSG_SEQ_NUM,
    tags::SENDER_SUB_ID,
    tags::SENDER_LOCATION_ID,
    tags::TARGET_SUB_ID,
    tags::TARGET_LOCATION_ID,
    tags::ON_BEHALF_OF_SUB_ID,
    tags::ON_BEHALF_OF_LOCATION_ID,
    tags::DELIVER_TO_SUB_ID,
    tags::DELIVER_TO_LOCATION_ID,
    tags::POSS_DUP_FLAG,
    tags::POSS_RESEND,
    tags::SENDING_TIME,
    tags::ORIG_SENDING_TIME,
    tags::XML_DATA_LEN,
    tags::XML_DATA,
    tags::MESSAGE_ENCODING,
    tags::LAST_MSG_SEQ_NUM_PROCESSED,
    tags::ON_BEHALF_OF_SENDING_TIME,
    tags::APPL_VER_ID,
    tags::CSTM_APPL_VER_ID,
    tags::NO_HOPS,
];

const STANDARD_TRAILER: [u32; 3] = [tags::SIGNATURE_LENGTH, tags::SIGNATURE, tags::CHECK_SUM];

static NO_HOPS: LazyLock<GroupSchema> = LazyLock::new(|| {
    GroupSchema::new(tags::NO_HOPS, tags::HOP_COMP_ID)
        .with_field(tags::HOP_SENDING_TIME)
        .with_field(tags::HOP_REF_ID)
});

/// Returns true for tags of the standard header.
#[must_use]
pub fn is_standard_header_field(tag: u32) -> bool {
    STANDARD_HEADER.contains(&tag)
}

/// Returns true for tags of the standard trailer.
#[must_use]
pub fn is_standard_trailer_field(tag: u32) -> bool {
    STANDARD_TRAILER.contains(&tag)
}

/// Returns true for the data fields of the standard header, trailer and
/// RawData.
#[must_use]
pub fn is_standard_data_field(tag: u32) -> bool {
    matches!(
        tag,
        tags::SECURE_DATA | tags::RAW_DATA | tags::XML_DATA | tags::SIGNATURE
    )
}

/// Returns the length field paired with a data field.
///
/// The length field normally has the preceding tag number. Signature (89) is
/// the exception and pairs with SignatureLength (93).
#[must_use]
pub const fn data_length_tag(tag: u32) -> u32 {
    if tag == tags::SIGNATURE {
        tags::SIGNATURE_LENGTH
    } else {
        tag.saturating_sub(1)
    }
}

/// Returns the standard header group counted by `count_tag`.
#[must_use]
pub fn standard_header_group(count_tag: u32) -> Option<&'static GroupSchema> {
    (count_tag == tags::NO_HOPS).then(|| &*NO_HOPS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_sections() {
        assert!(is_standard_header_field(tags::SENDING_TIME));
        assert!(is_standard_header_field(tags::NO_HOPS));
        assert!(!is_standard_header_field(tags::TEXT));
        assert!(is_standard_trailer_field(tags::CHECK_SUM));
        assert!(!is_standard_trailer_field(tags::MSG_SEQ_NUM));
    }

    #[test]
    fn test_data_length_pairs() {
        assert_eq!(data_length_tag(tags::RAW_DATA), tags::RAW_DATA_LENGTH);
        assert_eq!(data_length_tag(tags::SECURE_DATA), tags::SECURE_DATA_LEN);
        assert_eq!(data_length_tag(tags::XML_DATA), tags::XML_DATA_LEN);
        assert_eq!(data_length_tag(tags::SIGNATURE), tags::SIGNATURE_LENGTH);
    }

    #[test]
    fn test_no_hops_layout() {
        let hops = standard_header_group(tags::NO_HOPS).unwrap();
        assert_eq!(hops.delimiter(), tags::HOP_COMP_ID);
        assert!(hops.contains(tags::HOP_REF_ID));
        assert!(standard_header_group(tags::TEXT).is_none());
    }
}
