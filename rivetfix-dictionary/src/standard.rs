/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session-level dictionary of each FIX version.
//!
//! Covers the standard header and trailer and the administrative messages:
//! Heartbeat, TestRequest, ResendRequest, Reject, SequenceReset, Logout and
//! Logon, plus BusinessMessageReject from FIX.4.2. Application dictionaries
//! are built on top of it with [`Dictionary::add_message`].

use crate::schema::{Dictionary, FieldDef, FieldType, GroupDef, Member, MessageCategory, MessageDef};
use rivetfix_core::tags;
use rivetfix_core::types::FixVersion;

const BOOLEAN: [(&str, &str); 2] = [("Y", "YES"), ("N", "NO")];

fn fields(version: FixVersion) -> Vec<FieldDef> {
    use FieldType as T;
    let mut defs = vec![
        FieldDef::new(tags::BEGIN_SEQ_NO, "BeginSeqNo", T::SeqNum),
        FieldDef::new(tags::BEGIN_STRING, "BeginString", T::String),
        FieldDef::new(tags::BODY_LENGTH, "BodyLength", T::Length),
        FieldDef::new(tags::CHECK_SUM, "CheckSum", T::String),
        FieldDef::new(tags::END_SEQ_NO, "EndSeqNo", T::SeqNum),
        FieldDef::new(tags::MSG_SEQ_NUM, "MsgSeqNum", T::SeqNum),
        FieldDef::new(tags::MSG_TYPE, "MsgType", T::String),
        FieldDef::new(tags::NEW_SEQ_NO, "NewSeqNo", T::SeqNum),
        FieldDef::new(tags::POSS_DUP_FLAG, "PossDupFlag", T::Boolean).with_values(BOOLEAN),
        FieldDef::new(tags::REF_SEQ_NUM, "RefSeqNum", T::SeqNum),
        FieldDef::new(tags::SENDER_COMP_ID, "SenderCompID", T::String),
        FieldDef::new(tags::SENDER_SUB_ID, "SenderSubID", T::String),
        FieldDef::new(tags::SENDING_TIME, "SendingTime", T::UtcTimestamp),
        FieldDef::new(tags::TARGET_COMP_ID, "TargetCompID", T::String),
        FieldDef::new(tags::TARGET_SUB_ID, "TargetSubID", T::String),
        FieldDef::new(tags::TEXT, "Text", T::String),
        FieldDef::new(tags::SIGNATURE, "Signature", T::Data),
        FieldDef::new(tags::SECURE_DATA_LEN, "SecureDataLen", T::Length),
        FieldDef::new(tags::SECURE_DATA, "SecureData", T::Data),
        FieldDef::new(tags::SIGNATURE_LENGTH, "SignatureLength", T::Length),
        FieldDef::new(tags::RAW_DATA_LENGTH, "RawDataLength", T::Length),
        FieldDef::new(tags::RAW_DATA, "RawData", T::Data),
        FieldDef::new(tags::POSS_RESEND, "PossResend", T::Boolean).with_values(BOOLEAN),
        FieldDef::new(tags::ENCRYPT_METHOD, "EncryptMethod", T::Int).with_values([
            ("0", "NONE_OTHER"),
            ("1", "PKCS"),
            ("2", "DES"),
            ("3", "PKCS_DES"),
            ("4", "PGP_DES"),
            ("5", "PGP_DES_MD5"),
            ("6", "PEM_DES_MD5"),
        ]),
        FieldDef::new(tags::HEART_BT_INT, "HeartBtInt", T::Int),
        FieldDef::new(tags::TEST_REQ_ID, "TestReqID", T::String),
        FieldDef::new(tags::ON_BEHALF_OF_COMP_ID, "OnBehalfOfCompID", T::String),
        FieldDef::new(tags::ON_BEHALF_OF_SUB_ID, "OnBehalfOfSubID", T::String),
        FieldDef::new(tags::ORIG_SENDING_TIME, "OrigSendingTime", T::UtcTimestamp),
        FieldDef::new(tags::GAP_FILL_FLAG, "GapFillFlag", T::Boolean).with_values(BOOLEAN),
        FieldDef::new(tags::DELIVER_TO_COMP_ID, "DeliverToCompID", T::String),
        FieldDef::new(tags::DELIVER_TO_SUB_ID, "DeliverToSubID", T::String),
        FieldDef::new(tags::RESET_SEQ_NUM_FLAG, "ResetSeqNumFlag", T::Boolean)
            .with_values(BOOLEAN),
        FieldDef::new(tags::SENDER_LOCATION_ID, "SenderLocationID", T::String),
        FieldDef::new(tags::TARGET_LOCATION_ID, "TargetLocationID", T::String),
        FieldDef::new(tags::ON_BEHALF_OF_LOCATION_ID, "OnBehalfOfLocationID", T::String),
        FieldDef::new(tags::DELIVER_TO_LOCATION_ID, "DeliverToLocationID", T::String),
    ];
    if version >= FixVersion::Fix42 {
        defs.extend([
            FieldDef::new(tags::XML_DATA_LEN, "XmlDataLen", T::Length),
            FieldDef::new(tags::XML_DATA, "XmlData", T::Data),
            FieldDef::new(tags::MESSAGE_ENCODING, "MessageEncoding", T::String),
            FieldDef::new(tags::LAST_MSG_SEQ_NUM_PROCESSED, "LastMsgSeqNumProcessed", T::SeqNum),
            FieldDef::new(tags::ON_BEHALF_OF_SENDING_TIME, "OnBehalfOfSendingTime", T::UtcTimestamp),
            FieldDef::new(tags::REF_TAG_ID, "RefTagID", T::Int),
            FieldDef::new(tags::REF_MSG_TYPE, "RefMsgType", T::String),
            FieldDef::new(tags::SESSION_REJECT_REASON, "SessionRejectReason", T::Int),
            FieldDef::new(tags::BUSINESS_REJECT_REF_ID, "BusinessRejectRefID", T::String),
            FieldDef::new(tags::BUSINESS_REJECT_REASON, "BusinessRejectReason", T::Int),
        ]);
    }
    if version >= FixVersion::Fix43 {
        defs.extend([
            FieldDef::new(tags::NO_HOPS, "NoHops", T::NumInGroup),
            FieldDef::new(tags::HOP_COMP_ID, "HopCompID", T::String),
            FieldDef::new(tags::HOP_SENDING_TIME, "HopSendingTime", T::UtcTimestamp),
            FieldDef::new(tags::HOP_REF_ID, "HopRefID", T::SeqNum),
        ]);
    }
    if version >= FixVersion::Fix44 {
        defs.push(FieldDef::new(
            tags::NEXT_EXPECTED_MSG_SEQ_NUM,
            "NextExpectedMsgSeqNum",
            T::SeqNum,
        ));
    }
    if version.uses_fixt() {
        defs.extend([
            FieldDef::new(tags::APPL_VER_ID, "ApplVerID", T::String),
            FieldDef::new(tags::CSTM_APPL_VER_ID, "CstmApplVerID", T::String),
            FieldDef::new(tags::DEFAULT_APPL_VER_ID, "DefaultApplVerID", T::String),
        ]);
    }
    defs
}

fn header(version: FixVersion) -> Vec<Member> {
    let mut members = vec![
        Member::field(tags::BEGIN_STRING, true),
        Member::field(tags::BODY_LENGTH, true),
        Member::field(tags::MSG_TYPE, true),
        Member::field(tags::SENDER_COMP_ID, true),
        Member::field(tags::TARGET_COMP_ID, true),
        Member::field(tags::ON_BEHALF_OF_COMP_ID, false),
        Member::field(tags::DELIVER_TO_COMP_ID, false),
        Member::field(tags::SECURE_DATA_LEN, false),
        Member::field(tags::SECURE_DATA, false),
        Member::field(tags::MSG_SEQ_NUM, true),
        Member::field(tags::SENDER_SUB_ID, false),
        Member::field(tags::SENDER_LOCATION_ID, false),
        Member::field(tags::TARGET_SUB_ID, false),
        Member::field(tags::TARGET_LOCATION_ID, false),
        Member::field(tags::ON_BEHALF_OF_SUB_ID, false),
        Member::field(tags::ON_BEHALF_OF_LOCATION_ID, false),
        Member::field(tags::DELIVER_TO_SUB_ID, false),
        Member::field(tags::DELIVER_TO_LOCATION_ID, false),
        Member::field(tags::POSS_DUP_FLAG, false),
        Member::field(tags::POSS_RESEND, false),
        Member::field(tags::SENDING_TIME, true),
        Member::field(tags::ORIG_SENDING_TIME, false),
    ];
    if version >= FixVersion::Fix42 {
        members.extend([
            Member::field(tags::XML_DATA_LEN, false),
            Member::field(tags::XML_DATA, false),
            Member::field(tags::MESSAGE_ENCODING, false),
            Member::field(tags::LAST_MSG_SEQ_NUM_PROCESSED, false),
            Member::field(tags::ON_BEHALF_OF_SENDING_TIME, false),
        ]);
    }
    if version >= FixVersion::Fix43 {
        members.push(Member::Group(
            GroupDef::new(tags::NO_HOPS, false)
                .with(Member::field(tags::HOP_COMP_ID, false))
                .with(Member::field(tags::HOP_SENDING_TIME, false))
                .with(Member::field(tags::HOP_REF_ID, false)),
        ));
    }
    if version.uses_fixt() {
        members.extend([
            Member::field(tags::APPL_VER_ID, false),
            Member::field(tags::CSTM_APPL_VER_ID, false),
        ]);
    }
    members
}

fn admin(msg_type: &str, name: &str, members: &[(u32, bool)]) -> MessageDef {
    members.iter().fold(
        MessageDef::new(msg_type, name, MessageCategory::Admin),
        |def, &(tag, required)| def.with(Member::field(tag, required)),
    )
}

/// Builds the session-level dictionary of `version`.
///
/// # Example
/// ```
/// use rivetfix_core::FixVersion;
/// use rivetfix_dictionary::session_dictionary;
///
/// let dict = session_dictionary(FixVersion::Fix44);
/// assert!(dict.get_message("A").is_some());
/// ```
#[must_use]
pub fn session_dictionary(version: FixVersion) -> Dictionary {
    let mut dict = Dictionary::new(version);
    for def in fields(version) {
        dict.add_field(def);
    }
    dict.header = header(version);
    dict.trailer = vec![
        Member::field(tags::SIGNATURE_LENGTH, false),
        Member::field(tags::SIGNATURE, false),
        Member::field(tags::CHECK_SUM, true),
    ];

    let reject: &[(u32, bool)] = if version >= FixVersion::Fix42 {
        &[
            (tags::REF_SEQ_NUM, true),
            (tags::REF_TAG_ID, false),
            (tags::REF_MSG_TYPE, false),
            (tags::SESSION_REJECT_REASON, false),
            (tags::TEXT, false),
        ]
    } else {
        &[(tags::REF_SEQ_NUM, true), (tags::TEXT, false)]
    };
    let mut logon = vec![
        (tags::ENCRYPT_METHOD, true),
        (tags::HEART_BT_INT, true),
        (tags::RAW_DATA_LENGTH, false),
        (tags::RAW_DATA, false),
        (tags::RESET_SEQ_NUM_FLAG, false),
    ];
    if version >= FixVersion::Fix44 {
        logon.push((tags::NEXT_EXPECTED_MSG_SEQ_NUM, false));
    }
    if version.uses_fixt() {
        logon.push((tags::DEFAULT_APPL_VER_ID, true));
    }

    for def in [
        admin("0", "Heartbeat", &[(tags::TEST_REQ_ID, false)]),
        admin("1", "TestRequest", &[(tags::TEST_REQ_ID, true)]),
        admin(
            "2",
            "ResendRequest",
            &[(tags::BEGIN_SEQ_NO, true), (tags::END_SEQ_NO, true)],
        ),
        admin("3", "Reject", reject),
        admin(
            "4",
            "SequenceReset",
            &[(tags::GAP_FILL_FLAG, false), (tags::NEW_SEQ_NO, true)],
        ),
        admin("5", "Logout", &[(tags::TEXT, false)]),
        admin("A", "Logon", &logon),
    ] {
        dict.add_message(def);
    }
    if version >= FixVersion::Fix42 {
        dict.add_message(
            MessageDef::new("j", "BusinessMessageReject", MessageCategory::App)
                .with(Member::field(tags::REF_SEQ_NUM, false))
                .with(Member::field(tags::REF_MSG_TYPE, true))
                .with(Member::field(tags::BUSINESS_REJECT_REF_ID, false))
                .with(Member::field(tags::BUSINESS_REJECT_REASON, true))
                .with(Member::field(tags::TEXT, false)),
        );
    }
    dict
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix40_has_no_business_reject() {
        let dict = session_dictionary(FixVersion::Fix40);
        assert!(dict.get_message("j").is_none());
        assert!(dict.get_field(tags::SESSION_REJECT_REASON).is_none());
    }

    #[test]
    fn test_fix44_logon_carries_next_expected() {
        let dict = session_dictionary(FixVersion::Fix44);
        let logon = dict.get_message("A").unwrap();
        assert!(logon.members.iter().any(|m| matches!(
            m,
            Member::Field(f) if f.tag == tags::NEXT_EXPECTED_MSG_SEQ_NUM
        )));
    }

    #[test]
    fn test_fixt_logon_requires_default_appl_ver_id() {
        let dict = session_dictionary(FixVersion::Fixt11);
        let logon = dict.get_message("A").unwrap();
        assert!(logon.members.iter().any(|m| matches!(
            m,
            Member::Field(f) if f.tag == tags::DEFAULT_APPL_VER_ID && f.required
        )));
    }
}
