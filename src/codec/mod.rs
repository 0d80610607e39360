// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Frame codec: Ethernet/AVTP framing and the three AVDECC subtype
//! wire formats. Nothing above this module touches a raw byte slice.

pub mod acmp;
pub mod adp;
pub mod aecp;
pub mod bytes;
pub mod ethernet;
pub mod types;

pub use acmp::AcmpFrame;
pub use adp::AdpFrame;
pub use aecp::{AecpAaFrame, AecpAemFrame};
pub use ethernet::{build_ethernet_and_common, parse_ethernet_and_common, CommonHeader};
pub use types::{
    AcmpMessageType, AcmpStatus, AdpMessageType, AecpMessageType, AemCommandType, AemStatus,
    DescriptorType, Subtype,
};

/// A frame classified by its common-header subtype, with the Ethernet/common
/// header already validated. The facade dispatches on this before
/// handing the frame to the matching state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedFrame {
    Adp(AdpFrame),
    AecpAem(AecpAemFrame),
    AecpAa(AecpAaFrame),
    Acmp(AcmpFrame),
}

/// Classify a raw received Ethernet frame into one of the three AVDECC
/// subtypes, or an AECP sub-kind.
///
/// # Errors
/// [`crate::error::CodecError::UnknownSubtype`] for anything that isn't
/// ADP/AECP/ACMP, or a subtype-specific parse error.
pub fn classify(buf: &[u8]) -> crate::error::CodecResult<ClassifiedFrame> {
    let (hdr, _) = ethernet::parse_ethernet_and_common(buf)?;
    match hdr.subtype {
        Subtype::Adp => Ok(ClassifiedFrame::Adp(AdpFrame::parse(buf)?)),
        Subtype::Acmp => Ok(ClassifiedFrame::Acmp(AcmpFrame::parse(buf)?)),
        Subtype::Aecp => match AecpMessageType::from(hdr.message_type) {
            AecpMessageType::AemCommand | AecpMessageType::AemResponse => {
                Ok(ClassifiedFrame::AecpAem(AecpAemFrame::parse(buf)?))
            }
            AecpMessageType::AddressAccessCommand | AecpMessageType::AddressAccessResponse => {
                Ok(ClassifiedFrame::AecpAa(AecpAaFrame::parse(buf)?))
            }
            AecpMessageType::Unknown(raw) => Err(crate::error::CodecError::FrameMalformed {
                reason: format!("unknown AECP message_type {raw}"),
            }),
        },
        Subtype::Unknown(raw) => Err(crate::error::CodecError::UnknownSubtype { subtype: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AVDECC_MULTICAST_MAC;

    #[test]
    fn test_classify_adp() {
        let frame = AdpFrame {
            message_type: AdpMessageType::EntityDiscover,
            valid_time: 0,
            entity_id: 0,
            entity_model_id: 0,
            entity_capabilities: 0,
            talker_stream_sources: 0,
            talker_capabilities: 0,
            listener_stream_sinks: 0,
            listener_capabilities: 0,
            controller_capabilities: 0,
            available_index: 0,
            gptp_grandmaster_id: 0,
            gptp_domain_number: 0,
            identify_control_index: 0,
            interface_index: 0,
            association_id: 0,
        };
        let bytes = frame.build([1; 6], AVDECC_MULTICAST_MAC);
        match classify(&bytes).unwrap() {
            ClassifiedFrame::Adp(parsed) => assert_eq!(parsed, frame),
            other => panic!("expected Adp, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_rejects_unknown_subtype() {
        let mut buf = vec![0u8; 26];
        buf[12] = 0x22;
        buf[13] = 0xF0;
        buf[14] = 0x80 | 0x01;
        let err = classify(&buf).unwrap_err();
        assert!(matches!(err, crate::error::CodecError::UnknownSubtype { .. }));
    }
}
