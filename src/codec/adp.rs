// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ADPDU (AVDECC Discovery Protocol) build/parse.
//!
//! Fixed 82-byte frame. The common header's `status` field carries
//! `valid_time` (units of 2 seconds) and its `stream_id` field carries the
//! advertising entity's `entity_id`.

use crate::config::ADP_FRAME_LEN;
use crate::error::{CodecError, CodecResult};

use super::bytes::{get_u16, get_u32, get_u64, put_u16, put_u32, put_u64};
use super::ethernet::{build_ethernet_and_common, parse_ethernet_and_common};
use super::types::{AdpMessageType, Subtype};

const ENTITY_MODEL_ID_OFF: usize = 0;
const ENTITY_CAPABILITIES_OFF: usize = 8;
const TALKER_STREAM_SOURCES_OFF: usize = 12;
const TALKER_CAPABILITIES_OFF: usize = 14;
const LISTENER_STREAM_SINKS_OFF: usize = 16;
const LISTENER_CAPABILITIES_OFF: usize = 18;
const CONTROLLER_CAPABILITIES_OFF: usize = 20;
const AVAILABLE_INDEX_OFF: usize = 24;
const GPTP_GRANDMASTER_ID_OFF: usize = 28;
const GPTP_DOMAIN_NUMBER_OFF: usize = 36;
const IDENTIFY_CONTROL_INDEX_OFF: usize = 38;
const INTERFACE_INDEX_OFF: usize = 40;
const ASSOCIATION_ID_OFF: usize = 42;
/// Size of the ADP-specific payload following the 26-byte Ethernet+common header.
const ADP_PAYLOAD_LEN: usize = 56;

/// A decoded or to-be-built ADPDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdpFrame {
    pub message_type: AdpMessageType,
    /// 2-second units (common header `status` field, 5 bits).
    pub valid_time: u8,
    pub entity_id: u64,
    pub entity_model_id: u64,
    pub entity_capabilities: u32,
    pub talker_stream_sources: u16,
    pub talker_capabilities: u16,
    pub listener_stream_sinks: u16,
    pub listener_capabilities: u16,
    pub controller_capabilities: u32,
    pub available_index: u32,
    pub gptp_grandmaster_id: u64,
    pub gptp_domain_number: u8,
    pub identify_control_index: u16,
    pub interface_index: u16,
    pub association_id: u64,
}

impl AdpFrame {
    /// Parse a full Ethernet frame as an ADPDU.
    ///
    /// # Errors
    /// [`CodecError::UnknownSubtype`] if the common header subtype isn't ADP;
    /// [`CodecError::FrameTooShort`]/[`CodecError::FrameMalformed`] as per
    /// [`super::ethernet::parse_ethernet_and_common`] and fixed-length checks.
    pub fn parse(buf: &[u8]) -> CodecResult<Self> {
        if buf.len() != ADP_FRAME_LEN {
            return Err(CodecError::FrameMalformed {
                reason: format!("ADPDU must be exactly {ADP_FRAME_LEN} bytes, got {}", buf.len()),
            });
        }
        let (hdr, offset) = parse_ethernet_and_common(buf)?;
        if hdr.subtype != Subtype::Adp {
            return Err(CodecError::UnknownSubtype {
                subtype: u8::from(hdr.subtype),
            });
        }
        let p = &buf[offset..];
        if p.len() < ADP_PAYLOAD_LEN {
            return Err(CodecError::FrameTooShort {
                expected_at_least: ADP_PAYLOAD_LEN,
                got: p.len(),
            });
        }

        Ok(AdpFrame {
            message_type: AdpMessageType::from(hdr.message_type),
            valid_time: hdr.status,
            entity_id: hdr.stream_id,
            entity_model_id: get_u64(p, ENTITY_MODEL_ID_OFF),
            entity_capabilities: get_u32(p, ENTITY_CAPABILITIES_OFF),
            talker_stream_sources: get_u16(p, TALKER_STREAM_SOURCES_OFF),
            talker_capabilities: get_u16(p, TALKER_CAPABILITIES_OFF),
            listener_stream_sinks: get_u16(p, LISTENER_STREAM_SINKS_OFF),
            listener_capabilities: get_u16(p, LISTENER_CAPABILITIES_OFF),
            controller_capabilities: get_u32(p, CONTROLLER_CAPABILITIES_OFF),
            available_index: get_u32(p, AVAILABLE_INDEX_OFF),
            gptp_grandmaster_id: get_u64(p, GPTP_GRANDMASTER_ID_OFF),
            gptp_domain_number: p[GPTP_DOMAIN_NUMBER_OFF],
            identify_control_index: get_u16(p, IDENTIFY_CONTROL_INDEX_OFF),
            interface_index: get_u16(p, INTERFACE_INDEX_OFF),
            association_id: get_u64(p, ASSOCIATION_ID_OFF),
        })
    }

    /// Build this ADPDU into a fresh [`ADP_FRAME_LEN`]-byte buffer addressed
    /// to the AVDECC multicast MAC, as every ADPDU on the wire is.
    #[must_use]
    pub fn build(&self, src_mac: [u8; 6], dest_mac: [u8; 6]) -> Vec<u8> {
        let mut buf = vec![0u8; ADP_FRAME_LEN];
        build_ethernet_and_common(
            &mut buf,
            dest_mac,
            src_mac,
            Subtype::Adp,
            self.message_type.into(),
            self.valid_time,
            ADP_PAYLOAD_LEN as u16,
            self.entity_id,
        )
        .expect("fixed-size ADP buffer is always large enough");

        let p = &mut buf[ADP_FRAME_LEN - ADP_PAYLOAD_LEN..];
        put_u64(p, ENTITY_MODEL_ID_OFF, self.entity_model_id);
        put_u32(p, ENTITY_CAPABILITIES_OFF, self.entity_capabilities);
        put_u16(p, TALKER_STREAM_SOURCES_OFF, self.talker_stream_sources);
        put_u16(p, TALKER_CAPABILITIES_OFF, self.talker_capabilities);
        put_u16(p, LISTENER_STREAM_SINKS_OFF, self.listener_stream_sinks);
        put_u16(p, LISTENER_CAPABILITIES_OFF, self.listener_capabilities);
        put_u32(p, CONTROLLER_CAPABILITIES_OFF, self.controller_capabilities);
        put_u32(p, AVAILABLE_INDEX_OFF, self.available_index);
        put_u64(p, GPTP_GRANDMASTER_ID_OFF, self.gptp_grandmaster_id);
        p[GPTP_DOMAIN_NUMBER_OFF] = self.gptp_domain_number;
        put_u16(p, IDENTIFY_CONTROL_INDEX_OFF, self.identify_control_index);
        put_u16(p, INTERFACE_INDEX_OFF, self.interface_index);
        put_u64(p, ASSOCIATION_ID_OFF, self.association_id);

        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AVDECC_MULTICAST_MAC;

    fn sample() -> AdpFrame {
        AdpFrame {
            message_type: AdpMessageType::EntityAvailable,
            valid_time: 10,
            entity_id: 0xAABB_CCFF_FEDD_EEFF,
            entity_model_id: 0x0011_2233_4455_6677,
            entity_capabilities: 0x0000_0008,
            talker_stream_sources: 2,
            talker_capabilities: 0x4801,
            listener_stream_sinks: 2,
            listener_capabilities: 0x4801,
            controller_capabilities: 0,
            available_index: 7,
            gptp_grandmaster_id: 0x0011_2233_4455_6677,
            gptp_domain_number: 0,
            identify_control_index: 0,
            interface_index: 0,
            association_id: 0,
        }
    }

    #[test]
    fn test_adp_roundtrip() {
        let frame = sample();
        let bytes = frame.build([0x01, 0x02, 0x03, 0x04, 0x05, 0x06], AVDECC_MULTICAST_MAC);
        assert_eq!(bytes.len(), ADP_FRAME_LEN);
        let parsed = AdpFrame::parse(&bytes).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn test_adp_rejects_wrong_length() {
        let err = AdpFrame::parse(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, CodecError::FrameMalformed { .. }));
    }

    #[test]
    fn test_adp_rejects_non_adp_subtype() {
        let frame = sample();
        let mut bytes = frame.build([0; 6], AVDECC_MULTICAST_MAC);
        bytes[14] = 0x80 | crate::config::SUBTYPE_AECP;
        let err = AdpFrame::parse(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::UnknownSubtype { .. }));
    }

    #[test]
    fn test_adp_discover_message_type() {
        let mut frame = sample();
        frame.message_type = AdpMessageType::EntityDiscover;
        let bytes = frame.build([0; 6], AVDECC_MULTICAST_MAC);
        let parsed = AdpFrame::parse(&bytes).unwrap();
        assert_eq!(parsed.message_type, AdpMessageType::EntityDiscover);
    }
}
