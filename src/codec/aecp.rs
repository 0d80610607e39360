// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! AECPDU (AVDECC Enumeration and Control Protocol) build/parse.
//!
//! Two message families share the AECP subtype: AEM (entity model commands,
//! `READ_DESCRIPTOR` and friends) and AA (address access, raw memory
//! read/write TLVs). Both carry a variable-length, opaque payload after a
//! small fixed header — this codec never interprets descriptor or TLV
//! contents, only the AECP envelope around them.

use crate::config::{AECP_MAX_FRAME_LEN, AECP_MIN_FRAME_LEN, COMMON_CONTROL_HEADER_LEN, ETHERNET_HEADER_LEN};
use crate::error::{CodecError, CodecResult};

use super::bytes::{get_u16, get_u64, put_u16, put_u64};
use super::ethernet::{build_ethernet_and_common, parse_ethernet_and_common};
use super::types::{AecpMessageType, Subtype};

const HEADER_LEN: usize = ETHERNET_HEADER_LEN + COMMON_CONTROL_HEADER_LEN;

const AEM_CONTROLLER_ENTITY_ID_OFF: usize = 0;
const AEM_SEQUENCE_ID_OFF: usize = 8;
const AEM_COMMAND_TYPE_OFF: usize = 10;
const AEM_DESCRIPTOR_TYPE_OFF: usize = 12;
const AEM_DESCRIPTOR_INDEX_OFF: usize = 14;
/// Fixed AEM fields following the common header, before the opaque payload.
const AEM_FIXED_LEN: usize = 16;

/// A decoded or to-be-built AEM command/response AECPDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AecpAemFrame {
    pub message_type: AecpMessageType,
    /// 5-bit AEM status (ignored/0 on a command).
    pub status: u8,
    pub target_entity_id: u64,
    pub controller_entity_id: u64,
    pub sequence_id: u16,
    /// Raw `command_type` including the unsolicited bit; decode with
    /// [`crate::codec::types::AemCommandType::from_wire`].
    pub command_type: u16,
    pub descriptor_type: u16,
    pub descriptor_index: u16,
    /// Command-specific payload, carried through verbatim.
    pub payload: Vec<u8>,
}

impl AecpAemFrame {
    /// # Errors
    /// See [`super::ethernet::parse_ethernet_and_common`] and the fixed-length
    /// and subtype checks performed here.
    pub fn parse(buf: &[u8]) -> CodecResult<Self> {
        let (hdr, offset) = parse_ethernet_and_common(buf)?;
        if hdr.subtype != Subtype::Aecp {
            return Err(CodecError::UnknownSubtype {
                subtype: u8::from(hdr.subtype),
            });
        }
        let p = &buf[offset..];
        if p.len() < AEM_FIXED_LEN {
            return Err(CodecError::FrameTooShort {
                expected_at_least: HEADER_LEN + AEM_FIXED_LEN,
                got: buf.len(),
            });
        }

        Ok(AecpAemFrame {
            message_type: AecpMessageType::from(hdr.message_type),
            status: hdr.status,
            target_entity_id: hdr.stream_id,
            controller_entity_id: get_u64(p, AEM_CONTROLLER_ENTITY_ID_OFF),
            sequence_id: get_u16(p, AEM_SEQUENCE_ID_OFF),
            command_type: get_u16(p, AEM_COMMAND_TYPE_OFF),
            descriptor_type: get_u16(p, AEM_DESCRIPTOR_TYPE_OFF),
            descriptor_index: get_u16(p, AEM_DESCRIPTOR_INDEX_OFF),
            payload: p[AEM_FIXED_LEN..].to_vec(),
        })
    }

    /// # Errors
    /// [`CodecError::BufferTooSmall`] never occurs (the buffer is
    /// self-sized); returns [`CodecError::FrameMalformed`] if the resulting
    /// frame would exceed [`AECP_MAX_FRAME_LEN`].
    pub fn build(&self, src_mac: [u8; 6], dest_mac: [u8; 6]) -> CodecResult<Vec<u8>> {
        let total_len = HEADER_LEN + AEM_FIXED_LEN + self.payload.len();
        if total_len > AECP_MAX_FRAME_LEN {
            return Err(CodecError::FrameMalformed {
                reason: format!("AEM frame {total_len} exceeds max {AECP_MAX_FRAME_LEN}"),
            });
        }
        debug_assert!(total_len >= AECP_MIN_FRAME_LEN);

        let mut buf = vec![0u8; total_len];
        build_ethernet_and_common(
            &mut buf,
            dest_mac,
            src_mac,
            Subtype::Aecp,
            self.message_type.into(),
            self.status,
            (AEM_FIXED_LEN + self.payload.len()) as u16,
            self.target_entity_id,
        )?;

        let p = &mut buf[HEADER_LEN..];
        put_u64(p, AEM_CONTROLLER_ENTITY_ID_OFF, self.controller_entity_id);
        put_u16(p, AEM_SEQUENCE_ID_OFF, self.sequence_id);
        put_u16(p, AEM_COMMAND_TYPE_OFF, self.command_type);
        put_u16(p, AEM_DESCRIPTOR_TYPE_OFF, self.descriptor_type);
        put_u16(p, AEM_DESCRIPTOR_INDEX_OFF, self.descriptor_index);
        p[AEM_FIXED_LEN..].copy_from_slice(&self.payload);

        Ok(buf)
    }
}

const AA_CONTROLLER_ENTITY_ID_OFF: usize = 0;
const AA_SEQUENCE_ID_OFF: usize = 8;
const AA_TLV_COUNT_OFF: usize = 10;
/// Fixed AA fields following the common header, before the opaque TLV payload.
const AA_FIXED_LEN: usize = 12;

/// A decoded or to-be-built AA (address access) AECPDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AecpAaFrame {
    pub message_type: AecpMessageType,
    pub status: u8,
    pub target_entity_id: u64,
    pub controller_entity_id: u64,
    pub sequence_id: u16,
    pub tlv_count: u16,
    /// Raw TLV bytes, carried through verbatim.
    pub payload: Vec<u8>,
}

impl AecpAaFrame {
    /// # Errors
    /// See [`AecpAemFrame::parse`].
    pub fn parse(buf: &[u8]) -> CodecResult<Self> {
        let (hdr, offset) = parse_ethernet_and_common(buf)?;
        if hdr.subtype != Subtype::Aecp {
            return Err(CodecError::UnknownSubtype {
                subtype: u8::from(hdr.subtype),
            });
        }
        let p = &buf[offset..];
        if p.len() < AA_FIXED_LEN {
            return Err(CodecError::FrameTooShort {
                expected_at_least: HEADER_LEN + AA_FIXED_LEN,
                got: buf.len(),
            });
        }

        Ok(AecpAaFrame {
            message_type: AecpMessageType::from(hdr.message_type),
            status: hdr.status,
            target_entity_id: hdr.stream_id,
            controller_entity_id: get_u64(p, AA_CONTROLLER_ENTITY_ID_OFF),
            sequence_id: get_u16(p, AA_SEQUENCE_ID_OFF),
            tlv_count: get_u16(p, AA_TLV_COUNT_OFF),
            payload: p[AA_FIXED_LEN..].to_vec(),
        })
    }

    /// # Errors
    /// Returns [`CodecError::FrameMalformed`] if the resulting frame would
    /// exceed [`AECP_MAX_FRAME_LEN`].
    pub fn build(&self, src_mac: [u8; 6], dest_mac: [u8; 6]) -> CodecResult<Vec<u8>> {
        let total_len = HEADER_LEN + AA_FIXED_LEN + self.payload.len();
        if total_len > AECP_MAX_FRAME_LEN {
            return Err(CodecError::FrameMalformed {
                reason: format!("AA frame {total_len} exceeds max {AECP_MAX_FRAME_LEN}"),
            });
        }

        let mut buf = vec![0u8; total_len];
        build_ethernet_and_common(
            &mut buf,
            dest_mac,
            src_mac,
            Subtype::Aecp,
            self.message_type.into(),
            self.status,
            (AA_FIXED_LEN + self.payload.len()) as u16,
            self.target_entity_id,
        )?;

        let p = &mut buf[HEADER_LEN..];
        put_u64(p, AA_CONTROLLER_ENTITY_ID_OFF, self.controller_entity_id);
        put_u16(p, AA_SEQUENCE_ID_OFF, self.sequence_id);
        put_u16(p, AA_TLV_COUNT_OFF, self.tlv_count);
        p[AA_FIXED_LEN..].copy_from_slice(&self.payload);

        Ok(buf)
    }
}
