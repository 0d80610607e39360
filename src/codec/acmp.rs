// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ACMPDU (AVDECC Connection Management Protocol) build/parse.
//!
//! Fixed 70-byte frame, always sent to the AVDECC multicast MAC. The common
//! header's `stream_id` field carries the stream's id once a connection
//! exists (zero beforehand); `status` carries the [`AcmpStatus`] code.

use crate::config::ACMP_FRAME_LEN;
use crate::error::{CodecError, CodecResult};

use super::bytes::{get_eui48, get_u16, get_u64, put_eui48, put_u16, put_u64};
use super::ethernet::{build_ethernet_and_common, parse_ethernet_and_common};
use super::types::{AcmpMessageType, Subtype};

const CONTROLLER_ENTITY_ID_OFF: usize = 0;
const TALKER_ENTITY_ID_OFF: usize = 8;
const LISTENER_ENTITY_ID_OFF: usize = 16;
const TALKER_UNIQUE_ID_OFF: usize = 24;
const LISTENER_UNIQUE_ID_OFF: usize = 26;
const STREAM_DEST_MAC_OFF: usize = 28;
const CONNECTION_COUNT_OFF: usize = 34;
const SEQUENCE_ID_OFF: usize = 36;
const FLAGS_OFF: usize = 38;
/// Size of the ACMP-specific payload following the 26-byte Ethernet+common header.
const ACMP_PAYLOAD_LEN: usize = 44;

/// A decoded or to-be-built ACMPDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcmpFrame {
    pub message_type: AcmpMessageType,
    pub status: u8,
    pub stream_id: u64,
    pub controller_entity_id: u64,
    pub talker_entity_id: u64,
    pub listener_entity_id: u64,
    pub talker_unique_id: u16,
    pub listener_unique_id: u16,
    pub stream_dest_mac: [u8; 6],
    pub connection_count: u16,
    pub sequence_id: u16,
    pub flags: u16,
}

impl AcmpFrame {
    /// # Errors
    /// [`CodecError::FrameMalformed`] if `buf` isn't exactly
    /// [`ACMP_FRAME_LEN`] bytes; [`CodecError::UnknownSubtype`] if the common
    /// header subtype isn't ACMP.
    pub fn parse(buf: &[u8]) -> CodecResult<Self> {
        if buf.len() != ACMP_FRAME_LEN {
            return Err(CodecError::FrameMalformed {
                reason: format!(
                    "ACMPDU must be exactly {ACMP_FRAME_LEN} bytes, got {}",
                    buf.len()
                ),
            });
        }
        let (hdr, offset) = parse_ethernet_and_common(buf)?;
        if hdr.subtype != Subtype::Acmp {
            return Err(CodecError::UnknownSubtype {
                subtype: u8::from(hdr.subtype),
            });
        }
        let p = &buf[offset..];

        Ok(AcmpFrame {
            message_type: AcmpMessageType::from(hdr.message_type),
            status: hdr.status,
            stream_id: hdr.stream_id,
            controller_entity_id: get_u64(p, CONTROLLER_ENTITY_ID_OFF),
            talker_entity_id: get_u64(p, TALKER_ENTITY_ID_OFF),
            listener_entity_id: get_u64(p, LISTENER_ENTITY_ID_OFF),
            talker_unique_id: get_u16(p, TALKER_UNIQUE_ID_OFF),
            listener_unique_id: get_u16(p, LISTENER_UNIQUE_ID_OFF),
            stream_dest_mac: get_eui48(p, STREAM_DEST_MAC_OFF),
            connection_count: get_u16(p, CONNECTION_COUNT_OFF),
            sequence_id: get_u16(p, SEQUENCE_ID_OFF),
            flags: get_u16(p, FLAGS_OFF),
        })
    }

    /// Build this ACMPDU into a fresh [`ACMP_FRAME_LEN`]-byte buffer.
    #[must_use]
    pub fn build(&self, src_mac: [u8; 6], dest_mac: [u8; 6]) -> Vec<u8> {
        let mut buf = vec![0u8; ACMP_FRAME_LEN];
        build_ethernet_and_common(
            &mut buf,
            dest_mac,
            src_mac,
            Subtype::Acmp,
            self.message_type.into(),
            self.status,
            ACMP_PAYLOAD_LEN as u16,
            self.stream_id,
        )
        .expect("fixed-size ACMP buffer is always large enough");

        let p = &mut buf[ACMP_FRAME_LEN - ACMP_PAYLOAD_LEN..];
        put_u64(p, CONTROLLER_ENTITY_ID_OFF, self.controller_entity_id);
        put_u64(p, TALKER_ENTITY_ID_OFF, self.talker_entity_id);
        put_u64(p, LISTENER_ENTITY_ID_OFF, self.listener_entity_id);
        put_u16(p, TALKER_UNIQUE_ID_OFF, self.talker_unique_id);
        put_u16(p, LISTENER_UNIQUE_ID_OFF, self.listener_unique_id);
        put_eui48(p, STREAM_DEST_MAC_OFF, self.stream_dest_mac);
        put_u16(p, CONNECTION_COUNT_OFF, self.connection_count);
        put_u16(p, SEQUENCE_ID_OFF, self.sequence_id);
        put_u16(p, FLAGS_OFF, self.flags);

        buf
    }
}
