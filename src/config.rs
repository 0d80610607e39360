// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! AVDECC Global Configuration - Single Source of Truth
//!
//! This module centralizes the wire constants, timeouts, and multicast
//! addresses mandated by IEEE 1722.1. **Never hardcode these elsewhere.**
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Compile-time constants (1722.1 spec, EtherType, timeouts)
//! - **Level 2 (Dynamic)**: [`ControllerConfig`] for per-instance runtime knobs
//!   (capability filters, tick period, frame size ceiling)

use std::time::Duration;

// =======================================================================
// Ethernet / AVTP framing (IEEE 1722-2016 Sec.5, IEEE 1722.1-2013 Sec.6)
// =======================================================================

/// AVTP EtherType (IEEE 1722).
pub const AVTP_ETHERTYPE: u16 = 0x22F0;

/// Length of the Ethernet header (dest MAC + src MAC + EtherType), in bytes.
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Length of the common AVTPDU control header following the Ethernet header.
pub const COMMON_CONTROL_HEADER_LEN: usize = 12;

/// ADPDU subtype byte value.
pub const SUBTYPE_ADP: u8 = 0xFA;
/// AECPDU subtype byte value.
pub const SUBTYPE_AECP: u8 = 0xFB;
/// ACMPDU subtype byte value.
pub const SUBTYPE_ACMP: u8 = 0xFC;

/// Total ADPDU frame length, including the Ethernet header (fixed).
pub const ADP_FRAME_LEN: usize = 82;
/// Total ACMPDU frame length, including the Ethernet header (fixed).
pub const ACMP_FRAME_LEN: usize = 70;
/// Minimum AECPDU frame length, including the Ethernet header (AEM, no payload).
pub const AECP_MIN_FRAME_LEN: usize = 42;
/// Maximum AECPDU frame length the codec will build or accept.
pub const AECP_MAX_FRAME_LEN: usize = 1500;

/// IEEE 1722.1 AVDECC multicast destination MAC (91:E0:F0:01:00:00).
///
/// Used for ADP advertisements/discovery and for all ACMP traffic.
pub const AVDECC_MULTICAST_MAC: [u8; 6] = [0x91, 0xe0, 0xf0, 0x01, 0x00, 0x00];

// =======================================================================
// Timeouts (IEEE 1722.1-2013 Sec.8, Table 8.1 / Sec.9, Table 9.3)
// =======================================================================

/// AECP command timeout: first attempt and the single retry both use this.
pub const AECP_COMMAND_TIMEOUT: Duration = Duration::from_millis(250);

/// Descriptor-level read timeout used by the enumeration driver.
///
/// Strictly longer than [`AECP_COMMAND_TIMEOUT`] so a retried READ_DESCRIPTOR
/// still resolves before the driver gives up on the slot.
pub const ENUMERATION_READ_TIMEOUT: Duration = Duration::from_millis(750);

/// Per-ACMP-command-type timeout table (IEEE 1722.1-2013 Table 8.1).
pub const ACMP_CONNECT_TX_TIMEOUT: Duration = Duration::from_millis(2000);
pub const ACMP_DISCONNECT_TX_TIMEOUT: Duration = Duration::from_millis(200);
pub const ACMP_GET_TX_STATE_TIMEOUT: Duration = Duration::from_millis(200);
pub const ACMP_CONNECT_RX_TIMEOUT: Duration = Duration::from_millis(4500);
pub const ACMP_DISCONNECT_RX_TIMEOUT: Duration = Duration::from_millis(500);
pub const ACMP_GET_RX_STATE_TIMEOUT: Duration = Duration::from_millis(200);
pub const ACMP_GET_TX_CONNECTION_TIMEOUT: Duration = Duration::from_millis(200);

/// Recommended minimum tick rate for the embedder (10 Hz -> 100 ms).
pub const RECOMMENDED_TICK_PERIOD: Duration = Duration::from_millis(100);

/// Capacity of the bounded notification/log rings before entries are dropped
/// and `missed_events`/`missed_logs` starts incrementing.
pub const NOTIFICATION_QUEUE_CAPACITY: usize = 1024;
pub const ACMP_NOTIFICATION_QUEUE_CAPACITY: usize = 512;
pub const LOG_QUEUE_CAPACITY: usize = 2048;

/// Bit flags for an ADP advertisement's `entity_capabilities` field that the
/// discovery machine treats as "ignore this advertisement" (IEEE 1722.1-2013
/// Table 6.3).
pub const ENTITY_CAPABILITIES_ENTITY_NOT_READY: u32 = 0x0000_0002;
pub const ENTITY_CAPABILITIES_GENERAL_CONTROLLER_IGNORE: u32 = 0x0000_0004;

/// Per-instance runtime configuration for a [`crate::facade::Controller`].
///
/// Cheap, `Clone`, and carries only knobs a host actually needs to tune
/// per deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Advertisements must have all these bits set in `entity_capabilities` or
    /// they are dropped before any further processing. `0` disables the filter.
    pub entity_capabilities_filter: u32,
    /// Same semantics, for `talker_capabilities`.
    pub talker_capabilities_filter: u32,
    /// Same semantics, for `listener_capabilities`.
    pub listener_capabilities_filter: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            entity_capabilities_filter: 0,
            talker_capabilities_filter: 0,
            listener_capabilities_filter: 0,
        }
    }
}

/// Derive the controller's own AVDECC entity-id from its interface MAC.
///
/// Layout (IEEE 1722.1-2013 Sec.6.2.1.1): upper 3 bytes of the MAC, then the
/// fixed `0xFFFE`, then the lower 3 bytes of the MAC.
///
/// # Examples
/// ```
/// use avdecc::config::derive_controller_entity_id;
///
/// let mac: u64 = 0x0000_AABB_CCDD_EEFF;
/// let eid = derive_controller_entity_id(mac);
/// assert_eq!(eid, 0xAABB_CCFF_FEDD_EEFF);
/// ```
#[must_use]
pub fn derive_controller_entity_id(mac: u64) -> u64 {
    let mac = mac & 0xFFFF_FFFF_FFFF;
    let upper = (mac >> 24) & 0xFFFFFF;
    let lower = mac & 0xFFFFFF;
    (upper << 40) | (0xFFFEu64 << 24) | lower
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_controller_entity_id() {
        let mac = 0x0000_AABB_CCDD_EEFFu64;
        let eid = derive_controller_entity_id(mac);
        assert_eq!(eid, 0xAABB_CCFF_FEDD_EEFF);
    }

    #[test]
    fn test_derive_controller_entity_id_zero_mac() {
        assert_eq!(derive_controller_entity_id(0), 0x0000_00FF_FE00_0000);
    }

    #[test]
    fn test_default_config_has_no_filters() {
        let cfg = ControllerConfig::default();
        assert_eq!(cfg.entity_capabilities_filter, 0);
        assert_eq!(cfg.talker_capabilities_filter, 0);
        assert_eq!(cfg.listener_capabilities_filter, 0);
    }
}
