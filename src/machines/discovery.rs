// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery state machine.
//!
//! Stateless with respect to the entity collection: this module only
//! validates and decodes ADP advertisements and builds `ENTITY_DISCOVER`
//! frames. [`crate::facade::Controller`] owns the entity collection and
//! decides new-vs-refresh-vs-departed from what this module hands back.

use crate::codec::{AdpFrame, AdpMessageType};
use crate::config::{
    ControllerConfig, ENTITY_CAPABILITIES_ENTITY_NOT_READY, ENTITY_CAPABILITIES_GENERAL_CONTROLLER_IGNORE,
};
use crate::error::{DiscoveryError, DiscoveryResult};

/// A validated `ENTITY_AVAILABLE`/`ENTITY_DEPARTING` advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advertisement {
    pub entity_id: u64,
    pub mac: [u8; 6],
    pub entity_model_id: u64,
    pub available_index: u32,
    pub valid_time_units: u8,
    pub departing: bool,
}

/// Validate and decode an ADPDU already known to carry `src_mac` as its
/// Ethernet source.
///
/// # Errors
/// [`DiscoveryError::IllegalZeroEntityId`] for a zero entity-id;
/// [`DiscoveryError::FilteredByCapabilities`] if the advertisement's
/// capability bitfields fail any configured filter, or if
/// `ENTITY_NOT_READY`/`GENERAL_CONTROLLER_IGNORE` is set.
pub fn parse_advertisement(
    frame: &AdpFrame,
    src_mac: [u8; 6],
    filters: &ControllerConfig,
) -> DiscoveryResult<Advertisement> {
    if frame.entity_id == 0 {
        return Err(DiscoveryError::IllegalZeroEntityId);
    }

    let departing = matches!(frame.message_type, AdpMessageType::EntityDeparting);

    if !departing {
        if frame.entity_capabilities & ENTITY_CAPABILITIES_ENTITY_NOT_READY != 0
            || frame.entity_capabilities & ENTITY_CAPABILITIES_GENERAL_CONTROLLER_IGNORE != 0
        {
            return Err(DiscoveryError::FilteredByCapabilities);
        }
        if filters.entity_capabilities_filter != 0
            && frame.entity_capabilities & filters.entity_capabilities_filter
                != filters.entity_capabilities_filter
        {
            return Err(DiscoveryError::FilteredByCapabilities);
        }
        if filters.talker_capabilities_filter != 0
            && frame.talker_capabilities & filters.talker_capabilities_filter as u16
                != filters.talker_capabilities_filter as u16
        {
            return Err(DiscoveryError::FilteredByCapabilities);
        }
        if filters.listener_capabilities_filter != 0
            && frame.listener_capabilities & filters.listener_capabilities_filter as u16
                != filters.listener_capabilities_filter as u16
        {
            return Err(DiscoveryError::FilteredByCapabilities);
        }
    }

    Ok(Advertisement {
        entity_id: frame.entity_id,
        mac: src_mac,
        entity_model_id: frame.entity_model_id,
        available_index: frame.available_index,
        valid_time_units: frame.valid_time,
        departing,
    })
}

/// Build an `ENTITY_DISCOVER` advertisement requesting every entity on the
/// segment to (re-)announce itself. `target_entity_id` of `0` means
/// "everyone"; a nonzero value targets a single entity-id.
#[must_use]
pub fn build_entity_discover(_src_mac: [u8; 6], target_entity_id: u64) -> AdpFrame {
    AdpFrame {
        message_type: AdpMessageType::EntityDiscover,
        valid_time: 0,
        entity_id: target_entity_id,
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
    }
}
