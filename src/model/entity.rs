// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-entity record.
//!
//! One [`Entity`] per discovered AVDECC end station, keyed by its 64-bit
//! entity-id in [`crate::facade::Controller`]'s entity collection. Holds the
//! discovery-derived identity, the enumeration state, and the descriptor
//! tree built up one `READ_DESCRIPTOR` response at a time.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::descriptor::{ConfigurationDescriptors, Descriptor};
use crate::codec::DescriptorType;

/// Where an entity sits in the discover -> enumerate -> ready lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityStatus {
    /// Seen via ADP, enumeration not yet started.
    Discovered,
    /// Breadth-first descriptor enumeration is in progress.
    Enumerating,
    /// Enumeration finished; `END_STATION_READ_COMPLETED` has been raised.
    Online,
    /// Stopped advertising, or its validity timer lapsed.
    Departed,
}

/// A discovered AVDECC end station and everything learned about it so far.
#[derive(Debug, Clone)]
pub struct Entity {
    pub entity_id: u64,
    pub mac: [u8; 6],
    pub entity_model_id: u64,
    pub available_index: u32,
    pub status: EntityStatus,
    pub last_seen: Instant,
    /// `valid_time` from the most recent ADP advertisement, doubled: an
    /// entity is declared departed after 2x its advertised valid_time with
    /// no refreshing ADP.
    pub validity_window: Duration,
    pub current_configuration_index: u16,
    /// The entity's own top-level `ENTITY` descriptor, once read.
    pub entity_descriptor: Option<Descriptor>,
    configurations: HashMap<u16, ConfigurationDescriptors>,
    pub acquired_by_us: bool,
    pub locked_by_us: bool,
    /// Entity-id that currently holds the `ACQUIRE_ENTITY` lock on this end
    /// station, from the most recent successful (un)acquire response. `None`
    /// once the response reports the entity is free again.
    pub acquired_by: Option<u64>,
    /// Same as [`Entity::acquired_by`] for `LOCK_ENTITY`.
    pub locked_by: Option<u64>,
}

impl Entity {
    #[must_use]
    pub fn new(
        entity_id: u64,
        mac: [u8; 6],
        entity_model_id: u64,
        available_index: u32,
        valid_time_units: u8,
        now: Instant,
    ) -> Self {
        Self {
            entity_id,
            mac,
            entity_model_id,
            available_index,
            status: EntityStatus::Discovered,
            last_seen: now,
            validity_window: Duration::from_secs(u64::from(valid_time_units) * 2),
            current_configuration_index: 0,
            entity_descriptor: None,
            configurations: HashMap::new(),
            acquired_by_us: false,
            locked_by_us: false,
            acquired_by: None,
            locked_by: None,
        }
    }

    /// Apply an `ACQUIRE_ENTITY` response: `owner_entity_id == 0` means the
    /// entity reports itself free, any other value is who holds the lock.
    pub fn apply_acquire_state(&mut self, controller_entity_id: u64, owner_entity_id: u64) {
        self.acquired_by = (owner_entity_id != 0).then_some(owner_entity_id);
        self.acquired_by_us = owner_entity_id == controller_entity_id;
    }

    /// Apply a `LOCK_ENTITY` response, same convention as [`Entity::apply_acquire_state`].
    pub fn apply_lock_state(&mut self, controller_entity_id: u64, locked_entity_id: u64) {
        self.locked_by = (locked_entity_id != 0).then_some(locked_entity_id);
        self.locked_by_us = locked_entity_id == controller_entity_id;
    }

    /// Whether a fresh ADP advertisement (`available_index`, `entity_model_id`)
    /// signals that this end station's entity model changed underneath us,
    /// requiring the whole descriptor tree to be discarded: triggered by an
    /// `available_index` decrease or an `entity_model_id` change.
    #[must_use]
    pub fn requires_reenumeration(&self, new_available_index: u32, new_entity_model_id: u64) -> bool {
        new_available_index < self.available_index || new_entity_model_id != self.entity_model_id
    }

    /// Discard the descriptor tree and enumeration state, keeping identity
    /// (`entity_id`, `mac`) and re-arming for a fresh enumeration pass.
    pub fn reset_for_reenumeration(&mut self, new_available_index: u32, new_entity_model_id: u64) {
        self.available_index = new_available_index;
        self.entity_model_id = new_entity_model_id;
        self.entity_descriptor = None;
        self.configurations.clear();
        self.current_configuration_index = 0;
        self.status = EntityStatus::Discovered;
    }

    pub fn refresh_liveness(&mut self, now: Instant, valid_time_units: u8) {
        self.last_seen = now;
        self.validity_window = Duration::from_secs(u64::from(valid_time_units) * 2);
        if self.status == EntityStatus::Departed {
            self.status = if self.entity_descriptor.is_some() {
                EntityStatus::Online
            } else {
                EntityStatus::Enumerating
            };
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.last_seen) >= self.validity_window
    }

    pub fn configuration_mut(&mut self, index: u16) -> &mut ConfigurationDescriptors {
        self.configurations.entry(index).or_default()
    }

    #[must_use]
    pub fn configuration(&self, index: u16) -> Option<&ConfigurationDescriptors> {
        self.configurations.get(&index)
    }

    /// Insert a descriptor read in the currently active configuration.
    /// Returns `false` if the slot was already populated this pass.
    pub fn insert_descriptor(&mut self, configuration_index: u16, descriptor: Descriptor) -> bool {
        self.configuration_mut(configuration_index).insert(descriptor)
    }

    #[must_use]
    pub fn get_descriptor(
        &self,
        configuration_index: u16,
        descriptor_type: DescriptorType,
        descriptor_index: u16,
    ) -> Option<&Descriptor> {
        self.configurations
            .get(&configuration_index)?
            .get(descriptor_type, descriptor_index)
    }

    /// Locate the stored descriptor a non-`READ_DESCRIPTOR` AEM response is
    /// addressed to, for recording its response payload or (for `SET_NAME`)
    /// mutating its cached name in place. `ENTITY` is addressed directly;
    /// everything else is looked up as a child of `configuration_index`.
    pub fn addressed_descriptor_mut(
        &mut self,
        configuration_index: u16,
        descriptor_type: DescriptorType,
        descriptor_index: u16,
    ) -> Option<&mut Descriptor> {
        if descriptor_type == DescriptorType::Entity {
            return self.entity_descriptor.as_mut();
        }
        if descriptor_type == DescriptorType::Configuration {
            return self.configurations.get_mut(&descriptor_index)?.own.as_mut();
        }
        self.configurations
            .get_mut(&configuration_index)?
            .get_mut(descriptor_type, descriptor_index)
    }

    /// Read-only counterpart of [`Entity::addressed_descriptor_mut`], for
    /// host-context queries of the cached descriptor tree.
    #[must_use]
    pub fn addressed_descriptor(
        &self,
        configuration_index: u16,
        descriptor_type: DescriptorType,
        descriptor_index: u16,
    ) -> Option<&Descriptor> {
        if descriptor_type == DescriptorType::Entity {
            return self.entity_descriptor.as_ref();
        }
        if descriptor_type == DescriptorType::Configuration {
            return self.configurations.get(&descriptor_index)?.own.as_ref();
        }
        self.configurations
            .get(&configuration_index)?
            .get(descriptor_type, descriptor_index)
    }

    pub fn mark_departed(&mut self) {
        self.status = EntityStatus::Departed;
    }

    pub fn mark_online(&mut self) {
        self.status = EntityStatus::Online;
    }

    pub fn mark_enumerating(&mut self) {
        self.status = EntityStatus::Enumerating;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(now: Instant) -> Entity {
        Entity::new(0xAABB_CCFF_FEDD_EEFF, [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF], 0x11, 1, 10, now)
    }

    #[test]
    fn test_new_entity_starts_discovered() {
        let now = Instant::now();
        let e = sample(now);
        assert_eq!(e.status, EntityStatus::Discovered);
        assert!(e.entity_descriptor.is_none());
    }

    #[test]
    fn test_requires_reenumeration_on_available_index_decrease() {
        let e = sample(Instant::now());
        assert!(e.requires_reenumeration(0, e.entity_model_id));
        assert!(!e.requires_reenumeration(2, e.entity_model_id));
    }

    #[test]
    fn test_requires_reenumeration_on_model_id_change() {
        let e = sample(Instant::now());
        assert!(e.requires_reenumeration(e.available_index + 1, 0xDEAD));
    }

    #[test]
    fn test_insert_descriptor_is_append_only_per_configuration() {
        let mut e = sample(Instant::now());
        assert!(e.insert_descriptor(0, Descriptor::new(DescriptorType::StreamInput, 0, vec![1])));
        assert!(!e.insert_descriptor(0, Descriptor::new(DescriptorType::StreamInput, 0, vec![2])));
        assert_eq!(e.get_descriptor(0, DescriptorType::StreamInput, 0).unwrap().raw, vec![1]);
    }

    #[test]
    fn test_reset_for_reenumeration_clears_tree() {
        let mut e = sample(Instant::now());
        e.insert_descriptor(0, Descriptor::new(DescriptorType::StreamInput, 0, vec![1]));
        e.mark_online();
        e.reset_for_reenumeration(5, 0xBEEF);
        assert!(e.configuration(0).is_none());
        assert_eq!(e.status, EntityStatus::Discovered);
        assert_eq!(e.available_index, 5);
        assert_eq!(e.entity_model_id, 0xBEEF);
    }

    #[test]
    fn test_addressed_descriptor_finds_entity_and_children() {
        let mut e = sample(Instant::now());
        e.entity_descriptor = Some(Descriptor::new(DescriptorType::Entity, 0, vec![9]));
        e.insert_descriptor(0, Descriptor::new(DescriptorType::StreamInput, 2, vec![1, 2]));

        assert_eq!(e.addressed_descriptor(0, DescriptorType::Entity, 0).unwrap().raw, vec![9]);
        assert_eq!(
            e.addressed_descriptor(0, DescriptorType::StreamInput, 2).unwrap().raw,
            vec![1, 2]
        );
        assert!(e.addressed_descriptor(0, DescriptorType::StreamInput, 9).is_none());
    }

    #[test]
    fn test_acquire_and_lock_state_tracks_owner() {
        let mut e = sample(Instant::now());
        e.apply_acquire_state(0xC0FFEE, 0xC0FFEE);
        assert_eq!(e.acquired_by, Some(0xC0FFEE));
        assert!(e.acquired_by_us);

        e.apply_acquire_state(0xC0FFEE, 0);
        assert_eq!(e.acquired_by, None);
        assert!(!e.acquired_by_us);

        e.apply_lock_state(0xC0FFEE, 0xBEEF);
        assert_eq!(e.locked_by, Some(0xBEEF));
        assert!(!e.locked_by_us);
    }

    #[test]
    fn test_expiry_uses_doubled_valid_time() {
        let start = Instant::now();
        let e = sample(start);
        assert!(!e.is_expired(start));
        assert!(e.is_expired(start + e.validity_window + Duration::from_millis(1)));
    }
}
