// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor storage.
//!
//! Every descriptor is stored as its [`crate::codec::DescriptorType`] tag
//! plus the verbatim `READ_DESCRIPTOR` response payload, rather than as a
//! type hierarchy with one variant per descriptor. Decoding field-level
//! contents of a specific descriptor type beyond what enumeration needs is
//! out of scope; the host decodes the raw bytes itself if it needs to.

use std::collections::HashMap;

use crate::codec::DescriptorType;

/// One descriptor slot in an entity's configuration, keyed by
/// `(descriptor_type, descriptor_index)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub descriptor_type: DescriptorType,
    pub descriptor_index: u16,
    /// Verbatim `READ_DESCRIPTOR` response payload (AEM command-specific
    /// bytes, opaque to this crate). Mutated in place only by `SET_NAME`
    /// (see [`Descriptor::apply_name`]); every other command's response is
    /// kept separately in [`Descriptor::last_response`].
    pub raw: Vec<u8>,
    /// Most recent response payload for each command this descriptor
    /// supports, keyed by the (unsolicited-bit-stripped) wire command type
    /// -- e.g. the last `GET_STREAM_INFO` result. Populated on every
    /// successful non-`READ_DESCRIPTOR` response addressed to this
    /// descriptor.
    pub last_response: HashMap<u16, Vec<u8>>,
    /// `true` once this entity (or this controller) holds an ACQUIRE_ENTITY
    /// lock that covers this descriptor's owning entity.
    pub acquired: bool,
    /// `true` once a LOCK_ENTITY lock covers this descriptor's owning entity.
    pub locked: bool,
}

impl Descriptor {
    #[must_use]
    pub fn new(descriptor_type: DescriptorType, descriptor_index: u16, raw: Vec<u8>) -> Self {
        Self {
            descriptor_type,
            descriptor_index,
            raw,
            last_response: HashMap::new(),
            acquired: false,
            locked: false,
        }
    }

    /// Record the payload of a successful response to `command_type`
    /// (stripped of the unsolicited bit) addressed to this descriptor.
    pub fn record_response(&mut self, command_type: u16, payload: Vec<u8>) {
        self.last_response.insert(command_type, payload);
    }

    #[must_use]
    pub fn response_for(&self, command_type: u16) -> Option<&[u8]> {
        self.last_response.get(&command_type).map(Vec::as_slice)
    }

    /// Overwrite the 64-byte name field at `offset` within this descriptor's
    /// stored `READ_DESCRIPTOR` bytes with a fresh `SET_NAME` value, so a
    /// subsequent read of the cached descriptor reflects the rename without
    /// another round trip. A no-op if `raw` is too short to hold the field
    /// (e.g. the descriptor was never actually read).
    pub fn apply_name(&mut self, offset: usize, name: &[u8]) {
        if self.raw.len() < offset + name.len() {
            return;
        }
        self.raw[offset..offset + name.len()].copy_from_slice(name);
    }
}

/// Byte offset of the primary (`name_index == 0`) object-name field within a
/// descriptor's stored `READ_DESCRIPTOR` payload, for `SET_NAME`/`GET_NAME`
/// in-place updates. Most descriptor types place a 64-byte `object_name`
/// immediately after the common `descriptor_type`/`descriptor_index` header
/// (which this crate's codec already strips before storing `raw`), so the
/// name sits at offset 0; `ENTITY` is the one exception, with `entity_name`
/// following several other fixed-size identity fields first. Returns `None`
/// for descriptor types that carry no name field (e.g. `LOCALE`, `STRINGS`).
#[must_use]
pub fn primary_name_offset(descriptor_type: DescriptorType) -> Option<usize> {
    match descriptor_type {
        DescriptorType::Locale | DescriptorType::Strings | DescriptorType::AudioMap => None,
        DescriptorType::Entity => Some(44),
        _ => Some(0),
    }
}

/// Key used to address one descriptor within a configuration.
pub type DescriptorKey = (DescriptorType, u16);

/// The descriptor tree for a single `Configuration` descriptor: every child
/// descriptor discovered under it so far, append-only within one
/// enumeration pass: entries are never mutated in place once stored.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationDescriptors {
    /// The `CONFIGURATION` descriptor itself, once read. `None` until its
    /// own `READ_DESCRIPTOR` response arrives, even if children below it
    /// are already known (children are enqueued from this descriptor's
    /// counts table, so in practice this is always populated first).
    pub own: Option<Descriptor>,
    children: HashMap<DescriptorKey, Descriptor>,
}

impl ConfigurationDescriptors {
    #[must_use]
    pub fn new() -> Self {
        Self { own: None, children: HashMap::new() }
    }

    /// Store the `CONFIGURATION` descriptor itself (not a child). Returns
    /// `false` without overwriting if already set.
    pub fn set_own(&mut self, descriptor: Descriptor) -> bool {
        if self.own.is_some() {
            return false;
        }
        self.own = Some(descriptor);
        true
    }

    /// Insert a descriptor read for the first time this pass. Returns
    /// `false` without overwriting if the slot is already populated — the
    /// append-only invariant.
    pub fn insert(&mut self, descriptor: Descriptor) -> bool {
        let key = (descriptor.descriptor_type, descriptor.descriptor_index);
        if self.children.contains_key(&key) {
            return false;
        }
        self.children.insert(key, descriptor);
        true
    }

    #[must_use]
    pub fn get(&self, descriptor_type: DescriptorType, descriptor_index: u16) -> Option<&Descriptor> {
        self.children.get(&(descriptor_type, descriptor_index))
    }

    pub fn get_mut(
        &mut self,
        descriptor_type: DescriptorType,
        descriptor_index: u16,
    ) -> Option<&mut Descriptor> {
        self.children.get_mut(&(descriptor_type, descriptor_index))
    }

    #[must_use]
    pub fn contains(&self, descriptor_type: DescriptorType, descriptor_index: u16) -> bool {
        self.children.contains_key(&(descriptor_type, descriptor_index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.children.values()
    }

    pub fn count_of_type(&self, descriptor_type: DescriptorType) -> usize {
        self.children
            .keys()
            .filter(|(ty, _)| *ty == descriptor_type)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_append_only() {
        let mut cfg = ConfigurationDescriptors::new();
        assert!(cfg.insert(Descriptor::new(DescriptorType::StreamInput, 0, vec![1, 2, 3])));
        assert!(!cfg.insert(Descriptor::new(DescriptorType::StreamInput, 0, vec![9, 9, 9])));
        assert_eq!(cfg.get(DescriptorType::StreamInput, 0).unwrap().raw, vec![1, 2, 3]);
    }

    #[test]
    fn test_count_of_type() {
        let mut cfg = ConfigurationDescriptors::new();
        cfg.insert(Descriptor::new(DescriptorType::StreamInput, 0, vec![]));
        cfg.insert(Descriptor::new(DescriptorType::StreamInput, 1, vec![]));
        cfg.insert(Descriptor::new(DescriptorType::StreamOutput, 0, vec![]));
        assert_eq!(cfg.count_of_type(DescriptorType::StreamInput), 2);
        assert_eq!(cfg.count_of_type(DescriptorType::StreamOutput), 1);
        assert_eq!(cfg.len(), 3);
    }

    #[test]
    fn test_unknown_descriptor_type_carried_through() {
        let mut cfg = ConfigurationDescriptors::new();
        let unknown = DescriptorType::Unknown(0xABCD);
        cfg.insert(Descriptor::new(unknown, 0, vec![0xFF]));
        assert!(cfg.contains(unknown, 0));
    }

    #[test]
    fn test_set_own_is_set_once() {
        let mut cfg = ConfigurationDescriptors::new();
        assert!(cfg.own.is_none());
        assert!(cfg.set_own(Descriptor::new(DescriptorType::Configuration, 0, vec![1])));
        assert!(!cfg.set_own(Descriptor::new(DescriptorType::Configuration, 0, vec![2])));
        assert_eq!(cfg.own.as_ref().unwrap().raw, vec![1]);
    }

    #[test]
    fn test_record_response_keeps_latest_per_command() {
        let mut d = Descriptor::new(DescriptorType::StreamInput, 0, vec![]);
        d.record_response(0x000B, vec![1, 1]); // GET_STREAM_INFO
        d.record_response(0x000B, vec![2, 2]);
        d.record_response(0x000A, vec![9]); // SET_STREAM_INFO
        assert_eq!(d.response_for(0x000B), Some([2u8, 2].as_slice()));
        assert_eq!(d.response_for(0x000A), Some([9u8].as_slice()));
        assert_eq!(d.response_for(0x0099), None);
    }

    #[test]
    fn test_apply_name_overwrites_in_place() {
        let mut d = Descriptor::new(DescriptorType::StreamInput, 0, vec![0u8; 8]);
        d.apply_name(0, b"abcd");
        assert_eq!(&d.raw[0..4], b"abcd");
        assert_eq!(&d.raw[4..8], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_apply_name_noop_when_raw_too_short() {
        let mut d = Descriptor::new(DescriptorType::StreamInput, 0, vec![]);
        d.apply_name(0, b"abcd");
        assert!(d.raw.is_empty());
    }

    #[test]
    fn test_primary_name_offset() {
        assert_eq!(primary_name_offset(DescriptorType::Entity), Some(44));
        assert_eq!(primary_name_offset(DescriptorType::StreamInput), Some(0));
        assert_eq!(primary_name_offset(DescriptorType::Locale), None);
    }
}
