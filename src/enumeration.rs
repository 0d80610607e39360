// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor enumeration driver.
//!
//! Drives one entity's breadth-first `READ_DESCRIPTOR` walk: the `ENTITY`
//! descriptor first, then each `CONFIGURATION` it names, then every typed
//! child a configuration (or a child descriptor with its own sub-counts)
//! names in turn. Requests of the same descriptor type at the head of the
//! queue are sent together as one batch rather than one at a time, since
//! they're independent reads with no ordering dependency on each other.
//!
//! Retry/timeout for the individual `READ_DESCRIPTOR` commands is the AECP
//! controller's job ([`crate::machines::aecp::AecpController`]); this driver
//! only decides *what* to request next and reacts to the terminal
//! success/timeout of each request. A timed-out slot is skipped, not
//! treated as fatal to the whole pass — enumeration continues with the
//! remaining slots.

use std::collections::VecDeque;

use crate::codec::bytes::get_u16;
use crate::codec::DescriptorType;

/// One descriptor slot: the configuration it belongs to, its type, and its
/// index within that type. `configuration_index` is meaningless for the
/// `ENTITY` slot itself (always `0`, never read) since the entity descriptor
/// sits above any configuration.
pub type DescriptorSlot = (u16, DescriptorType, u16);

const ENTITY_CONFIGURATIONS_COUNT_OFF: usize = 304;
const LOCALE_NUMBER_OF_STRINGS_OFF: usize = 68;

/// `(count_offset, base_offset, child_type)` triples for the port/control
/// groups an `AUDIO_UNIT` descriptor names.
const AUDIO_UNIT_CHILD_FIELDS: &[(usize, usize, DescriptorType)] = &[
    (68, 70, DescriptorType::StreamPortInput),
    (72, 74, DescriptorType::StreamPortOutput),
    (76, 78, DescriptorType::ExternalPortInput),
    (80, 82, DescriptorType::ExternalPortOutput),
    (92, 94, DescriptorType::Control),
];

/// Same shape for a `STREAM_PORT_INPUT`/`STREAM_PORT_OUTPUT` descriptor's
/// control/cluster/map groups.
const STREAM_PORT_CHILD_FIELDS: &[(usize, usize, DescriptorType)] = &[
    (4, 6, DescriptorType::Control),
    (8, 10, DescriptorType::AudioCluster),
    (12, 14, DescriptorType::AudioMap),
];

fn read_u16_or_zero(raw: &[u8], offset: usize) -> u16 {
    if raw.len() >= offset + 2 {
        get_u16(raw, offset)
    } else {
        0
    }
}

/// Decode a `CONFIGURATION` descriptor's `descriptor_counts` table: object
/// name and localized description occupy the first 66 bytes, the count
/// follows at 66, a counts-table offset field (unused here, assumed
/// immediately adjacent) at 68, then that many `(descriptor_type, count)`
/// pairs starting at 70.
#[must_use]
pub fn parse_descriptor_counts(raw: &[u8]) -> Vec<(DescriptorType, u16)> {
    const COUNT_OFF: usize = 66;
    const TABLE_OFF: usize = 70;
    if raw.len() < TABLE_OFF {
        return Vec::new();
    }
    let count = get_u16(raw, COUNT_OFF) as usize;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let offset = TABLE_OFF + i * 4;
        if offset + 4 > raw.len() {
            break;
        }
        let descriptor_type = DescriptorType::from(get_u16(raw, offset));
        let descriptor_count = get_u16(raw, offset + 2);
        out.push((descriptor_type, descriptor_count));
    }
    out
}

/// Breadth-first `READ_DESCRIPTOR` walk for a single entity.
#[derive(Debug)]
pub struct EnumerationDriver {
    pending: VecDeque<DescriptorSlot>,
    inflight: Vec<DescriptorSlot>,
    done: bool,
}

impl Default for EnumerationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl EnumerationDriver {
    #[must_use]
    pub fn new() -> Self {
        let mut pending = VecDeque::new();
        pending.push_back((0, DescriptorType::Entity, 0));
        Self {
            pending,
            inflight: Vec::new(),
            done: false,
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }

    /// Dequeue the next batch of slots to request: every entry at the head
    /// of the queue that shares the first one's descriptor type. Returns an
    /// empty batch both when a batch is already outstanding and when the
    /// pass is done.
    pub fn next_batch_to_request(&mut self) -> Vec<DescriptorSlot> {
        if !self.inflight.is_empty() || self.pending.is_empty() {
            return Vec::new();
        }
        let first = self.pending.pop_front().expect("checked non-empty above");
        let mut batch = vec![first];
        while let Some(head) = self.pending.front() {
            if head.1 == first.1 {
                batch.push(self.pending.pop_front().expect("front() just matched"));
            } else {
                break;
            }
        }
        self.inflight.extend_from_slice(&batch);
        batch
    }

    fn finish_if_drained(&mut self) {
        if self.inflight.is_empty() && self.pending.is_empty() {
            self.done = true;
        }
    }

    fn deduce_children(&mut self, slot: DescriptorSlot, raw: &[u8]) {
        let (configuration_index, descriptor_type, descriptor_index) = slot;
        match descriptor_type {
            DescriptorType::Entity => {
                let count = read_u16_or_zero(raw, ENTITY_CONFIGURATIONS_COUNT_OFF);
                for c in 0..count {
                    self.pending.push_back((c, DescriptorType::Configuration, c));
                }
            }
            DescriptorType::Configuration => {
                for (child_type, count) in parse_descriptor_counts(raw) {
                    for idx in 0..count {
                        self.pending.push_back((configuration_index, child_type, idx));
                    }
                }
            }
            DescriptorType::Locale => {
                let n = read_u16_or_zero(raw, LOCALE_NUMBER_OF_STRINGS_OFF);
                for s in 0..n {
                    self.pending.push_back((configuration_index, DescriptorType::Strings, s));
                }
            }
            DescriptorType::AudioUnit => {
                for &(count_off, base_off, child_type) in AUDIO_UNIT_CHILD_FIELDS {
                    let count = read_u16_or_zero(raw, count_off);
                    let base = read_u16_or_zero(raw, base_off);
                    for idx in base..base.saturating_add(count) {
                        self.pending.push_back((configuration_index, child_type, idx));
                    }
                }
            }
            DescriptorType::StreamPortInput | DescriptorType::StreamPortOutput => {
                for &(count_off, base_off, child_type) in STREAM_PORT_CHILD_FIELDS {
                    let count = read_u16_or_zero(raw, count_off);
                    let base = read_u16_or_zero(raw, base_off);
                    for idx in base..base.saturating_add(count) {
                        self.pending.push_back((configuration_index, child_type, idx));
                    }
                }
            }
            _ => {
                let _ = descriptor_index;
            }
        }
    }

    /// Feed a successful `READ_DESCRIPTOR` response. Returns `true` if this
    /// matched an outstanding request (a stale/duplicate response for a
    /// slot already resolved is silently ignored, returning `false`).
    pub fn on_descriptor_read(&mut self, slot: DescriptorSlot, raw: &[u8]) -> bool {
        let Some(pos) = self.inflight.iter().position(|&s| s == slot) else {
            return false;
        };
        self.inflight.remove(pos);
        self.deduce_children(slot, raw);
        self.finish_if_drained();
        true
    }

    /// Feed a terminal timeout for an outstanding request: the slot is
    /// dropped (and its children, if any, are simply never discovered) and
    /// the walk continues with whatever else is in flight or pending.
    pub fn on_descriptor_timeout(&mut self, slot: DescriptorSlot) -> bool {
        let Some(pos) = self.inflight.iter().position(|&s| s == slot) else {
            return false;
        };
        self.inflight.remove(pos);
        self.finish_if_drained();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_descriptor_counts(pairs: &[(DescriptorType, u16)]) -> Vec<u8> {
        let mut raw = vec![0u8; 70];
        raw[66..68].copy_from_slice(&(pairs.len() as u16).to_be_bytes());
        for (ty, count) in pairs {
            raw.extend_from_slice(&u16::from(*ty).to_be_bytes());
            raw.extend_from_slice(&count.to_be_bytes());
        }
        raw
    }

    fn entity_raw(configurations_count: u16) -> Vec<u8> {
        let mut raw = vec![0u8; ENTITY_CONFIGURATIONS_COUNT_OFF + 2];
        raw[ENTITY_CONFIGURATIONS_COUNT_OFF..ENTITY_CONFIGURATIONS_COUNT_OFF + 2]
            .copy_from_slice(&configurations_count.to_be_bytes());
        raw
    }

    #[test]
    fn test_parse_descriptor_counts() {
        let raw = build_descriptor_counts(&[
            (DescriptorType::StreamInput, 2),
            (DescriptorType::StreamOutput, 1),
        ]);
        let parsed = parse_descriptor_counts(&raw);
        assert_eq!(
            parsed,
            vec![(DescriptorType::StreamInput, 2), (DescriptorType::StreamOutput, 1)]
        );
    }

    #[test]
    fn test_full_walk_entity_then_configuration_then_children_batched() {
        let mut driver = EnumerationDriver::new();

        let batch = driver.next_batch_to_request();
        assert_eq!(batch, vec![(0, DescriptorType::Entity, 0)]);
        assert!(driver.next_batch_to_request().is_empty());
        assert!(driver.on_descriptor_read(batch[0], &entity_raw(1)));

        let batch = driver.next_batch_to_request();
        assert_eq!(batch, vec![(0, DescriptorType::Configuration, 0)]);
        let counts = build_descriptor_counts(&[(DescriptorType::StreamInput, 2)]);
        assert!(driver.on_descriptor_read(batch[0], &counts));
        assert!(!driver.is_done());

        let batch = driver.next_batch_to_request();
        assert_eq!(
            batch,
            vec![(0, DescriptorType::StreamInput, 0), (0, DescriptorType::StreamInput, 1)]
        );
        assert!(driver.on_descriptor_read(batch[0], &[]));
        assert!(!driver.is_done());
        assert!(driver.on_descriptor_read(batch[1], &[]));
        assert!(driver.is_done());
    }

    #[test]
    fn test_multiple_configurations_get_distinct_slots() {
        let mut driver = EnumerationDriver::new();
        let entity_slot = driver.next_batch_to_request()[0];
        driver.on_descriptor_read(entity_slot, &entity_raw(2));

        let batch = driver.next_batch_to_request();
        assert_eq!(
            batch,
            vec![(0, DescriptorType::Configuration, 0), (1, DescriptorType::Configuration, 1)]
        );
        driver.on_descriptor_read(batch[0], &build_descriptor_counts(&[(DescriptorType::StreamInput, 1)]));
        driver.on_descriptor_read(batch[1], &build_descriptor_counts(&[(DescriptorType::StreamOutput, 1)]));

        let batch = driver.next_batch_to_request();
        assert_eq!(
            batch,
            vec![(0, DescriptorType::StreamInput, 0), (1, DescriptorType::StreamOutput, 0)]
        );
    }

    #[test]
    fn test_audio_unit_children_use_base_and_count() {
        let mut driver = EnumerationDriver::new();
        let entity_slot = driver.next_batch_to_request()[0];
        driver.on_descriptor_read(entity_slot, &entity_raw(1));
        let config_slot = driver.next_batch_to_request()[0];
        driver.on_descriptor_read(
            config_slot,
            &build_descriptor_counts(&[(DescriptorType::AudioUnit, 1)]),
        );
        let audio_unit_slot = driver.next_batch_to_request()[0];
        assert_eq!(audio_unit_slot, (0, DescriptorType::AudioUnit, 0));

        let mut raw = vec![0u8; 96];
        raw[68..70].copy_from_slice(&2u16.to_be_bytes()); // 2 stream input ports
        raw[70..72].copy_from_slice(&5u16.to_be_bytes()); // based at index 5
        driver.on_descriptor_read(audio_unit_slot, &raw);

        let batch = driver.next_batch_to_request();
        assert_eq!(
            batch,
            vec![(0, DescriptorType::StreamPortInput, 5), (0, DescriptorType::StreamPortInput, 6)]
        );
    }

    #[test]
    fn test_stale_response_ignored() {
        let mut driver = EnumerationDriver::new();
        let batch = driver.next_batch_to_request();
        assert!(!driver.on_descriptor_read((0, DescriptorType::Configuration, 0), &[]));
        assert!(driver.on_descriptor_read(batch[0], &entity_raw(0)));
    }

    #[test]
    fn test_timeout_skips_slot_and_continues() {
        let mut driver = EnumerationDriver::new();
        let batch = driver.next_batch_to_request();
        assert!(driver.on_descriptor_timeout(batch[0]));
        assert!(driver.is_done());
    }

    #[test]
    fn test_empty_configuration_completes_immediately() {
        let mut driver = EnumerationDriver::new();
        let entity_slot = driver.next_batch_to_request()[0];
        driver.on_descriptor_read(entity_slot, &entity_raw(1));
        let config_slot = driver.next_batch_to_request()[0];
        driver.on_descriptor_read(config_slot, &build_descriptor_counts(&[]));
        assert!(driver.is_done());
    }

    #[test]
    fn test_entity_with_no_configurations_completes_immediately() {
        let mut driver = EnumerationDriver::new();
        let entity_slot = driver.next_batch_to_request()[0];
        driver.on_descriptor_read(entity_slot, &entity_raw(0));
        assert!(driver.is_done());
    }
}
