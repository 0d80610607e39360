// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! AECP controller state machine.
//!
//! Allocates sequence ids, tracks one [`InflightCommand`] per outstanding
//! AEM command, and drives the single-retry/timeout policy from `tick()`.
//! Response matching and unsolicited detection happen here; everything else
//! (what to *do* with a matched response) is the facade's job.

use std::time::Instant;

use crate::codec::{AecpAemFrame, AemCommandType};
use crate::config::AECP_COMMAND_TIMEOUT;
use crate::inflight::{InflightCommand, InflightTable};

/// Result of matching an incoming AEM response against the inflight table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AecpOutcome {
    /// Matched an outstanding command; the host's original notification
    /// handle and the response status are handed back for delivery.
    Matched { notification_id: u64, status: u8 },
    /// The unsolicited bit was set *and* the sequence id matched an
    /// outstanding command. Both the unsolicited sink and the inflight's
    /// own notification handle fire — a real entity can legitimately echo
    /// a command's own sequence id back on its unsolicited status push.
    MatchedUnsolicited { notification_id: u64, status: u8 },
    /// No matching inflight entry — either the unsolicited bit was set, or
    /// this is a stray reply that arrived after our own timeout already
    /// fired.
    Unsolicited,
}

/// An action `tick()` wants the facade to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AecpTickAction {
    /// Resend `frame` verbatim; this is the command's single retry.
    Retry { frame: Vec<u8>, notification_id: u64 },
    /// The retry also expired; notify the host and drop the entry.
    TimedOut { notification_id: u64 },
}

/// Tracks every outstanding AEM command for one entity (or, equally, one
/// controller-wide pool — callers choose the granularity).
#[derive(Debug, Default)]
pub struct AecpController {
    inflight: InflightTable,
    next_sequence_id: u16,
}

impl AecpController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inflight: InflightTable::new(),
            next_sequence_id: 0,
        }
    }

    /// Allocate the next wire sequence id, wrapping at `u16::MAX`.
    pub fn alloc_sequence_id(&mut self) -> u16 {
        let id = self.next_sequence_id;
        self.next_sequence_id = self.next_sequence_id.wrapping_add(1);
        id
    }

    /// Record a just-sent command frame so `tick()` can retry/time it out.
    pub fn register_sent(&mut self, sequence_id: u16, notification_id: u64, frame: Vec<u8>, now: Instant) {
        self.inflight.push(InflightCommand::new(
            sequence_id,
            notification_id,
            frame,
            now,
            AECP_COMMAND_TIMEOUT,
        ));
    }

    /// Match an incoming AEM response against the inflight table. The
    /// unsolicited bit and the sequence-id match are independent checks:
    /// an unsolicited response whose sequence id happens to match a still
    /// outstanding command completes *that* command too (dual-fire).
    pub fn on_response(&mut self, response: &AecpAemFrame) -> AecpOutcome {
        let (_, unsolicited) = AemCommandType::from_wire(response.command_type);
        match (self.inflight.take_by_sequence_id(response.sequence_id), unsolicited) {
            (Some(entry), true) => AecpOutcome::MatchedUnsolicited {
                notification_id: entry.notification_id,
                status: response.status,
            },
            (Some(entry), false) => AecpOutcome::Matched {
                notification_id: entry.notification_id,
                status: response.status,
            },
            (None, _) => AecpOutcome::Unsolicited,
        }
    }

    /// Match a response by sequence id alone, for AECP families (AA) that
    /// carry no unsolicited-bit/command-type concept of their own.
    pub fn on_raw_response(&mut self, sequence_id: u16, status: u8) -> AecpOutcome {
        match self.inflight.take_by_sequence_id(sequence_id) {
            Some(entry) => AecpOutcome::Matched {
                notification_id: entry.notification_id,
                status,
            },
            None => AecpOutcome::Unsolicited,
        }
    }

    /// Drive retries and timeouts for every expired inflight command.
    pub fn tick(&mut self, now: Instant) -> Vec<AecpTickAction> {
        let mut actions = Vec::new();
        self.inflight.retain_expired(now, |entry| {
            if entry.retried() {
                actions.push(AecpTickAction::TimedOut {
                    notification_id: entry.notification_id,
                });
                false
            } else {
                entry.mark_retried(now);
                actions.push(AecpTickAction::Retry {
                    frame: entry.frame.clone(),
                    notification_id: entry.notification_id,
                });
                true
            }
        });
        actions
    }

    #[must_use]
    pub fn is_inflight_with_notification_id(&self, notification_id: u64) -> bool {
        self.inflight.find_by_notification_id(notification_id).is_some()
    }

    #[must_use]
    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::AecpMessageType;

    fn response(sequence_id: u16, command_type: u16, status: u8) -> AecpAemFrame {
        AecpAemFrame {
            message_type: AecpMessageType::AemResponse,
            status,
            target_entity_id: 1,
            controller_entity_id: 2,
            sequence_id,
            command_type,
            descriptor_type: 0,
            descriptor_index: 0,
            payload: Vec::new(),
        }
    }

    #[test]
    fn test_sequence_ids_increment() {
        let mut ctl = AecpController::new();
        assert_eq!(ctl.alloc_sequence_id(), 0);
        assert_eq!(ctl.alloc_sequence_id(), 1);
    }

    #[test]
    fn test_matched_response_resolves_notification() {
        let mut ctl = AecpController::new();
        let now = Instant::now();
        ctl.register_sent(5, 100, vec![1, 2, 3], now);
        let outcome = ctl.on_response(&response(5, AemCommandType::ReadDescriptor.to_wire(false), 0));
        assert_eq!(
            outcome,
            AecpOutcome::Matched {
                notification_id: 100,
                status: 0
            }
        );
        assert_eq!(ctl.inflight_count(), 0);
    }

    #[test]
    fn test_unsolicited_bit_with_no_inflight_is_plain_unsolicited() {
        let mut ctl = AecpController::new();
        let outcome = ctl.on_response(&response(5, AemCommandType::ReadDescriptor.to_wire(true), 0));
        assert_eq!(outcome, AecpOutcome::Unsolicited);
    }

    #[test]
    fn test_unsolicited_bit_with_matching_inflight_dual_fires() {
        let mut ctl = AecpController::new();
        let now = Instant::now();
        ctl.register_sent(5, 100, vec![1], now);
        let outcome = ctl.on_response(&response(5, AemCommandType::ReadDescriptor.to_wire(true), 0));
        assert_eq!(
            outcome,
            AecpOutcome::MatchedUnsolicited {
                notification_id: 100,
                status: 0
            }
        );
        assert_eq!(ctl.inflight_count(), 0);
    }

    #[test]
    fn test_unmatched_sequence_id_is_unsolicited() {
        let mut ctl = AecpController::new();
        let outcome = ctl.on_response(&response(77, AemCommandType::ReadDescriptor.to_wire(false), 0));
        assert_eq!(outcome, AecpOutcome::Unsolicited);
    }

    #[test]
    fn test_tick_retries_then_times_out() {
        let mut ctl = AecpController::new();
        let start = Instant::now();
        ctl.register_sent(1, 42, vec![9, 9], start);

        let actions = ctl.tick(start + AECP_COMMAND_TIMEOUT);
        assert_eq!(
            actions,
            vec![AecpTickAction::Retry {
                frame: vec![9, 9],
                notification_id: 42
            }]
        );
        assert_eq!(ctl.inflight_count(), 1);

        let actions = ctl.tick(start + AECP_COMMAND_TIMEOUT * 2);
        assert_eq!(actions, vec![AecpTickAction::TimedOut { notification_id: 42 }]);
        assert_eq!(ctl.inflight_count(), 0);
    }
}
