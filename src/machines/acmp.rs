// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ACMP controller state machine.
//!
//! Mirrors [`super::aecp::AecpController`]'s inflight/retry/timeout shape,
//! but every command type carries its own timeout (IEEE 1722.1-2013 Table
//! 8.1) rather than one shared constant, and responses are matched on
//! sequence id the same way ACMP always has been — the talker/listener
//! entity ids in the frame are routing information, not a second key.

use std::time::{Duration, Instant};

use crate::codec::{AcmpFrame, AcmpMessageType};
use crate::config::{
    ACMP_CONNECT_RX_TIMEOUT, ACMP_CONNECT_TX_TIMEOUT, ACMP_DISCONNECT_RX_TIMEOUT,
    ACMP_DISCONNECT_TX_TIMEOUT, ACMP_GET_RX_STATE_TIMEOUT, ACMP_GET_TX_CONNECTION_TIMEOUT,
    ACMP_GET_TX_STATE_TIMEOUT,
};
use crate::inflight::{InflightCommand, InflightTable};

/// Look up the IEEE 1722.1 Table 8.1 timeout for a given ACMP command type.
/// Response variants and unknown values fall back to the longest table
/// entry, since they are never used to start a timer.
#[must_use]
pub fn timeout_for(message_type: AcmpMessageType) -> Duration {
    match message_type {
        AcmpMessageType::ConnectTxCommand => ACMP_CONNECT_TX_TIMEOUT,
        AcmpMessageType::DisconnectTxCommand => ACMP_DISCONNECT_TX_TIMEOUT,
        AcmpMessageType::GetTxStateCommand => ACMP_GET_TX_STATE_TIMEOUT,
        AcmpMessageType::ConnectRxCommand => ACMP_CONNECT_RX_TIMEOUT,
        AcmpMessageType::DisconnectRxCommand => ACMP_DISCONNECT_RX_TIMEOUT,
        AcmpMessageType::GetRxStateCommand => ACMP_GET_RX_STATE_TIMEOUT,
        AcmpMessageType::GetTxConnectionCommand => ACMP_GET_TX_CONNECTION_TIMEOUT,
        _ => ACMP_CONNECT_RX_TIMEOUT,
    }
}

/// Result of matching an incoming ACMP response against the inflight table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcmpOutcome {
    Matched { notification_id: u64 },
    Unmatched,
}

/// An action `tick()` wants the facade to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcmpTickAction {
    Retry { frame: Vec<u8>, notification_id: u64 },
    TimedOut { notification_id: u64 },
}

/// Tracks every outstanding ACMP command.
#[derive(Debug, Default)]
pub struct AcmpController {
    inflight: InflightTable,
    next_sequence_id: u16,
}

impl AcmpController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inflight: InflightTable::new(),
            next_sequence_id: 0,
        }
    }

    pub fn alloc_sequence_id(&mut self) -> u16 {
        let id = self.next_sequence_id;
        self.next_sequence_id = self.next_sequence_id.wrapping_add(1);
        id
    }

    pub fn register_sent(
        &mut self,
        sequence_id: u16,
        notification_id: u64,
        frame: Vec<u8>,
        command_type: AcmpMessageType,
        now: Instant,
    ) {
        self.inflight.push(InflightCommand::new(
            sequence_id,
            notification_id,
            frame,
            now,
            timeout_for(command_type),
        ));
    }

    pub fn on_response(&mut self, response: &AcmpFrame) -> AcmpOutcome {
        match self.inflight.take_by_sequence_id(response.sequence_id) {
            Some(entry) => AcmpOutcome::Matched {
                notification_id: entry.notification_id,
            },
            None => AcmpOutcome::Unmatched,
        }
    }

    pub fn tick(&mut self, now: Instant) -> Vec<AcmpTickAction> {
        let mut actions = Vec::new();
        self.inflight.retain_expired(now, |entry| {
            if entry.retried() {
                actions.push(AcmpTickAction::TimedOut {
                    notification_id: entry.notification_id,
                });
                false
            } else {
                entry.mark_retried(now);
                actions.push(AcmpTickAction::Retry {
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

    fn response(sequence_id: u16) -> AcmpFrame {
        AcmpFrame {
            message_type: AcmpMessageType::ConnectRxResponse,
            status: 0,
            stream_id: 0,
            controller_entity_id: 1,
            talker_entity_id: 2,
            listener_entity_id: 3,
            talker_unique_id: 0,
            listener_unique_id: 0,
            stream_dest_mac: [0; 6],
            connection_count: 0,
            sequence_id,
            flags: 0,
        }
    }

    #[test]
    fn test_timeout_table_distinguishes_command_types() {
        assert_eq!(timeout_for(AcmpMessageType::ConnectRxCommand), ACMP_CONNECT_RX_TIMEOUT);
        assert_eq!(timeout_for(AcmpMessageType::GetTxStateCommand), ACMP_GET_TX_STATE_TIMEOUT);
        assert_ne!(
            timeout_for(AcmpMessageType::ConnectRxCommand),
            timeout_for(AcmpMessageType::DisconnectTxCommand)
        );
    }

    #[test]
    fn test_matched_response() {
        let mut ctl = AcmpController::new();
        let now = Instant::now();
        ctl.register_sent(3, 55, vec![1], AcmpMessageType::ConnectRxCommand, now);
        let outcome = ctl.on_response(&response(3));
        assert_eq!(outcome, AcmpOutcome::Matched { notification_id: 55 });
    }

    #[test]
    fn test_unmatched_response() {
        let mut ctl = AcmpController::new();
        assert_eq!(ctl.on_response(&response(9)), AcmpOutcome::Unmatched);
    }

    #[test]
    fn test_retry_then_timeout_uses_command_specific_duration() {
        let mut ctl = AcmpController::new();
        let start = Instant::now();
        ctl.register_sent(1, 1, vec![1], AcmpMessageType::DisconnectTxCommand, start);

        let actions = ctl.tick(start + ACMP_DISCONNECT_TX_TIMEOUT);
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], AcmpTickAction::Retry { .. }));

        let actions = ctl.tick(start + ACMP_DISCONNECT_TX_TIMEOUT * 2);
        assert_eq!(actions, vec![AcmpTickAction::TimedOut { notification_id: 1 }]);
    }
}
