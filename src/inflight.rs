// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Inflight command tracking.
//!
//! One entry per outstanding AECP/ACMP command awaiting a matching response.
//! The entry is matched back to its response by `sequence_id` and carries
//! the exact bytes of the original command so a timed-out attempt can be
//! resent verbatim, same sequence id, with `tick()` as the sole driver of
//! retry/timeout.

use std::time::Instant;

/// An outstanding command frame waiting for a response or a retry/timeout.
#[derive(Debug, Clone)]
pub struct InflightCommand {
    pub sequence_id: u16,
    /// Opaque notification handle the host used to correlate this send with
    /// a later `CommandTimeout`/`UnsolicitedResponse` notification.
    pub notification_id: u64,
    /// Raw bytes sent on the wire, kept verbatim for a single retry.
    pub frame: Vec<u8>,
    /// Number of times this frame has been placed on the wire: 1 after the
    /// initial send, 2 after the single retry.
    pub send_count: u8,
    pub sent_at: Instant,
    pub timeout: std::time::Duration,
}

impl InflightCommand {
    #[must_use]
    pub fn new(
        sequence_id: u16,
        notification_id: u64,
        frame: Vec<u8>,
        sent_at: Instant,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            sequence_id,
            notification_id,
            frame,
            send_count: 1,
            sent_at,
            timeout,
        }
    }

    /// `true` once this command has already used its single retry attempt.
    #[must_use]
    pub fn retried(&self) -> bool {
        self.send_count >= 2
    }

    /// `true` if `now` is past this entry's deadline.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.sent_at) >= self.timeout
    }

    /// Mark a retry: bumps `send_count` and resets the clock.
    pub fn mark_retried(&mut self, now: Instant) {
        self.send_count += 1;
        self.sent_at = now;
    }
}

/// FIFO-ish table of outstanding commands. A flat `Vec` with `retain`/
/// `iter_mut` is plenty at the table sizes this protocol ever produces
/// (tens of entries, not thousands); a sequence-id-keyed map would be a
/// permissible optimization but isn't needed for correctness.
#[derive(Debug, Default)]
pub struct InflightTable {
    entries: Vec<InflightCommand>,
}

impl InflightTable {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn push(&mut self, entry: InflightCommand) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find and remove the entry matching `sequence_id`, if any.
    pub fn take_by_sequence_id(&mut self, sequence_id: u16) -> Option<InflightCommand> {
        let pos = self.entries.iter().position(|e| e.sequence_id == sequence_id)?;
        Some(self.entries.remove(pos))
    }

    /// Find the entry matching `notification_id`, if any (used to answer
    /// `is_inflight_cmd_with_notification_id`).
    #[must_use]
    pub fn find_by_notification_id(&self, notification_id: u64) -> Option<&InflightCommand> {
        self.entries.iter().find(|e| e.notification_id == notification_id)
    }

    /// Drain every entry whose deadline has passed as of `now`, handing each
    /// to `f`. `f` returns `true` to keep the entry (after a retry) or
    /// `false` to drop it (final timeout).
    pub fn retain_expired<F>(&mut self, now: Instant, mut f: F)
    where
        F: FnMut(&mut InflightCommand) -> bool,
    {
        self.entries.retain_mut(|entry| {
            if entry.is_expired(now) {
                f(entry)
            } else {
                true
            }
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &InflightCommand> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entry(seq: u16, now: Instant) -> InflightCommand {
        InflightCommand::new(seq, seq as u64, vec![0u8; 4], now, Duration::from_millis(250))
    }

    #[test]
    fn test_retried_flag() {
        let now = Instant::now();
        let mut e = entry(1, now);
        assert!(!e.retried());
        e.mark_retried(now);
        assert!(e.retried());
    }

    #[test]
    fn test_take_by_sequence_id() {
        let now = Instant::now();
        let mut table = InflightTable::new();
        table.push(entry(1, now));
        table.push(entry(2, now));
        assert_eq!(table.len(), 2);
        let taken = table.take_by_sequence_id(1).unwrap();
        assert_eq!(taken.sequence_id, 1);
        assert_eq!(table.len(), 1);
        assert!(table.take_by_sequence_id(1).is_none());
    }

    #[test]
    fn test_find_by_notification_id() {
        let now = Instant::now();
        let mut table = InflightTable::new();
        table.push(entry(5, now));
        assert!(table.find_by_notification_id(5).is_some());
        assert!(table.find_by_notification_id(99).is_none());
    }

    #[test]
    fn test_retain_expired_drives_retry_then_drop() {
        let start = Instant::now();
        let mut table = InflightTable::new();
        table.push(InflightCommand::new(1, 1, vec![], start, Duration::from_millis(0)));

        let mut calls = 0;
        table.retain_expired(start, |e| {
            calls += 1;
            if e.retried() {
                false
            } else {
                e.mark_retried(start);
                true
            }
        });
        assert_eq!(calls, 1);
        assert_eq!(table.len(), 1);

        table.retain_expired(start, |e| {
            calls += 1;
            !e.retried()
        });
        assert_eq!(calls, 2);
        assert_eq!(table.len(), 0);
    }
}
