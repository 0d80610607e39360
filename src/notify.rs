// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host-facing notification and log delivery.
//!
//! Three independent bounded channels: AECP notifications, ACMP
//! notifications, and log records. None of them ever blocks the caller —
//! `tick()`/`on_rx_frame()` run on whatever thread the host's network loop
//! uses, and a full queue means the host isn't draining fast enough, not
//! that the controller should stall. A full queue drops the newest entry
//! and increments the matching `missed_*` counter instead.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};

use crate::config::{ACMP_NOTIFICATION_QUEUE_CAPACITY, LOG_QUEUE_CAPACITY, NOTIFICATION_QUEUE_CAPACITY};

/// Notification handle carried by an ACMP notification that did not
/// originate from a host `send_*_cmd` call (an unsolicited
/// `CONNECT_RX_RESPONSE`/`DISCONNECT_RX_RESPONSE` triggered by another
/// controller). No host call ever hands out this value, so it can never be
/// confused with a real notification handle.
pub const UNSOLICITED_NOTIFICATION_ID: u64 = u64::MAX;

/// Host-facing log severity (IEEE 1722.1 6-level scale), distinct from
/// [`crate::logging::LogLevel`]'s 4-level crate-internal trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HostLogLevel {
    Error = 0,
    Warning = 1,
    Notice = 2,
    Info = 3,
    Debug = 4,
    Verbose = 5,
}

impl HostLogLevel {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Error,
            1 => Self::Warning,
            2 => Self::Notice,
            3 => Self::Info,
            4 => Self::Debug,
            _ => Self::Verbose,
        }
    }
}

/// A host-facing log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub level: HostLogLevel,
    pub message: String,
    pub timestamp_ms: u64,
}

/// AECP-domain notifications delivered to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A previously-unknown entity was just discovered via ADP.
    EndStationConnected { entity_id: u64 },
    /// A new entity was discovered and its descriptor tree fully enumerated.
    EndStationReadCompleted { entity_id: u64 },
    /// An entity's validity timer lapsed with no refreshing ADP.
    EndStationDeparted { entity_id: u64 },
    /// An AECP command's single retry also timed out.
    CommandTimeout { entity_id: u64, notification_id: u64 },
    /// An AECP command completed (success or a non-timeout failure status).
    CommandCompleted {
        entity_id: u64,
        notification_id: u64,
        command_type: u16,
        status: u8,
    },
    /// An AEM response arrived with no matching inflight entry (the
    /// unsolicited bit was set, or a stray late reply after our own timeout).
    UnsolicitedResponse { entity_id: u64, command_type: u16 },
    /// Progress update for a tracked `START_OPERATION`.
    OperationStatus {
        entity_id: u64,
        notification_id: u64,
        operation_id: u16,
        percent_complete: u16,
    },
}

/// ACMP-domain notifications delivered to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcmpNotificationEvent {
    pub message_type: crate::codec::AcmpMessageType,
    pub status: crate::codec::AcmpStatus,
    pub notification_id: u64,
    pub talker_entity_id: u64,
    pub listener_entity_id: u64,
    pub talker_unique_id: u16,
    pub listener_unique_id: u16,
}

/// Bounded-queue fan-out for one of the three notification/log streams.
struct BoundedStream<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    missed: AtomicU64,
}

impl<T> BoundedStream<T> {
    fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            tx,
            rx,
            missed: AtomicU64::new(0),
        }
    }

    fn push(&self, value: T) {
        if let Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) = self.tx.try_send(value) {
            self.missed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn missed(&self) -> u64 {
        self.missed.load(Ordering::Relaxed)
    }
}

/// Owns the three notification/log channels for one [`crate::facade::Controller`].
pub struct NotificationHub {
    notifications: BoundedStream<NotificationEvent>,
    acmp_notifications: BoundedStream<AcmpNotificationEvent>,
    logs: BoundedStream<LogEvent>,
    /// Records at or below this severity (lower variant value = more
    /// severe) are queued; everything noisier is dropped before it ever
    /// reaches the bounded channel, so verbosity filtering costs nothing
    /// beyond a relaxed atomic load. Defaults to `Verbose` (everything).
    min_level: AtomicU8,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub {
    #[must_use]
    pub fn new() -> Self {
        Self {
            notifications: BoundedStream::new(NOTIFICATION_QUEUE_CAPACITY),
            acmp_notifications: BoundedStream::new(ACMP_NOTIFICATION_QUEUE_CAPACITY),
            logs: BoundedStream::new(LOG_QUEUE_CAPACITY),
            min_level: AtomicU8::new(HostLogLevel::Verbose as u8),
        }
    }

    /// Only log records at or below `level` (more severe or equally severe)
    /// are queued from here on; noisier ones are dropped without touching
    /// the bounded channel or its `missed_logs` counter.
    pub fn set_level(&self, level: HostLogLevel) {
        self.min_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn notify(&self, event: NotificationEvent) {
        self.notifications.push(event);
    }

    pub fn notify_acmp(&self, event: AcmpNotificationEvent) {
        self.acmp_notifications.push(event);
    }

    pub fn log(&self, event: LogEvent) {
        let min_level = HostLogLevel::from_u8(self.min_level.load(Ordering::Relaxed));
        if event.level <= min_level {
            self.logs.push(event);
        }
    }

    /// Non-blocking drain of one pending AECP notification, if any.
    pub fn try_recv_notification(&self) -> Option<NotificationEvent> {
        self.notifications.rx.try_recv().ok()
    }

    /// Non-blocking drain of one pending ACMP notification, if any.
    pub fn try_recv_acmp_notification(&self) -> Option<AcmpNotificationEvent> {
        self.acmp_notifications.rx.try_recv().ok()
    }

    /// Non-blocking drain of one pending log record, if any.
    pub fn try_recv_log(&self) -> Option<LogEvent> {
        self.logs.rx.try_recv().ok()
    }

    /// Count of AECP notifications dropped because the queue was full.
    #[must_use]
    pub fn missed_events(&self) -> u64 {
        self.notifications.missed()
    }

    /// Count of ACMP notifications dropped because the queue was full.
    #[must_use]
    pub fn missed_acmp_events(&self) -> u64 {
        self.acmp_notifications.missed()
    }

    /// Count of log records dropped because the queue was full.
    #[must_use]
    pub fn missed_logs(&self) -> u64 {
        self.logs.missed()
    }
}
