// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Controller facade.
//!
//! The single type an embedder talks to. Owns the entity collection behind
//! one [`parking_lot::Mutex`]: network-context and host-context both
//! serialize through the same lock, and there is no second lock anywhere
//! in the crate. It demultiplexes received frames to the matching state
//! machine, and drives every `send_*_cmd` the host calls.
//!
//! No thread is ever spawned here. `tick()` must be called periodically by
//! the host (see [`crate::config::RECOMMENDED_TICK_PERIOD`]); `on_rx_frame`
//! must be called once per received Ethernet frame whose EtherType is
//! [`crate::config::AVTP_ETHERTYPE`].

use std::collections::BTreeMap;
use std::time::Instant;

use parking_lot::Mutex;

use crate::codec::bytes::{eui48_to_u64, get_eui48, get_u16};
use crate::codec::{
    AcmpFrame, AcmpMessageType, AcmpStatus, AdpFrame, AecpAaFrame, AecpAemFrame, AecpMessageType,
    AemCommandType, AemStatus, ClassifiedFrame, DescriptorType,
};
use crate::config::{self, ControllerConfig};
use crate::enumeration::EnumerationDriver;
use crate::error::FacadeError;
use crate::machines::acmp::{AcmpController, AcmpOutcome, AcmpTickAction};
use crate::machines::aecp::{AecpController, AecpOutcome, AecpTickAction};
use crate::machines::discovery::{self, Advertisement};
use crate::model::{Descriptor, Entity, EntityStatus};
use crate::notify::{AcmpNotificationEvent, HostLogLevel, LogEvent, NotificationEvent, NotificationHub};
use crate::operation::{Operation, OperationTable};
use crate::platform::PlatformInterface;

/// What an entity was doing with an outstanding AECP command, kept
/// alongside the host's notification id so a later response/timeout can be
/// attributed back without re-parsing the frame we sent.
#[derive(Debug, Clone, Copy)]
struct AecpContext {
    entity_id: u64,
    command_type: u16,
    descriptor_type: u16,
    descriptor_index: u16,
    /// Which configuration this descriptor read is scoped to. Not a wire
    /// field -- `READ_DESCRIPTOR` addresses a descriptor by type+index
    /// alone -- but needed here so a response can be filed under the right
    /// configuration's tree instead of always the entity's current one.
    configuration_index: u16,
}

#[derive(Debug, Clone, Copy)]
struct AcmpContext {
    message_type: AcmpMessageType,
    talker_entity_id: u64,
    listener_entity_id: u64,
    talker_unique_id: u16,
    listener_unique_id: u16,
}

struct EntityRecord {
    entity: Entity,
    enumeration: Option<EnumerationDriver>,
    operations: OperationTable,
}

struct ControllerInner {
    entities: BTreeMap<u64, EntityRecord>,
    aecp: AecpController,
    acmp: AcmpController,
    aecp_context: std::collections::HashMap<u64, AecpContext>,
    acmp_context: std::collections::HashMap<u64, AcmpContext>,
    config: ControllerConfig,
    /// Counter for enumeration's internally-generated notification ids,
    /// walked downward from `u64::MAX` so they never collide with a host's
    /// own (presumably small, sequential) notification ids.
    next_internal_notification_id: u64,
}

/// The controller facade. Generic over the host's [`PlatformInterface`]
/// implementation so embedders pay no vtable cost for the one transport
/// they actually use.
pub struct Controller<P: PlatformInterface> {
    platform: P,
    mac: [u8; 6],
    entity_id: u64,
    inner: Mutex<ControllerInner>,
    hub: NotificationHub,
}

impl<P: PlatformInterface> Controller<P> {
    #[must_use]
    pub fn new(platform: P, config: ControllerConfig) -> Self {
        let mac_carrier = platform.mac_addr();
        let mac = crate::codec::bytes::u64_to_eui48(mac_carrier);
        let entity_id = config::derive_controller_entity_id(mac_carrier);
        Self {
            platform,
            mac,
            entity_id,
            inner: Mutex::new(ControllerInner {
                entities: BTreeMap::new(),
                aecp: AecpController::new(),
                acmp: AcmpController::new(),
                aecp_context: std::collections::HashMap::new(),
                acmp_context: std::collections::HashMap::new(),
                config,
                next_internal_notification_id: u64::MAX,
            }),
            hub: NotificationHub::new(),
        }
    }

    #[must_use]
    pub fn entity_id(&self) -> u64 {
        self.entity_id
    }

    // -- host-facing polling --------------------------------------------

    pub fn poll_notification(&self) -> Option<NotificationEvent> {
        self.hub.try_recv_notification()
    }

    pub fn poll_acmp_notification(&self) -> Option<AcmpNotificationEvent> {
        self.hub.try_recv_acmp_notification()
    }

    pub fn poll_log(&self) -> Option<LogEvent> {
        self.hub.try_recv_log()
    }

    #[must_use]
    pub fn missed_events(&self) -> u64 {
        self.hub.missed_events()
    }

    #[must_use]
    pub fn missed_acmp_events(&self) -> u64 {
        self.hub.missed_acmp_events()
    }

    #[must_use]
    pub fn missed_logs(&self) -> u64 {
        self.hub.missed_logs()
    }

    pub fn set_logging_level(&self, level: HostLogLevel) {
        self.hub.set_level(level);
    }

    pub fn apply_end_station_capabilities_filters(&self, filters: ControllerConfig) {
        self.inner.lock().config = filters;
    }

    // -- entity collection accessors -------------------------------------

    #[must_use]
    pub fn get_end_station_count(&self) -> usize {
        self.inner.lock().entities.len()
    }

    #[must_use]
    pub fn get_end_station_entity_id_by_index(&self, index: usize) -> Option<u64> {
        self.inner.lock().entities.keys().nth(index).copied()
    }

    #[must_use]
    pub fn is_end_station_online(&self, entity_id: u64) -> Option<bool> {
        self.inner
            .lock()
            .entities
            .get(&entity_id)
            .map(|r| r.entity.status == EntityStatus::Online)
    }

    #[must_use]
    pub fn is_inflight_cmd_with_notification_id(&self, notification_id: u64) -> bool {
        let inner = self.inner.lock();
        inner.aecp.is_inflight_with_notification_id(notification_id)
            || inner.acmp.is_inflight_with_notification_id(notification_id)
    }

    #[must_use]
    pub fn is_active_operation_with_notification_id(&self, notification_id: u64) -> bool {
        self.inner
            .lock()
            .entities
            .values()
            .any(|r| r.operations.find_by_notification_id(notification_id).is_some())
    }

    /// Look up a descriptor in the cached tree for `entity_id`, as last read
    /// (or in-place updated by `SET_NAME`). Takes the same lock a received
    /// response would, per §5's "reads from the host context also take the
    /// lock". Returns a clone since the tree may mutate the instant the lock
    /// is released.
    #[must_use]
    pub fn get_descriptor(
        &self,
        entity_id: u64,
        configuration_index: u16,
        descriptor_type: u16,
        descriptor_index: u16,
    ) -> Option<Descriptor> {
        self.inner
            .lock()
            .entities
            .get(&entity_id)?
            .entity
            .addressed_descriptor(configuration_index, DescriptorType::from(descriptor_type), descriptor_index)
            .cloned()
    }

    /// Most recent response payload for `command_type` addressed to a given
    /// descriptor, if any command other than `READ_DESCRIPTOR` has completed
    /// against it yet (see [`crate::model::Descriptor::last_response`]).
    #[must_use]
    pub fn get_cached_response(
        &self,
        entity_id: u64,
        configuration_index: u16,
        descriptor_type: u16,
        descriptor_index: u16,
        command_type: u16,
    ) -> Option<Vec<u8>> {
        self.get_descriptor(entity_id, configuration_index, descriptor_type, descriptor_index)?
            .response_for(command_type)
            .map(<[u8]>::to_vec)
    }

    /// Entity-id currently holding the `ACQUIRE_ENTITY` lock on `entity_id`,
    /// per the most recent successful response; `None` if free or unknown.
    #[must_use]
    pub fn acquired_by(&self, entity_id: u64) -> Option<u64> {
        self.inner.lock().entities.get(&entity_id)?.entity.acquired_by
    }

    /// Same as [`Controller::acquired_by`] for `LOCK_ENTITY`.
    #[must_use]
    pub fn locked_by(&self, entity_id: u64) -> Option<u64> {
        self.inner.lock().entities.get(&entity_id)?.entity.locked_by
    }

    // -- reception ---------------------------------------------------------

    /// Process one received Ethernet frame. Never panics; malformed or
    /// unrecognized frames are logged and dropped.
    pub fn on_rx_frame(&self, frame: &[u8]) {
        if frame.len() < 12 {
            return;
        }
        let src_mac = get_eui48(frame, 6);

        let classified = match crate::codec::classify(frame) {
            Ok(c) => c,
            Err(e) => {
                self.hub.log(LogEvent {
                    level: HostLogLevel::Debug,
                    message: format!("dropped unparseable frame: {e}"),
                    timestamp_ms: 0,
                });
                return;
            }
        };

        let mut inner = self.inner.lock();
        match classified {
            ClassifiedFrame::Adp(adp) => self.handle_adp(&mut inner, &adp, src_mac),
            ClassifiedFrame::AecpAem(aem) => self.handle_aecp_aem(&mut inner, &aem),
            ClassifiedFrame::AecpAa(aa) => self.handle_aecp_aa(&mut inner, &aa),
            ClassifiedFrame::Acmp(acmp) => self.handle_acmp(&mut inner, &acmp),
        }
    }

    fn handle_adp(&self, inner: &mut ControllerInner, adp: &AdpFrame, src_mac: [u8; 6]) {
        let advertisement = match discovery::parse_advertisement(adp, src_mac, &inner.config) {
            Ok(a) => a,
            Err(e) => {
                self.hub.log(LogEvent {
                    level: HostLogLevel::Debug,
                    message: format!("ADP advertisement dropped: {e}"),
                    timestamp_ms: 0,
                });
                return;
            }
        };

        if advertisement.departing {
            self.hub.log(LogEvent {
                level: HostLogLevel::Debug,
                message: format!("ENTITY_DEPARTING from {:#x}, deferring to validity timer", advertisement.entity_id),
                timestamp_ms: 0,
            });
            return;
        }

        self.ingest_advertisement(inner, advertisement);
        self.drive_enumeration(inner, advertisement.entity_id);
    }

    fn ingest_advertisement(&self, inner: &mut ControllerInner, advertisement: Advertisement) {
        let now = Instant::now();
        match inner.entities.get_mut(&advertisement.entity_id) {
            Some(record) => {
                if record
                    .entity
                    .requires_reenumeration(advertisement.available_index, advertisement.entity_model_id)
                {
                    record
                        .entity
                        .reset_for_reenumeration(advertisement.available_index, advertisement.entity_model_id);
                    record.entity.refresh_liveness(now, advertisement.valid_time_units);
                    record.entity.mark_enumerating();
                    record.enumeration = Some(EnumerationDriver::new());
                    record.operations = OperationTable::new();
                } else {
                    record.entity.refresh_liveness(now, advertisement.valid_time_units);
                }
            }
            None => {
                let mut entity = Entity::new(
                    advertisement.entity_id,
                    advertisement.mac,
                    advertisement.entity_model_id,
                    advertisement.available_index,
                    advertisement.valid_time_units,
                    now,
                );
                entity.mark_enumerating();
                inner.entities.insert(
                    advertisement.entity_id,
                    EntityRecord {
                        entity,
                        enumeration: Some(EnumerationDriver::new()),
                        operations: OperationTable::new(),
                    },
                );
                self.hub.notify(NotificationEvent::EndStationConnected {
                    entity_id: advertisement.entity_id,
                });
            }
        }
    }

    /// Send the next batch of pending `READ_DESCRIPTOR` requests for
    /// `entity_id`'s enumeration pass, if no batch is already outstanding.
    /// A batch is every queued slot that shares the head slot's descriptor
    /// type -- each still goes out as its own independent AECP command.
    fn drive_enumeration(&self, inner: &mut ControllerInner, entity_id: u64) {
        let Some(record) = inner.entities.get_mut(&entity_id) else {
            return;
        };
        let Some(driver) = record.enumeration.as_mut() else {
            return;
        };
        let batch = driver.next_batch_to_request();

        for (configuration_index, descriptor_type, descriptor_index) in batch {
            let notification_id = inner.next_internal_notification_id;
            inner.next_internal_notification_id -= 1;

            let seq = inner.aecp.alloc_sequence_id();
            let wire_frame = AecpAemFrame {
                message_type: AecpMessageType::AemCommand,
                status: 0,
                target_entity_id: entity_id,
                controller_entity_id: self.entity_id,
                sequence_id: seq,
                command_type: AemCommandType::ReadDescriptor.to_wire(false),
                descriptor_type: descriptor_type.into(),
                descriptor_index,
                payload: Vec::new(),
            };
            let Ok(bytes) = wire_frame.build(self.mac, config::AVDECC_MULTICAST_MAC) else {
                continue;
            };
            if self.platform.send_frame(&bytes).is_err() {
                continue;
            }
            inner.aecp.register_sent(seq, notification_id, bytes, Instant::now());
            inner.aecp_context.insert(
                notification_id,
                AecpContext {
                    entity_id,
                    command_type: AemCommandType::ReadDescriptor.to_wire(false),
                    descriptor_type: descriptor_type.into(),
                    descriptor_index,
                    configuration_index,
                },
            );
        }
    }

    fn handle_aecp_aem(&self, inner: &mut ControllerInner, frame: &AecpAemFrame) {
        match frame.message_type {
            AecpMessageType::AemResponse => self.handle_aem_response(inner, frame),
            AecpMessageType::AemCommand => self.handle_aem_command_from_entity(frame),
            AecpMessageType::AddressAccessCommand
            | AecpMessageType::AddressAccessResponse
            | AecpMessageType::Unknown(_) => {}
        }
    }

    fn handle_aem_response(&self, inner: &mut ControllerInner, frame: &AecpAemFrame) {
        let (command_type, _unsolicited) = AemCommandType::from_wire(frame.command_type);

        match inner.aecp.on_response(frame) {
            AecpOutcome::Matched { notification_id, status } => {
                self.complete_matched_aem(inner, frame, command_type, notification_id, status);
            }
            AecpOutcome::MatchedUnsolicited { notification_id, status } => {
                // Both paths fire: the unsolicited sink sees it as any other
                // unsolicited push, and the still-outstanding command it
                // happens to match by sequence id is also completed.
                self.handle_unsolicited_aem(inner, frame, command_type);
                self.complete_matched_aem(inner, frame, command_type, notification_id, status);
            }
            AecpOutcome::Unsolicited => {
                self.handle_unsolicited_aem(inner, frame, command_type);
            }
        }
    }

    fn complete_matched_aem(
        &self,
        inner: &mut ControllerInner,
        frame: &AecpAemFrame,
        command_type: AemCommandType,
        notification_id: u64,
        status: u8,
    ) {
        let ctx = inner.aecp_context.remove(&notification_id);
        let entity_id = ctx.map_or(frame.target_entity_id, |c| c.entity_id);

        if command_type == AemCommandType::ReadDescriptor {
            let configuration_index = ctx.map_or(0, |c| c.configuration_index);
            self.complete_enumeration_read(inner, entity_id, frame, configuration_index);
        } else if command_type == AemCommandType::StartOperation && frame.payload.len() >= 2 {
            let operation_id = get_u16(&frame.payload, 0);
            if let Some(record) = inner.entities.get_mut(&entity_id) {
                record.operations.push(Operation::new(operation_id, 0, notification_id));
            }
        } else if AemStatus::from(frame.status).is_success() {
            self.record_non_enumeration_response(inner, entity_id, command_type, frame, ctx);
        }

        self.hub.notify(NotificationEvent::CommandCompleted {
            entity_id,
            notification_id,
            command_type: frame.command_type,
            status,
        });
    }

    fn complete_enumeration_read(
        &self,
        inner: &mut ControllerInner,
        entity_id: u64,
        frame: &AecpAemFrame,
        configuration_index: u16,
    ) {
        let descriptor_type = DescriptorType::from(frame.descriptor_type);
        let slot = (configuration_index, descriptor_type, frame.descriptor_index);
        let Some(record) = inner.entities.get_mut(&entity_id) else {
            return;
        };

        let matched = record
            .enumeration
            .as_mut()
            .is_some_and(|driver| driver.on_descriptor_read(slot, &frame.payload));

        if AemStatus::from(frame.status).is_success() {
            let descriptor = Descriptor::new(descriptor_type, frame.descriptor_index, frame.payload.clone());
            match descriptor_type {
                DescriptorType::Entity => record.entity.entity_descriptor = Some(descriptor),
                DescriptorType::Configuration => {
                    record.entity.configuration_mut(frame.descriptor_index).set_own(descriptor);
                }
                _ => {
                    record.entity.insert_descriptor(configuration_index, descriptor);
                }
            }
        }

        let done = record.enumeration.as_ref().is_some_and(EnumerationDriver::is_done);
        if done {
            if record.entity.status == EntityStatus::Enumerating {
                record.entity.mark_online();
                self.hub
                    .notify(NotificationEvent::EndStationReadCompleted { entity_id });
            }
        } else if matched {
            self.drive_enumeration(inner, entity_id);
        }
    }

    /// For a successful response to any AEM command other than
    /// `READ_DESCRIPTOR`/`START_OPERATION`: file its payload on the
    /// descriptor it's addressed to (§4.6's "outgoing command-type
    /// determines which descriptor receives the response"), and apply the
    /// handful of commands whose response mutates stored state directly
    /// (`ACQUIRE_ENTITY`, `LOCK_ENTITY`, `SET_NAME`).
    fn record_non_enumeration_response(
        &self,
        inner: &mut ControllerInner,
        entity_id: u64,
        command_type: AemCommandType,
        frame: &AecpAemFrame,
        ctx: Option<AecpContext>,
    ) {
        let configuration_index = ctx.map_or(0, |c| c.configuration_index);
        let descriptor_type = DescriptorType::from(frame.descriptor_type);

        match command_type {
            AemCommandType::AcquireEntity if frame.payload.len() >= 12 => {
                let owner_entity_id = crate::codec::bytes::get_u64(&frame.payload, 4);
                if let Some(record) = inner.entities.get_mut(&entity_id) {
                    record.entity.apply_acquire_state(self.entity_id, owner_entity_id);
                }
            }
            AemCommandType::LockEntity if frame.payload.len() >= 12 => {
                let locked_entity_id = crate::codec::bytes::get_u64(&frame.payload, 4);
                if let Some(record) = inner.entities.get_mut(&entity_id) {
                    record.entity.apply_lock_state(self.entity_id, locked_entity_id);
                }
            }
            AemCommandType::SetName => {
                if let (Some(record), Some(offset)) = (
                    inner.entities.get_mut(&entity_id),
                    crate::model::primary_name_offset(descriptor_type),
                ) {
                    if let Some(descriptor) =
                        record
                            .entity
                            .addressed_descriptor_mut(configuration_index, descriptor_type, frame.descriptor_index)
                    {
                        descriptor.apply_name(offset, &frame.payload);
                    }
                }
            }
            _ => {}
        }

        if let Some(record) = inner.entities.get_mut(&entity_id) {
            if let Some(descriptor) =
                record
                    .entity
                    .addressed_descriptor_mut(configuration_index, descriptor_type, frame.descriptor_index)
            {
                descriptor.record_response(u16::from(command_type), frame.payload.clone());
            }
        }
    }

    fn handle_unsolicited_aem(&self, inner: &mut ControllerInner, frame: &AecpAemFrame, command_type: AemCommandType) {
        if command_type == AemCommandType::OperationStatus && frame.payload.len() >= 4 {
            let operation_id = get_u16(&frame.payload, 0);
            let percent_complete = get_u16(&frame.payload, 2);
            if let Some(record) = inner.entities.get_mut(&frame.target_entity_id) {
                if let Some(op) = record.operations.update(operation_id, percent_complete) {
                    self.hub.notify(NotificationEvent::OperationStatus {
                        entity_id: frame.target_entity_id,
                        notification_id: op.notification_id,
                        operation_id,
                        percent_complete,
                    });
                }
            }
            return;
        }

        self.hub.notify(NotificationEvent::UnsolicitedResponse {
            entity_id: frame.target_entity_id,
            command_type: frame.command_type,
        });
    }

    fn handle_aem_command_from_entity(&self, frame: &AecpAemFrame) {
        let (command_type, _) = AemCommandType::from_wire(frame.command_type);
        if command_type != AemCommandType::ControllerAvailable {
            return;
        }
        let response = AecpAemFrame {
            message_type: AecpMessageType::AemResponse,
            status: AemStatus::Success.into(),
            target_entity_id: frame.target_entity_id,
            controller_entity_id: self.entity_id,
            sequence_id: frame.sequence_id,
            command_type: frame.command_type,
            descriptor_type: frame.descriptor_type,
            descriptor_index: frame.descriptor_index,
            payload: Vec::new(),
        };
        if let Ok(bytes) = response.build(self.mac, config::AVDECC_MULTICAST_MAC) {
            let _ = self.platform.send_frame(&bytes);
        }
    }

    fn handle_aecp_aa(&self, inner: &mut ControllerInner, frame: &AecpAaFrame) {
        if frame.message_type != AecpMessageType::AddressAccessResponse {
            return;
        }
        if let AecpOutcome::Matched { notification_id, status } =
            inner.aecp.on_raw_response(frame.sequence_id, frame.status)
        {
            let ctx = inner.aecp_context.remove(&notification_id);
            let entity_id = ctx.map_or(frame.target_entity_id, |c| c.entity_id);
            self.hub.notify(NotificationEvent::CommandCompleted {
                entity_id,
                notification_id,
                command_type: u16::from(AecpMessageType::AddressAccessCommand),
                status,
            });
        }
    }

    fn handle_acmp(&self, inner: &mut ControllerInner, frame: &AcmpFrame) {
        if !frame.message_type.is_response() {
            return;
        }
        match inner.acmp.on_response(frame) {
            AcmpOutcome::Matched { notification_id } => {
                inner.acmp_context.remove(&notification_id);
                self.hub.notify_acmp(AcmpNotificationEvent {
                    message_type: frame.message_type,
                    status: AcmpStatus::from(frame.status),
                    notification_id,
                    talker_entity_id: frame.talker_entity_id,
                    listener_entity_id: frame.listener_entity_id,
                    talker_unique_id: frame.talker_unique_id,
                    listener_unique_id: frame.listener_unique_id,
                });
            }
            AcmpOutcome::Unmatched => {
                // CONNECT_RX_RESPONSE/DISCONNECT_RX_RESPONSE can arrive with
                // no matching inflight, triggered by a command some other
                // controller sent. Surface them anyway, matched by the
                // listener endpoint alone, since they still change that
                // endpoint's connection state.
                let unsolicited = matches!(
                    frame.message_type,
                    crate::codec::AcmpMessageType::ConnectRxResponse | crate::codec::AcmpMessageType::DisconnectRxResponse
                );
                if unsolicited && inner.entities.contains_key(&frame.listener_entity_id) {
                    self.hub.notify_acmp(AcmpNotificationEvent {
                        message_type: frame.message_type,
                        status: AcmpStatus::from(frame.status),
                        notification_id: crate::notify::UNSOLICITED_NOTIFICATION_ID,
                        talker_entity_id: frame.talker_entity_id,
                        listener_entity_id: frame.listener_entity_id,
                        talker_unique_id: frame.talker_unique_id,
                        listener_unique_id: frame.listener_unique_id,
                    });
                }
            }
        }
    }

    // -- periodic driving --------------------------------------------------

    /// Advance every retry/timeout timer and expire stale entities. Must be
    /// called periodically; see [`config::RECOMMENDED_TICK_PERIOD`].
    pub fn tick(&self) {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        let enumerating: Vec<u64> = inner
            .entities
            .iter()
            .filter(|(_, r)| r.entity.status == EntityStatus::Enumerating)
            .map(|(id, _)| *id)
            .collect();
        for entity_id in enumerating {
            self.drive_enumeration(&mut inner, entity_id);
        }

        for action in inner.aecp.tick(now) {
            match action {
                AecpTickAction::Retry { frame, .. } => {
                    let _ = self.platform.send_frame(&frame);
                }
                AecpTickAction::TimedOut { notification_id } => {
                    self.handle_aecp_timeout(&mut inner, notification_id);
                }
            }
        }

        for action in inner.acmp.tick(now) {
            match action {
                AcmpTickAction::Retry { frame, .. } => {
                    let _ = self.platform.send_frame(&frame);
                }
                AcmpTickAction::TimedOut { notification_id } => {
                    let ctx = inner.acmp_context.remove(&notification_id);
                    self.hub.notify_acmp(AcmpNotificationEvent {
                        message_type: ctx.map_or(AcmpMessageType::ConnectRxCommand, |c| c.message_type),
                        status: AcmpStatus::ListenerTalkerTimeout,
                        notification_id,
                        talker_entity_id: ctx.map_or(0, |c| c.talker_entity_id),
                        listener_entity_id: ctx.map_or(0, |c| c.listener_entity_id),
                        talker_unique_id: ctx.map_or(0, |c| c.talker_unique_id),
                        listener_unique_id: ctx.map_or(0, |c| c.listener_unique_id),
                    });
                }
            }
        }

        let newly_expired: Vec<u64> = inner
            .entities
            .iter()
            .filter(|(_, r)| r.entity.status != EntityStatus::Departed && r.entity.is_expired(now))
            .map(|(id, _)| *id)
            .collect();
        for entity_id in newly_expired {
            if let Some(record) = inner.entities.get_mut(&entity_id) {
                record.entity.mark_departed();
            }
            self.hub.notify(NotificationEvent::EndStationDeparted { entity_id });
        }
    }

    fn handle_aecp_timeout(&self, inner: &mut ControllerInner, notification_id: u64) {
        let ctx = inner.aecp_context.remove(&notification_id);
        let entity_id = ctx.map_or(0, |c| c.entity_id);

        if let Some(ctx) = ctx {
            let (command_type, _) = AemCommandType::from_wire(ctx.command_type);
            if command_type == AemCommandType::ReadDescriptor {
                let slot = (
                    ctx.configuration_index,
                    DescriptorType::from(ctx.descriptor_type),
                    ctx.descriptor_index,
                );
                if let Some(record) = inner.entities.get_mut(&ctx.entity_id) {
                    let done = record
                        .enumeration
                        .as_mut()
                        .is_some_and(|driver| {
                            driver.on_descriptor_timeout(slot);
                            driver.is_done()
                        });
                    if done {
                        if record.entity.status == EntityStatus::Enumerating {
                            record.entity.mark_online();
                            self.hub.notify(NotificationEvent::EndStationReadCompleted {
                                entity_id: ctx.entity_id,
                            });
                        }
                    } else {
                        self.drive_enumeration(inner, ctx.entity_id);
                    }
                }
            }
        }

        self.hub
            .notify(NotificationEvent::CommandTimeout { entity_id, notification_id });
    }

    // -- host-initiated AEM commands ----------------------------------------

    fn send_aem_command(
        &self,
        entity_id: u64,
        command_type: AemCommandType,
        descriptor_type: u16,
        descriptor_index: u16,
        payload: Vec<u8>,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        let mut inner = self.inner.lock();
        let Some(configuration_index) = inner
            .entities
            .get(&entity_id)
            .map(|r| r.entity.current_configuration_index)
        else {
            return Err(FacadeError::NoMatchingEntity);
        };

        let seq = inner.aecp.alloc_sequence_id();
        let frame = AecpAemFrame {
            message_type: AecpMessageType::AemCommand,
            status: 0,
            target_entity_id: entity_id,
            controller_entity_id: self.entity_id,
            sequence_id: seq,
            command_type: command_type.to_wire(false),
            descriptor_type,
            descriptor_index,
            payload,
        };
        let bytes = frame
            .build(self.mac, config::AVDECC_MULTICAST_MAC)
            .map_err(|e| FacadeError::Transport { reason: e.to_string() })?;

        self.platform
            .send_frame(&bytes)
            .map_err(|e| FacadeError::Transport { reason: e.to_string() })?;

        inner.aecp.register_sent(seq, notification_id, bytes, Instant::now());
        inner.aecp_context.insert(
            notification_id,
            AecpContext {
                entity_id,
                command_type: command_type.to_wire(false),
                descriptor_type,
                descriptor_index,
                configuration_index,
            },
        );
        Ok(())
    }

    pub fn send_acquire_entity_cmd(&self, entity_id: u64, flags: u32, notification_id: u64) -> Result<(), FacadeError> {
        self.send_aem_command(entity_id, AemCommandType::AcquireEntity, 0, 0, flags.to_be_bytes().to_vec(), notification_id)
    }

    pub fn send_lock_entity_cmd(&self, entity_id: u64, flags: u32, notification_id: u64) -> Result<(), FacadeError> {
        self.send_aem_command(entity_id, AemCommandType::LockEntity, 0, 0, flags.to_be_bytes().to_vec(), notification_id)
    }

    pub fn send_controller_available_cmd(&self, entity_id: u64, notification_id: u64) -> Result<(), FacadeError> {
        self.send_aem_command(entity_id, AemCommandType::ControllerAvailable, 0, 0, Vec::new(), notification_id)
    }

    pub fn send_read_descriptor_cmd(
        &self,
        entity_id: u64,
        descriptor_type: u16,
        descriptor_index: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_aem_command(entity_id, AemCommandType::ReadDescriptor, descriptor_type, descriptor_index, Vec::new(), notification_id)
    }

    pub fn send_get_configuration_cmd(&self, entity_id: u64, notification_id: u64) -> Result<(), FacadeError> {
        self.send_aem_command(entity_id, AemCommandType::GetConfiguration, 0, 0, Vec::new(), notification_id)
    }

    pub fn send_set_configuration_cmd(
        &self,
        entity_id: u64,
        configuration_index: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_aem_command(
            entity_id,
            AemCommandType::SetConfiguration,
            0,
            0,
            configuration_index.to_be_bytes().to_vec(),
            notification_id,
        )
    }

    pub fn send_get_name_cmd(
        &self,
        entity_id: u64,
        descriptor_type: u16,
        descriptor_index: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_aem_command(entity_id, AemCommandType::GetName, descriptor_type, descriptor_index, Vec::new(), notification_id)
    }

    pub fn send_set_name_cmd(
        &self,
        entity_id: u64,
        descriptor_type: u16,
        descriptor_index: u16,
        name: Vec<u8>,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_aem_command(entity_id, AemCommandType::SetName, descriptor_type, descriptor_index, name, notification_id)
    }

    pub fn send_get_clock_source_cmd(
        &self,
        entity_id: u64,
        descriptor_index: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_aem_command(
            entity_id,
            AemCommandType::GetClockSource,
            DescriptorType::ClockDomain.into(),
            descriptor_index,
            Vec::new(),
            notification_id,
        )
    }

    pub fn send_set_clock_source_cmd(
        &self,
        entity_id: u64,
        descriptor_index: u16,
        clock_source_index: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_aem_command(
            entity_id,
            AemCommandType::SetClockSource,
            DescriptorType::ClockDomain.into(),
            descriptor_index,
            clock_source_index.to_be_bytes().to_vec(),
            notification_id,
        )
    }

    pub fn send_get_stream_format_cmd(
        &self,
        entity_id: u64,
        descriptor_type: u16,
        descriptor_index: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_aem_command(entity_id, AemCommandType::GetStreamFormat, descriptor_type, descriptor_index, Vec::new(), notification_id)
    }

    pub fn send_set_stream_format_cmd(
        &self,
        entity_id: u64,
        descriptor_type: u16,
        descriptor_index: u16,
        stream_format: Vec<u8>,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_aem_command(entity_id, AemCommandType::SetStreamFormat, descriptor_type, descriptor_index, stream_format, notification_id)
    }

    pub fn send_get_stream_info_cmd(
        &self,
        entity_id: u64,
        descriptor_type: u16,
        descriptor_index: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_aem_command(entity_id, AemCommandType::GetStreamInfo, descriptor_type, descriptor_index, Vec::new(), notification_id)
    }

    pub fn send_set_stream_info_cmd(
        &self,
        entity_id: u64,
        descriptor_type: u16,
        descriptor_index: u16,
        stream_info: Vec<u8>,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_aem_command(entity_id, AemCommandType::SetStreamInfo, descriptor_type, descriptor_index, stream_info, notification_id)
    }

    pub fn send_start_streaming_cmd(
        &self,
        entity_id: u64,
        descriptor_type: u16,
        descriptor_index: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_aem_command(entity_id, AemCommandType::StartStreaming, descriptor_type, descriptor_index, Vec::new(), notification_id)
    }

    pub fn send_stop_streaming_cmd(
        &self,
        entity_id: u64,
        descriptor_type: u16,
        descriptor_index: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_aem_command(entity_id, AemCommandType::StopStreaming, descriptor_type, descriptor_index, Vec::new(), notification_id)
    }

    pub fn send_reboot_cmd(&self, entity_id: u64, notification_id: u64) -> Result<(), FacadeError> {
        self.send_aem_command(entity_id, AemCommandType::Reboot, 0, 0, Vec::new(), notification_id)
    }

    pub fn send_start_operation_cmd(
        &self,
        entity_id: u64,
        descriptor_type: u16,
        descriptor_index: u16,
        operation_type: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_aem_command(
            entity_id,
            AemCommandType::StartOperation,
            descriptor_type,
            descriptor_index,
            operation_type.to_be_bytes().to_vec(),
            notification_id,
        )
    }

    pub fn send_abort_operation_cmd(
        &self,
        entity_id: u64,
        descriptor_type: u16,
        descriptor_index: u16,
        operation_id: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        let mut inner = self.inner.lock();
        if let Some(record) = inner.entities.get_mut(&entity_id) {
            record.operations.remove(operation_id);
        }
        drop(inner);
        self.send_aem_command(
            entity_id,
            AemCommandType::AbortOperation,
            descriptor_type,
            descriptor_index,
            operation_id.to_be_bytes().to_vec(),
            notification_id,
        )
    }

    pub fn send_aecp_address_access_cmd(
        &self,
        entity_id: u64,
        tlv_count: u16,
        payload: Vec<u8>,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        let mut inner = self.inner.lock();
        if !inner.entities.contains_key(&entity_id) {
            return Err(FacadeError::NoMatchingEntity);
        }
        let seq = inner.aecp.alloc_sequence_id();
        let frame = AecpAaFrame {
            message_type: AecpMessageType::AddressAccessCommand,
            status: 0,
            target_entity_id: entity_id,
            controller_entity_id: self.entity_id,
            sequence_id: seq,
            tlv_count,
            payload,
        };
        let bytes = frame
            .build(self.mac, config::AVDECC_MULTICAST_MAC)
            .map_err(|e| FacadeError::Transport { reason: e.to_string() })?;
        self.platform
            .send_frame(&bytes)
            .map_err(|e| FacadeError::Transport { reason: e.to_string() })?;
        inner.aecp.register_sent(seq, notification_id, bytes, Instant::now());
        inner.aecp_context.insert(
            notification_id,
            AecpContext {
                entity_id,
                command_type: u16::from(AecpMessageType::AddressAccessCommand),
                descriptor_type: 0,
                descriptor_index: 0,
                configuration_index: 0,
            },
        );
        Ok(())
    }

    // -- host-initiated ACMP commands ---------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn send_acmp_command(
        &self,
        message_type: AcmpMessageType,
        talker_entity_id: u64,
        listener_entity_id: u64,
        talker_unique_id: u16,
        listener_unique_id: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        let mut inner = self.inner.lock();
        let seq = inner.acmp.alloc_sequence_id();
        let frame = AcmpFrame {
            message_type,
            status: 0,
            stream_id: 0,
            controller_entity_id: self.entity_id,
            talker_entity_id,
            listener_entity_id,
            talker_unique_id,
            listener_unique_id,
            stream_dest_mac: [0; 6],
            connection_count: 0,
            sequence_id: seq,
            flags: 0,
        };
        let bytes = frame.build(self.mac, config::AVDECC_MULTICAST_MAC);
        self.platform
            .send_frame(&bytes)
            .map_err(|e| FacadeError::Transport { reason: e.to_string() })?;
        inner.acmp.register_sent(seq, notification_id, bytes, message_type, Instant::now());
        inner.acmp_context.insert(
            notification_id,
            AcmpContext {
                message_type,
                talker_entity_id,
                listener_entity_id,
                talker_unique_id,
                listener_unique_id,
            },
        );
        Ok(())
    }

    pub fn send_connect_rx_cmd(
        &self,
        talker_entity_id: u64,
        talker_unique_id: u16,
        listener_entity_id: u64,
        listener_unique_id: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_acmp_command(
            AcmpMessageType::ConnectRxCommand,
            talker_entity_id,
            listener_entity_id,
            talker_unique_id,
            listener_unique_id,
            notification_id,
        )
    }

    pub fn send_disconnect_rx_cmd(
        &self,
        talker_entity_id: u64,
        talker_unique_id: u16,
        listener_entity_id: u64,
        listener_unique_id: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_acmp_command(
            AcmpMessageType::DisconnectRxCommand,
            talker_entity_id,
            listener_entity_id,
            talker_unique_id,
            listener_unique_id,
            notification_id,
        )
    }

    pub fn send_get_rx_state_cmd(
        &self,
        listener_entity_id: u64,
        listener_unique_id: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_acmp_command(
            AcmpMessageType::GetRxStateCommand,
            0,
            listener_entity_id,
            0,
            listener_unique_id,
            notification_id,
        )
    }

    pub fn send_get_tx_state_cmd(
        &self,
        talker_entity_id: u64,
        talker_unique_id: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        self.send_acmp_command(
            AcmpMessageType::GetTxStateCommand,
            talker_entity_id,
            0,
            talker_unique_id,
            0,
            notification_id,
        )
    }

    /// Query which listeners are connected to a talker stream output.
    /// Distinct from `GET_TX_STATE` because a talker can fan out to many
    /// listeners.
    pub fn send_get_tx_connection_cmd(
        &self,
        talker_entity_id: u64,
        talker_unique_id: u16,
        connection_count: u16,
        notification_id: u64,
    ) -> Result<(), FacadeError> {
        let mut inner = self.inner.lock();
        let seq = inner.acmp.alloc_sequence_id();
        let frame = AcmpFrame {
            message_type: AcmpMessageType::GetTxConnectionCommand,
            status: 0,
            stream_id: 0,
            controller_entity_id: self.entity_id,
            talker_entity_id,
            listener_entity_id: 0,
            talker_unique_id,
            listener_unique_id: 0,
            stream_dest_mac: [0; 6],
            connection_count,
            sequence_id: seq,
            flags: 0,
        };
        let bytes = frame.build(self.mac, config::AVDECC_MULTICAST_MAC);
        self.platform
            .send_frame(&bytes)
            .map_err(|e| FacadeError::Transport { reason: e.to_string() })?;
        inner
            .acmp
            .register_sent(seq, notification_id, bytes, AcmpMessageType::GetTxConnectionCommand, Instant::now());
        inner.acmp_context.insert(
            notification_id,
            AcmpContext {
                message_type: AcmpMessageType::GetTxConnectionCommand,
                talker_entity_id,
                listener_entity_id: 0,
                talker_unique_id,
                listener_unique_id: 0,
            },
        );
        Ok(())
    }

    pub fn send_entity_discover(&self, target_entity_id: u64) -> Result<(), FacadeError> {
        let frame = discovery::build_entity_discover(self.mac, target_entity_id);
        let bytes = frame.build(self.mac, config::AVDECC_MULTICAST_MAC);
        self.platform
            .send_frame(&bytes)
            .map_err(|e| FacadeError::Transport { reason: e.to_string() })
    }
}
