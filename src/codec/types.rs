// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire-level enumerations shared by the three AVDECC subtypes.
//!
//! Every enum here follows the same `TryFrom<N>` + `Unknown(N)` shape: a
//! value this controller doesn't recognize is never a parse failure, it is
//! carried through opaquely: keep the raw numeric value and let the host
//! decide what to do with it.

use std::convert::TryFrom;

/// AVTP common-header subtype (12-byte common control header, byte 0 low 7 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subtype {
    Adp,
    Aecp,
    Acmp,
    Unknown(u8),
}

impl From<u8> for Subtype {
    fn from(value: u8) -> Self {
        match value {
            crate::config::SUBTYPE_ADP => Subtype::Adp,
            crate::config::SUBTYPE_AECP => Subtype::Aecp,
            crate::config::SUBTYPE_ACMP => Subtype::Acmp,
            other => Subtype::Unknown(other),
        }
    }
}

impl From<Subtype> for u8 {
    fn from(value: Subtype) -> Self {
        match value {
            Subtype::Adp => crate::config::SUBTYPE_ADP,
            Subtype::Aecp => crate::config::SUBTYPE_AECP,
            Subtype::Acmp => crate::config::SUBTYPE_ACMP,
            Subtype::Unknown(raw) => raw,
        }
    }
}

/// ADPDU message type (common header `message_type` nibble, ADP subtype).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdpMessageType {
    EntityAvailable,
    EntityDeparting,
    EntityDiscover,
    Unknown(u8),
}

impl From<u8> for AdpMessageType {
    fn from(value: u8) -> Self {
        match value {
            0 => AdpMessageType::EntityAvailable,
            1 => AdpMessageType::EntityDeparting,
            2 => AdpMessageType::EntityDiscover,
            other => AdpMessageType::Unknown(other),
        }
    }
}

impl From<AdpMessageType> for u8 {
    fn from(value: AdpMessageType) -> Self {
        match value {
            AdpMessageType::EntityAvailable => 0,
            AdpMessageType::EntityDeparting => 1,
            AdpMessageType::EntityDiscover => 2,
            AdpMessageType::Unknown(raw) => raw,
        }
    }
}

/// AECPDU message type (common header `message_type` nibble, AECP subtype).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AecpMessageType {
    AemCommand,
    AemResponse,
    AddressAccessCommand,
    AddressAccessResponse,
    Unknown(u8),
}

impl From<u8> for AecpMessageType {
    fn from(value: u8) -> Self {
        match value {
            0 => AecpMessageType::AemCommand,
            1 => AecpMessageType::AemResponse,
            4 => AecpMessageType::AddressAccessCommand,
            5 => AecpMessageType::AddressAccessResponse,
            other => AecpMessageType::Unknown(other),
        }
    }
}

impl From<AecpMessageType> for u8 {
    fn from(value: AecpMessageType) -> Self {
        match value {
            AecpMessageType::AemCommand => 0,
            AecpMessageType::AemResponse => 1,
            AecpMessageType::AddressAccessCommand => 4,
            AecpMessageType::AddressAccessResponse => 5,
            AecpMessageType::Unknown(raw) => raw,
        }
    }
}

/// ACMPDU message type (common header `message_type` nibble, ACMP subtype).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcmpMessageType {
    ConnectTxCommand,
    ConnectTxResponse,
    DisconnectTxCommand,
    DisconnectTxResponse,
    GetTxStateCommand,
    GetTxStateResponse,
    ConnectRxCommand,
    ConnectRxResponse,
    DisconnectRxCommand,
    DisconnectRxResponse,
    GetRxStateCommand,
    GetRxStateResponse,
    GetTxConnectionCommand,
    GetTxConnectionResponse,
    Unknown(u8),
}

impl From<u8> for AcmpMessageType {
    fn from(value: u8) -> Self {
        match value {
            0 => AcmpMessageType::ConnectTxCommand,
            1 => AcmpMessageType::ConnectTxResponse,
            2 => AcmpMessageType::DisconnectTxCommand,
            3 => AcmpMessageType::DisconnectTxResponse,
            4 => AcmpMessageType::GetTxStateCommand,
            5 => AcmpMessageType::GetTxStateResponse,
            6 => AcmpMessageType::ConnectRxCommand,
            7 => AcmpMessageType::ConnectRxResponse,
            8 => AcmpMessageType::DisconnectRxCommand,
            9 => AcmpMessageType::DisconnectRxResponse,
            10 => AcmpMessageType::GetRxStateCommand,
            11 => AcmpMessageType::GetRxStateResponse,
            12 => AcmpMessageType::GetTxConnectionCommand,
            13 => AcmpMessageType::GetTxConnectionResponse,
            other => AcmpMessageType::Unknown(other),
        }
    }
}

impl From<AcmpMessageType> for u8 {
    fn from(value: AcmpMessageType) -> Self {
        match value {
            AcmpMessageType::ConnectTxCommand => 0,
            AcmpMessageType::ConnectTxResponse => 1,
            AcmpMessageType::DisconnectTxCommand => 2,
            AcmpMessageType::DisconnectTxResponse => 3,
            AcmpMessageType::GetTxStateCommand => 4,
            AcmpMessageType::GetTxStateResponse => 5,
            AcmpMessageType::ConnectRxCommand => 6,
            AcmpMessageType::ConnectRxResponse => 7,
            AcmpMessageType::DisconnectRxCommand => 8,
            AcmpMessageType::DisconnectRxResponse => 9,
            AcmpMessageType::GetRxStateCommand => 10,
            AcmpMessageType::GetRxStateResponse => 11,
            AcmpMessageType::GetTxConnectionCommand => 12,
            AcmpMessageType::GetTxConnectionResponse => 13,
            AcmpMessageType::Unknown(raw) => raw,
        }
    }
}

impl AcmpMessageType {
    /// `true` for the `*_RESPONSE` variants.
    #[must_use]
    pub fn is_response(self) -> bool {
        matches!(
            self,
            AcmpMessageType::ConnectTxResponse
                | AcmpMessageType::DisconnectTxResponse
                | AcmpMessageType::GetTxStateResponse
                | AcmpMessageType::ConnectRxResponse
                | AcmpMessageType::DisconnectRxResponse
                | AcmpMessageType::GetRxStateResponse
                | AcmpMessageType::GetTxConnectionResponse
        )
    }
}

/// AECP status code (5-bit common-header status field, AEM and AA share it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AemStatus {
    Success,
    NotImplemented,
    NoSuchDescriptor,
    EntityLocked,
    EntityAcquired,
    NotAuthenticated,
    AuthenticationDisabled,
    BadArguments,
    NoResources,
    InProgress,
    EntityMisbehaving,
    NotSupported,
    StreamIsRunning,
    Unknown(u8),
}

impl From<u8> for AemStatus {
    fn from(value: u8) -> Self {
        match value {
            0 => AemStatus::Success,
            1 => AemStatus::NotImplemented,
            2 => AemStatus::NoSuchDescriptor,
            3 => AemStatus::EntityLocked,
            4 => AemStatus::EntityAcquired,
            5 => AemStatus::NotAuthenticated,
            6 => AemStatus::AuthenticationDisabled,
            7 => AemStatus::BadArguments,
            8 => AemStatus::NoResources,
            9 => AemStatus::InProgress,
            10 => AemStatus::EntityMisbehaving,
            11 => AemStatus::NotSupported,
            12 => AemStatus::StreamIsRunning,
            other => AemStatus::Unknown(other),
        }
    }
}

impl From<AemStatus> for u8 {
    fn from(value: AemStatus) -> Self {
        match value {
            AemStatus::Success => 0,
            AemStatus::NotImplemented => 1,
            AemStatus::NoSuchDescriptor => 2,
            AemStatus::EntityLocked => 3,
            AemStatus::EntityAcquired => 4,
            AemStatus::NotAuthenticated => 5,
            AemStatus::AuthenticationDisabled => 6,
            AemStatus::BadArguments => 7,
            AemStatus::NoResources => 8,
            AemStatus::InProgress => 9,
            AemStatus::EntityMisbehaving => 10,
            AemStatus::NotSupported => 11,
            AemStatus::StreamIsRunning => 12,
            AemStatus::Unknown(raw) => raw,
        }
    }
}

impl AemStatus {
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, AemStatus::Success)
    }
}

/// ACMP status code (5-bit common-header status field, ACMP subtype).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcmpStatus {
    Success,
    ListenerUnknownId,
    TalkerUnknownId,
    TalkerDestMacFail,
    TalkerNoStreamIndex,
    TalkerNoBandwidth,
    TalkerExclusive,
    ListenerTalkerTimeout,
    ListenerExclusive,
    StateUnavailable,
    NotConnected,
    NoSuchConnection,
    CouldNotSendMessage,
    TalkerMisbehaving,
    ListenerMisbehaving,
    ControllerNotAuthorized,
    IncompatibleRequest,
    NotSupported,
    Unknown(u8),
}

impl From<u8> for AcmpStatus {
    fn from(value: u8) -> Self {
        match value {
            0 => AcmpStatus::Success,
            1 => AcmpStatus::ListenerUnknownId,
            2 => AcmpStatus::TalkerUnknownId,
            3 => AcmpStatus::TalkerDestMacFail,
            4 => AcmpStatus::TalkerNoStreamIndex,
            5 => AcmpStatus::TalkerNoBandwidth,
            6 => AcmpStatus::TalkerExclusive,
            7 => AcmpStatus::ListenerTalkerTimeout,
            8 => AcmpStatus::ListenerExclusive,
            9 => AcmpStatus::StateUnavailable,
            10 => AcmpStatus::NotConnected,
            11 => AcmpStatus::NoSuchConnection,
            12 => AcmpStatus::CouldNotSendMessage,
            13 => AcmpStatus::TalkerMisbehaving,
            14 => AcmpStatus::ListenerMisbehaving,
            15 => AcmpStatus::ControllerNotAuthorized,
            16 => AcmpStatus::IncompatibleRequest,
            31 => AcmpStatus::NotSupported,
            other => AcmpStatus::Unknown(other),
        }
    }
}

impl From<AcmpStatus> for u8 {
    fn from(value: AcmpStatus) -> Self {
        match value {
            AcmpStatus::Success => 0,
            AcmpStatus::ListenerUnknownId => 1,
            AcmpStatus::TalkerUnknownId => 2,
            AcmpStatus::TalkerDestMacFail => 3,
            AcmpStatus::TalkerNoStreamIndex => 4,
            AcmpStatus::TalkerNoBandwidth => 5,
            AcmpStatus::TalkerExclusive => 6,
            AcmpStatus::ListenerTalkerTimeout => 7,
            AcmpStatus::ListenerExclusive => 8,
            AcmpStatus::StateUnavailable => 9,
            AcmpStatus::NotConnected => 10,
            AcmpStatus::NoSuchConnection => 11,
            AcmpStatus::CouldNotSendMessage => 12,
            AcmpStatus::TalkerMisbehaving => 13,
            AcmpStatus::ListenerMisbehaving => 14,
            AcmpStatus::ControllerNotAuthorized => 15,
            AcmpStatus::IncompatibleRequest => 16,
            AcmpStatus::NotSupported => 31,
            AcmpStatus::Unknown(raw) => raw,
        }
    }
}

impl AcmpStatus {
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, AcmpStatus::Success)
    }
}

/// AEM descriptor type (16-bit field appearing in READ_DESCRIPTOR and every
/// descriptor-addressed command). Carried through verbatim regardless of
/// whether this controller understands the descriptor's byte layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    Entity,
    Configuration,
    AudioUnit,
    VideoUnit,
    SensorUnit,
    StreamInput,
    StreamOutput,
    JackInput,
    JackOutput,
    AvbInterface,
    ClockSource,
    MemoryObject,
    Locale,
    Strings,
    StreamPortInput,
    StreamPortOutput,
    ExternalPortInput,
    ExternalPortOutput,
    InternalPortInput,
    InternalPortOutput,
    AudioCluster,
    VideoCluster,
    SensorCluster,
    AudioMap,
    VideoMap,
    SensorMap,
    Control,
    SignalSelector,
    Mixer,
    Matrix,
    MatrixSignal,
    SignalSplitter,
    SignalCombiner,
    SignalDemultiplexer,
    SignalMultiplexer,
    SignalTranscoder,
    ClockDomain,
    ControlBlock,
    Invalid,
    Unknown(u16),
}

impl From<u16> for DescriptorType {
    fn from(value: u16) -> Self {
        match value {
            0x0000 => DescriptorType::Entity,
            0x0001 => DescriptorType::Configuration,
            0x0002 => DescriptorType::AudioUnit,
            0x0003 => DescriptorType::VideoUnit,
            0x0004 => DescriptorType::SensorUnit,
            0x0005 => DescriptorType::StreamInput,
            0x0006 => DescriptorType::StreamOutput,
            0x0007 => DescriptorType::JackInput,
            0x0008 => DescriptorType::JackOutput,
            0x0009 => DescriptorType::AvbInterface,
            0x000A => DescriptorType::ClockSource,
            0x000B => DescriptorType::MemoryObject,
            0x000C => DescriptorType::Locale,
            0x000D => DescriptorType::Strings,
            0x000E => DescriptorType::StreamPortInput,
            0x000F => DescriptorType::StreamPortOutput,
            0x0010 => DescriptorType::ExternalPortInput,
            0x0011 => DescriptorType::ExternalPortOutput,
            0x0012 => DescriptorType::InternalPortInput,
            0x0013 => DescriptorType::InternalPortOutput,
            0x0014 => DescriptorType::AudioCluster,
            0x0015 => DescriptorType::VideoCluster,
            0x0016 => DescriptorType::SensorCluster,
            0x0017 => DescriptorType::AudioMap,
            0x0018 => DescriptorType::VideoMap,
            0x0019 => DescriptorType::SensorMap,
            0x001A => DescriptorType::Control,
            0x001B => DescriptorType::SignalSelector,
            0x001C => DescriptorType::Mixer,
            0x001D => DescriptorType::Matrix,
            0x001E => DescriptorType::MatrixSignal,
            0x001F => DescriptorType::SignalSplitter,
            0x0020 => DescriptorType::SignalCombiner,
            0x0021 => DescriptorType::SignalDemultiplexer,
            0x0022 => DescriptorType::SignalMultiplexer,
            0x0023 => DescriptorType::SignalTranscoder,
            0x0024 => DescriptorType::ClockDomain,
            0x0025 => DescriptorType::ControlBlock,
            0xFFFF => DescriptorType::Invalid,
            other => DescriptorType::Unknown(other),
        }
    }
}

impl From<DescriptorType> for u16 {
    fn from(value: DescriptorType) -> Self {
        match value {
            DescriptorType::Entity => 0x0000,
            DescriptorType::Configuration => 0x0001,
            DescriptorType::AudioUnit => 0x0002,
            DescriptorType::VideoUnit => 0x0003,
            DescriptorType::SensorUnit => 0x0004,
            DescriptorType::StreamInput => 0x0005,
            DescriptorType::StreamOutput => 0x0006,
            DescriptorType::JackInput => 0x0007,
            DescriptorType::JackOutput => 0x0008,
            DescriptorType::AvbInterface => 0x0009,
            DescriptorType::ClockSource => 0x000A,
            DescriptorType::MemoryObject => 0x000B,
            DescriptorType::Locale => 0x000C,
            DescriptorType::Strings => 0x000D,
            DescriptorType::StreamPortInput => 0x000E,
            DescriptorType::StreamPortOutput => 0x000F,
            DescriptorType::ExternalPortInput => 0x0010,
            DescriptorType::ExternalPortOutput => 0x0011,
            DescriptorType::InternalPortInput => 0x0012,
            DescriptorType::InternalPortOutput => 0x0013,
            DescriptorType::AudioCluster => 0x0014,
            DescriptorType::VideoCluster => 0x0015,
            DescriptorType::SensorCluster => 0x0016,
            DescriptorType::AudioMap => 0x0017,
            DescriptorType::VideoMap => 0x0018,
            DescriptorType::SensorMap => 0x0019,
            DescriptorType::Control => 0x001A,
            DescriptorType::SignalSelector => 0x001B,
            DescriptorType::Mixer => 0x001C,
            DescriptorType::Matrix => 0x001D,
            DescriptorType::MatrixSignal => 0x001E,
            DescriptorType::SignalSplitter => 0x001F,
            DescriptorType::SignalCombiner => 0x0020,
            DescriptorType::SignalDemultiplexer => 0x0021,
            DescriptorType::SignalMultiplexer => 0x0022,
            DescriptorType::SignalTranscoder => 0x0023,
            DescriptorType::ClockDomain => 0x0024,
            DescriptorType::ControlBlock => 0x0025,
            DescriptorType::Invalid => 0xFFFF,
            DescriptorType::Unknown(raw) => raw,
        }
    }
}

/// AEM command type. The top bit (`0x8000`) is the "unsolicited" marker on a
/// response; [`AemCommandType::from_wire`]/[`AemCommandType::to_wire`] split
/// it out so callers never have to mask it by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AemCommandType {
    AcquireEntity,
    LockEntity,
    EntityAvailable,
    ControllerAvailable,
    ReadDescriptor,
    WriteDescriptor,
    SetConfiguration,
    GetConfiguration,
    SetStreamFormat,
    GetStreamFormat,
    SetStreamInfo,
    GetStreamInfo,
    SetName,
    GetName,
    SetClockSource,
    GetClockSource,
    StartStreaming,
    StopStreaming,
    Reboot,
    GetAvbInfo,
    GetAsPath,
    StartOperation,
    AbortOperation,
    OperationStatus,
    Unknown(u16),
}

impl AemCommandType {
    const UNSOLICITED_BIT: u16 = 0x8000;

    #[must_use]
    pub fn from_wire(raw: u16) -> (Self, bool) {
        let unsolicited = raw & Self::UNSOLICITED_BIT != 0;
        (Self::from(raw & !Self::UNSOLICITED_BIT), unsolicited)
    }

    #[must_use]
    pub fn to_wire(self, unsolicited: bool) -> u16 {
        let base: u16 = self.into();
        if unsolicited {
            base | Self::UNSOLICITED_BIT
        } else {
            base
        }
    }
}

impl From<u16> for AemCommandType {
    fn from(value: u16) -> Self {
        match value {
            0x0000 => AemCommandType::AcquireEntity,
            0x0001 => AemCommandType::LockEntity,
            0x0002 => AemCommandType::EntityAvailable,
            0x0003 => AemCommandType::ControllerAvailable,
            0x0004 => AemCommandType::ReadDescriptor,
            0x0005 => AemCommandType::WriteDescriptor,
            0x0006 => AemCommandType::SetConfiguration,
            0x0007 => AemCommandType::GetConfiguration,
            0x0008 => AemCommandType::SetStreamFormat,
            0x0009 => AemCommandType::GetStreamFormat,
            0x000A => AemCommandType::SetStreamInfo,
            0x000B => AemCommandType::GetStreamInfo,
            0x000C => AemCommandType::SetName,
            0x000D => AemCommandType::GetName,
            0x000E => AemCommandType::SetClockSource,
            0x000F => AemCommandType::GetClockSource,
            0x0010 => AemCommandType::StartStreaming,
            0x0011 => AemCommandType::StopStreaming,
            0x0012 => AemCommandType::Reboot,
            0x0013 => AemCommandType::GetAvbInfo,
            0x0014 => AemCommandType::GetAsPath,
            0x0015 => AemCommandType::StartOperation,
            0x0016 => AemCommandType::AbortOperation,
            0x0017 => AemCommandType::OperationStatus,
            other => AemCommandType::Unknown(other),
        }
    }
}

impl From<AemCommandType> for u16 {
    fn from(value: AemCommandType) -> Self {
        match value {
            AemCommandType::AcquireEntity => 0x0000,
            AemCommandType::LockEntity => 0x0001,
            AemCommandType::EntityAvailable => 0x0002,
            AemCommandType::ControllerAvailable => 0x0003,
            AemCommandType::ReadDescriptor => 0x0004,
            AemCommandType::WriteDescriptor => 0x0005,
            AemCommandType::SetConfiguration => 0x0006,
            AemCommandType::GetConfiguration => 0x0007,
            AemCommandType::SetStreamFormat => 0x0008,
            AemCommandType::GetStreamFormat => 0x0009,
            AemCommandType::SetStreamInfo => 0x000A,
            AemCommandType::GetStreamInfo => 0x000B,
            AemCommandType::SetName => 0x000C,
            AemCommandType::GetName => 0x000D,
            AemCommandType::SetClockSource => 0x000E,
            AemCommandType::GetClockSource => 0x000F,
            AemCommandType::StartStreaming => 0x0010,
            AemCommandType::StopStreaming => 0x0011,
            AemCommandType::Reboot => 0x0012,
            AemCommandType::GetAvbInfo => 0x0013,
            AemCommandType::GetAsPath => 0x0014,
            AemCommandType::StartOperation => 0x0015,
            AemCommandType::AbortOperation => 0x0016,
            AemCommandType::OperationStatus => 0x0017,
            AemCommandType::Unknown(raw) => raw,
        }
    }
}

/// Try-from that rejects only values with the unsolicited bit already set;
/// use [`AemCommandType::from_wire`] when that bit is expected to be present.
impl TryFrom<u16> for AemCommandType {
    type Error = crate::error::CodecError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value & Self::UNSOLICITED_BIT != 0 {
            return Err(crate::error::CodecError::FrameMalformed {
                reason: format!("command_type 0x{value:04x} has unsolicited bit set"),
            });
        }
        Ok(Self::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_roundtrip() {
        assert_eq!(Subtype::from(0xFA), Subtype::Adp);
        assert_eq!(u8::from(Subtype::Adp), 0xFA);
        assert_eq!(Subtype::from(0x01), Subtype::Unknown(0x01));
    }

    #[test]
    fn test_aem_command_unsolicited_bit_roundtrip() {
        let (kind, unsolicited) = AemCommandType::from_wire(0x8004);
        assert_eq!(kind, AemCommandType::ReadDescriptor);
        assert!(unsolicited);
        assert_eq!(kind.to_wire(true), 0x8004);
        assert_eq!(kind.to_wire(false), 0x0004);
    }

    #[test]
    fn test_aem_command_unknown_roundtrip() {
        let (kind, unsolicited) = AemCommandType::from_wire(0x00FF);
        assert_eq!(kind, AemCommandType::Unknown(0x00FF));
        assert!(!unsolicited);
    }

    #[test]
    fn test_descriptor_type_roundtrip() {
        assert_eq!(DescriptorType::from(0x0005), DescriptorType::StreamInput);
        assert_eq!(u16::from(DescriptorType::StreamInput), 0x0005);
        assert_eq!(DescriptorType::from(0x1234), DescriptorType::Unknown(0x1234));
    }

    #[test]
    fn test_acmp_status_roundtrip() {
        assert_eq!(AcmpStatus::from(31), AcmpStatus::NotSupported);
        assert!(AcmpStatus::from(0).is_success());
        assert!(!AcmpStatus::from(1).is_success());
    }

    #[test]
    fn test_acmp_message_type_is_response() {
        assert!(AcmpMessageType::ConnectRxResponse.is_response());
        assert!(!AcmpMessageType::ConnectRxCommand.is_response());
    }
}
