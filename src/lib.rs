// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! An IEEE 1722.1 (AVDECC) controller library: discovers AVB/TSN end
//! stations over ADP, enumerates their descriptor trees and issues commands
//! over AECP, and manages talker/listener stream connections over ACMP.
//!
//! [`Controller`] is the crate's single entry point. An embedder supplies a
//! [`PlatformInterface`] (the raw-Ethernet send path plus the controller's
//! own MAC address), feeds every received AVTP-EtherType frame to
//! [`Controller::on_rx_frame`], calls [`Controller::tick`] on a steady
//! period (see [`config::RECOMMENDED_TICK_PERIOD`]), and drains
//! [`Controller::poll_notification`]/[`Controller::poll_acmp_notification`]/
//! [`Controller::poll_log`] for everything that happened in between. No
//! thread is ever spawned by this crate; all three entry points run on
//! whatever thread the host's network loop uses.

pub mod codec;
pub mod config;
mod enumeration;
pub mod error;
mod facade;
mod inflight;
pub mod logging;
pub mod machines;
pub mod model;
mod notify;
mod operation;
pub mod platform;

pub use config::ControllerConfig;
pub use facade::Controller;
pub use notify::{AcmpNotificationEvent, HostLogLevel, LogEvent, NotificationEvent, UNSOLICITED_NOTIFICATION_ID};
pub use operation::{Operation, OPERATION_ABORTED, OPERATION_COMPLETE};
pub use platform::{PlatformInterface, SendError};
