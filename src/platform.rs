// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host-supplied platform interface.
//!
//! The controller never opens a socket, spawns a thread, or reads a clock
//! itself. Everything that touches the outside world crosses this trait,
//! supplied once at construction. `send_frame` must not block: the facade
//! calls it from whichever context called `tick()`/`on_rx_frame()`, and a
//! blocking call there would stall the host's network loop.

use std::fmt;

/// Transport error returned by [`PlatformInterface::send_frame`].
#[derive(Debug, Clone)]
pub struct SendError(pub String);

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SendError {}

/// Everything the controller needs from its host environment.
pub trait PlatformInterface: Send {
    /// This controller's own interface MAC, packed into the low 48 bits of a
    /// `u64` (see [`crate::codec::bytes::eui48_to_u64`]). Read once at
    /// construction to derive the controller's entity-id.
    fn mac_addr(&self) -> u64;

    /// Place a fully-formed Ethernet frame on the wire. Must not block; a
    /// platform backed by a bounded ring or non-blocking socket should drop
    /// and return an error rather than wait.
    ///
    /// # Errors
    /// Any transport-level failure; the facade logs it and does not retry
    /// beyond the protocol's own single-retry semantics.
    fn send_frame(&self, frame: &[u8]) -> Result<(), SendError>;
}
