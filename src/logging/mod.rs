// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-internal diagnostic logging.
//!
//! This is separate from the host-facing log sink (see [`crate::notify`]),
//! which delivers the IEEE 1722.1 `{level, message, timestamp_ms}` record the
//! embedder subscribes to. This module is the controller library talking to
//! *itself* — useful while developing or chasing a wire-level bug.
//!
//! Compiled only behind the `logging` feature; the macros below expand to
//! no-ops otherwise so there is zero runtime cost in a release embedder.

pub mod logger;
mod output;

pub use logger::{flush_logger, init_logger};
pub use output::{ConsoleOutput, FileOutput, LogLevel, Output};

#[macro_export]
#[cfg(feature = "logging")]
macro_rules! int_debug {
    ($($arg:tt)*) => {
        let _ = $crate::logging::logger::log_message(
            $crate::logging::LogLevel::Debug,
            &format!($($arg)*),
        );
    };
}

#[macro_export]
#[cfg(feature = "logging")]
macro_rules! int_warn {
    ($($arg:tt)*) => {
        let _ = $crate::logging::logger::log_message(
            $crate::logging::LogLevel::Warning,
            &format!($($arg)*),
        );
    };
}

#[macro_export]
#[cfg(feature = "logging")]
macro_rules! int_error {
    ($($arg:tt)*) => {
        let _ = $crate::logging::logger::log_message(
            $crate::logging::LogLevel::Error,
            &format!($($arg)*),
        );
    };
}

#[macro_export]
#[cfg(not(feature = "logging"))]
macro_rules! int_debug {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(not(feature = "logging"))]
macro_rules! int_warn {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(not(feature = "logging"))]
macro_rules! int_error {
    ($($arg:tt)*) => {};
}

#[cfg(all(test, feature = "logging"))]
mod tests {
    #[test]
    fn test_macros_compile() {
        int_debug!("debug message");
        int_warn!("warn message: {}", 42);
        int_error!("error message");
    }
}
