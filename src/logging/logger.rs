// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global crate-internal logger instance and initialization.

use super::output::{LogLevel, Output};
use std::io;
use std::sync::{Arc, Mutex, OnceLock};

static LOGGER: OnceLock<Arc<Mutex<GlobalLogger>>> = OnceLock::new();

struct GlobalLogger {
    output: Option<Arc<dyn Output>>,
}

impl GlobalLogger {
    fn new() -> Self {
        Self { output: None }
    }

    fn log(&self, level: LogLevel, message: &str) -> io::Result<()> {
        if let Some(ref output) = self.output {
            output.write(level, message)?;
        }
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        if let Some(ref output) = self.output {
            output.flush()?;
        }
        Ok(())
    }
}

/// Initialize the global internal logger. Subsequent calls are ignored.
pub fn init_logger(output: Arc<dyn Output>) {
    let _ = LOGGER.get_or_init(|| {
        let mut logger = GlobalLogger::new();
        logger.output = Some(output);
        Arc::new(Mutex::new(logger))
    });
}

#[inline]
fn get_logger() -> Option<Arc<Mutex<GlobalLogger>>> {
    LOGGER.get().cloned()
}

#[inline]
pub(crate) fn log_message(level: LogLevel, message: &str) -> io::Result<()> {
    match get_logger() {
        Some(logger) => {
            let guard = logger
                .lock()
                .map_err(|_| io::Error::other("internal logger mutex poisoned"))?;
            guard.log(level, message)
        }
        None => Ok(()),
    }
}

/// Flush the internal logger's output. Safe to call if never initialized.
pub fn flush_logger() -> io::Result<()> {
    match get_logger() {
        Some(logger) => {
            let guard = logger
                .lock()
                .map_err(|_| io::Error::other("internal logger mutex poisoned"))?;
            guard.flush()
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::output::ConsoleOutput;

    #[test]
    fn test_log_message_noop_uninitialized() {
        assert!(log_message(LogLevel::Info, "no logger yet").is_ok());
    }

    #[test]
    fn test_init_and_log() {
        let console = Arc::new(ConsoleOutput::new(LogLevel::Debug));
        init_logger(console);
        assert!(log_message(LogLevel::Debug, "test debug").is_ok());
        assert!(flush_logger().is_ok());
    }
}
