// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Logging output backends (console and file) for crate-internal diagnostics.
//!
//! This is distinct from the host-facing log sink in [`crate::notify`]: it is
//! the equivalent of a `RUST_LOG`-style internal trace, useful while
//! developing or debugging the controller itself, not the IEEE 1722.1
//! `{level, message, timestamp_ms}` event record the host subscribes to.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Mutex;

/// Internal trace level for crate-internal diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO ",
            Self::Warning => "WARN ",
            Self::Error => "ERROR",
        }
    }
}

/// Output destination trait for crate-internal log messages.
pub trait Output: Send + Sync {
    fn write(&self, level: LogLevel, message: &str) -> io::Result<()>;
    fn flush(&self) -> io::Result<()>;
}

/// Console output implementation. Writes to stderr with a level prefix.
pub struct ConsoleOutput {
    level_filter: LogLevel,
}

impl ConsoleOutput {
    #[must_use]
    pub fn new(level_filter: LogLevel) -> Self {
        Self { level_filter }
    }
}

impl Output for ConsoleOutput {
    fn write(&self, level: LogLevel, message: &str) -> io::Result<()> {
        if level < self.level_filter {
            return Ok(());
        }
        eprintln!("[{}] {}", level.as_str(), message);
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// File output implementation. Appends to a file, thread-safe via a mutex.
pub struct FileOutput {
    file: Mutex<std::fs::File>,
    level_filter: LogLevel,
}

impl FileOutput {
    /// # Errors
    /// Returns an error if the file cannot be created or truncated.
    pub fn new(path: &str, level_filter: LogLevel) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            level_filter,
        })
    }
}

impl Output for FileOutput {
    fn write(&self, level: LogLevel, message: &str) -> io::Result<()> {
        if level < self.level_filter {
            return Ok(());
        }
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("file output mutex poisoned"))?;
        writeln!(file, "[{}] {}", level.as_str(), message)
    }

    fn flush(&self) -> io::Result<()> {
        self.file
            .lock()
            .map_err(|_| io::Error::other("file output mutex poisoned"))?
            .flush()
    }
}
