//! This module defines the `LogHandle`, the producer-side API for submitting
//! entries to a running `FileLogger` from any thread.
use crate::entry::LogEntry;
use crate::error::Result;
use crate::queue::LogQueue;
use std::sync::Arc;

/// The logging operations shared by `FileLogger` and `LogHandle`.
///
/// Every method only enqueues and returns immediately (unless a bounded queue
/// with `OverflowPolicy::Block` is full).
pub trait LogWrite {
    /// Submits a prepared entry.
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::Closed` after the logger has been closed, and
    /// `LoggerError::QueueFull` when a bounded queue rejects the entry.
    fn submit(&self, entry: LogEntry) -> Result<()>;

    /// Writes `message` with no severity label.
    fn write_line(&self, message: &str) -> Result<()> {
        self.submit(LogEntry::simple(message))
    }

    fn write_trace(&self, message: &str) -> Result<()> {
        self.submit(LogEntry::trace(message))
    }

    fn write_info(&self, message: &str) -> Result<()> {
        self.submit(LogEntry::info(message))
    }

    /// Writes a warning about `action` performed on `subject`.
    fn write_warning(&self, message: &str, action: &str, subject: &str) -> Result<()> {
        self.submit(LogEntry::warning(message, action, subject))
    }

    /// Writes an error about `action` performed on `subject`.
    fn write_error(&self, message: &str, action: &str, subject: &str) -> Result<()> {
        self.submit(LogEntry::error(message, action, subject))
    }
}

/// A handle for submitting entries to a `FileLogger`.
///
/// Handles are cheap to clone and can be moved to other threads. Dropping a
/// handle never closes the logger; once the owning `FileLogger` is closed or
/// dropped, every write through a handle fails with `LoggerError::Closed`.
#[derive(Clone)]
pub struct LogHandle {
    pub(super) queue: Arc<LogQueue>,
}

impl LogHandle {
    /// Number of entries accepted but not yet written.
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

impl LogWrite for LogHandle {
    fn submit(&self, entry: LogEntry) -> Result<()> {
        self.queue.enqueue(entry)
    }
}
