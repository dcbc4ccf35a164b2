//! This module contains the `FileLogger`, the owner of one target file, its
//! queue, and its writer task.
pub mod handle;

pub use handle::{LogHandle, LogWrite};

use crate::config::LoggerConfig;
use crate::entry::LogEntry;
use crate::error::{LoggerError, Result, WriteFailure};
use crate::format::LineFormatter;
use crate::queue::LogQueue;
use crate::writer::{FailureReporter, LogWriter, WriterReport};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// An asynchronous, single-writer file logger.
///
/// Log calls enqueue an entry and return immediately; a background task owned
/// by the logger formats each entry and appends it to the target file in
/// submission order. Dropping the logger closes the queue for input, after
/// which the writer drains what is left and stops. Use [`FileLogger::shutdown`]
/// to wait for that to happen.
pub struct FileLogger {
    handle: LogHandle,
    path: PathBuf,
    writer: Option<JoinHandle<WriterReport>>,
    shutdown: CancellationToken,
    failures: Arc<FailureReporter>,
    failures_taken: bool,
}

impl FileLogger {
    /// Creates a logger for `path` and starts its writer task.
    ///
    /// # Arguments
    ///
    /// * `path` - The file every line is appended to.
    /// * `write_timestamp` - Prefix each line with the current local time.
    /// * `append` - Keep existing content. When false the file is removed first.
    ///
    /// # Errors
    ///
    /// See [`FileLogger::with_config`].
    pub fn new(path: impl AsRef<Path>, write_timestamp: bool, append: bool) -> Result<Self> {
        Self::with_config(
            LoggerConfig::new(path)
                .write_timestamp(write_timestamp)
                .append(append),
        )
    }

    /// Creates a logger that timestamps lines and appends to an existing file.
    ///
    /// # Errors
    ///
    /// See [`FileLogger::with_config`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(LoggerConfig::new(path))
    }

    /// Creates a logger from a full configuration and starts its writer task.
    ///
    /// Must be called from within a Tokio runtime; the writer is spawned onto it.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * the path is empty or names a directory,
    /// * the timestamp format is invalid,
    /// * there is no current Tokio runtime,
    /// * `append` is false and the existing file cannot be removed.
    pub fn with_config(config: LoggerConfig) -> Result<Self> {
        let LoggerConfig {
            path,
            write_timestamp,
            append,
            timestamp_format,
            queue,
            retry,
        } = config;

        if path.as_os_str().is_empty() || path.is_dir() {
            return Err(LoggerError::InvalidPath { path });
        }
        let formatter = LineFormatter::new(write_timestamp, timestamp_format)?;
        let runtime = Handle::try_current().map_err(|_| LoggerError::NoRuntime)?;

        if !append {
            remove_existing(&path)?;
        }

        let queue = Arc::new(LogQueue::new(queue));
        let failures = Arc::new(FailureReporter::default());
        let shutdown = CancellationToken::new();

        let writer = LogWriter {
            path: path.clone(),
            queue: Arc::clone(&queue),
            formatter,
            retry,
            failures: Arc::clone(&failures),
            shutdown: shutdown.clone(),
        };
        let writer = runtime.spawn(writer.run());
        debug!("Created file logger for {}", path.display());

        Ok(Self {
            handle: LogHandle { queue },
            path,
            writer: Some(writer),
            shutdown,
            failures,
            failures_taken: false,
        })
    }

    /// Returns a cloneable producer handle for this logger.
    pub fn handle(&self) -> LogHandle {
        self.handle.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries accepted but not yet written.
    pub fn pending(&self) -> usize {
        self.handle.queue.pending()
    }

    /// Entries discarded by a bounded queue's overflow policy.
    pub fn dropped(&self) -> u64 {
        self.handle.queue.dropped()
    }

    pub fn is_closed(&self) -> bool {
        self.handle.queue.is_closed()
    }

    /// Starts reporting write failures on a channel and returns its receiver.
    ///
    /// Only failures that happen after this call are sent; until then the
    /// writer keeps just the latest message for [`FileLogger::last_error`].
    /// Returns `None` if the receiver has already been taken.
    pub fn take_failures(&mut self) -> Option<mpsc::UnboundedReceiver<WriteFailure>> {
        if self.failures_taken {
            return None;
        }
        self.failures_taken = true;
        Some(self.failures.subscribe())
    }

    /// The message of the most recent write failure, if any.
    pub fn last_error(&self) -> Option<String> {
        self.failures.last_error()
    }

    /// Waits until every entry accepted so far has been written or reported.
    pub async fn flush(&self) {
        self.handle.queue.wait_idle().await;
    }

    /// Stops accepting new entries. The writer drains what is queued and stops.
    pub fn close(&self) {
        self.handle.queue.close_for_input();
    }

    /// Stops the writer as soon as the line it is writing is done. Queued
    /// entries are discarded and the logger is closed.
    pub fn cancel(&self) {
        self.shutdown.cancel();
        self.handle.queue.close_for_input();
    }

    /// Closes the logger and waits for the writer to drain the queue.
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::WriterPanicked` if the writer task did not finish
    /// normally.
    pub async fn shutdown(mut self) -> Result<WriterReport> {
        self.close();
        match self.writer.take() {
            Some(writer) => writer.await.map_err(|_| LoggerError::WriterPanicked),
            None => Ok(WriterReport::default()),
        }
    }
}

impl LogWrite for FileLogger {
    fn submit(&self, entry: LogEntry) -> Result<()> {
        self.handle.submit(entry)
    }
}

impl Drop for FileLogger {
    fn drop(&mut self) {
        self.close();
    }
}

fn remove_existing(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(LoggerError::Truncate {
            path: path.to_path_buf(),
            source,
        }),
    }
}
