//! Error types for the logger.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while constructing a logger, submitting entries, or
/// appending them to the target file.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid log file path '{}'", .path.display())]
    InvalidPath { path: PathBuf },

    #[error("failed to remove existing log file '{}': {source}", .path.display())]
    Truncate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid timestamp format '{format}'")]
    InvalidTimestampFormat { format: String },

    #[error("logger must be created inside a Tokio runtime")]
    NoRuntime,

    #[error("logger closed")]
    Closed,

    #[error("log queue full, entry dropped")]
    QueueFull,

    #[error("failed to append to log file '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("log writer task terminated abnormally")]
    WriterPanicked,
}

pub type Result<T> = std::result::Result<T, LoggerError>;

/// A line the writer could not append, reported back to the logger's owner.
#[derive(Debug)]
pub struct WriteFailure {
    /// The fully formatted line that was lost.
    pub line: String,
    /// The error from the last append attempt.
    pub error: LoggerError,
}
