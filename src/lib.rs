//! An asynchronous, single-writer file logger.
//!
//! Producers on any thread submit entries through a [`FileLogger`] or a
//! cloned [`LogHandle`]. Submitting only enqueues; one background task per
//! logger dequeues the entries in order, formats them by severity, and appends
//! each line to the target file.
//!
//! ```no_run
//! use mtfile_logger::{FileLogger, LogWrite};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mtfile_logger::LoggerError> {
//!     let logger = FileLogger::new("app.log", false, true)?;
//!     logger.write_info("start")?;
//!     logger.write_error("boom", "save", "record-42")?;
//!     logger.write_line("done")?;
//!     logger.shutdown().await?;
//!     Ok(())
//! }
//! ```
pub mod config;
pub mod entry;
pub mod error;
pub mod format;
pub mod logger;
mod queue;
pub mod retry;
mod writer;

pub use config::{LoggerConfig, OverflowPolicy, QueueMode};
pub use entry::{LogEntry, Severity};
pub use error::{LoggerError, Result, WriteFailure};
pub use format::{LineFormatter, DEFAULT_TIMESTAMP_FORMAT};
pub use logger::{FileLogger, LogHandle, LogWrite};
pub use retry::WriteRetryPolicy;
pub use writer::WriterReport;
