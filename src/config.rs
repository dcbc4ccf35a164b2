//! Per-instance logger configuration.
use crate::format::DEFAULT_TIMESTAMP_FORMAT;
use crate::retry::WriteRetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What a bounded queue does when a producer submits into a full queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Block the producing thread until the writer frees a slot.
    Block,
    /// Evict the oldest queued entry to make room.
    DropOldest,
    /// Reject the new entry with `LoggerError::QueueFull`.
    DropNewest,
}

/// Capacity of the log queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueueMode {
    /// Producers never block and nothing is ever dropped.
    #[default]
    Unbounded,
    Bounded {
        capacity: usize,
        overflow: OverflowPolicy,
    },
}

/// Configuration for a single `FileLogger`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// The file every line is appended to.
    pub path: PathBuf,
    /// Prefix each line with `[<timestamp>] - `.
    pub write_timestamp: bool,
    /// Keep an existing file. When false the file is removed at construction.
    pub append: bool,
    /// chrono strftime pattern for the timestamp prefix.
    pub timestamp_format: String,
    pub queue: QueueMode,
    pub retry: WriteRetryPolicy,
}

impl LoggerConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn write_timestamp(mut self, enabled: bool) -> Self {
        self.write_timestamp = enabled;
        self
    }

    pub fn append(mut self, enabled: bool) -> Self {
        self.append = enabled;
        self
    }

    pub fn timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// Switches to a bounded queue. A capacity of zero is treated as one.
    pub fn bounded(mut self, capacity: usize, overflow: OverflowPolicy) -> Self {
        self.queue = QueueMode::Bounded {
            capacity: capacity.max(1),
            overflow,
        };
        self
    }

    pub fn retry(mut self, policy: WriteRetryPolicy) -> Self {
        self.retry = policy;
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            write_timestamp: true,
            append: true,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            queue: QueueMode::Unbounded,
            retry: WriteRetryPolicy::default(),
        }
    }
}
