//! Rendering of log entries into file lines.
//!
//! Every line is `{ts}{body}` where `{ts}` is either empty or a bracketed
//! local timestamp followed by `" - "`, and `{body}` depends on the severity.
use crate::entry::{LogEntry, Severity};
use crate::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use std::fmt::Write;

/// `DD.MM.YYYY HH:mm:ss`
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Formats entries according to one logger's timestamp settings.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    write_timestamp: bool,
    timestamp_format: String,
}

impl LineFormatter {
    /// Creates a formatter.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidTimestampFormat`] if `timestamp_format`
    /// contains a specifier chrono cannot render.
    pub fn new(write_timestamp: bool, timestamp_format: impl Into<String>) -> Result<Self> {
        let timestamp_format = timestamp_format.into();
        if StrftimeItems::new(&timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(LoggerError::InvalidTimestampFormat {
                format: timestamp_format,
            });
        }
        Ok(Self {
            write_timestamp,
            timestamp_format,
        })
    }

    /// Formats an entry using the current local time.
    pub fn format(&self, entry: &LogEntry) -> String {
        self.format_at(entry, Local::now())
    }

    /// Formats an entry as if it were written at `now`.
    ///
    /// The output is a pure function of the entry and `now`.
    pub fn format_at(&self, entry: &LogEntry, now: DateTime<Local>) -> String {
        let mut line = self.prefix(now);
        // Writing into a String cannot fail.
        let _ = match entry.severity {
            Severity::Trace => write!(line, "Trace - {}", entry.message),
            Severity::Info => write!(line, "Info - {}", entry.message),
            Severity::Warning => write!(
                line,
                "* Warning * - {} (Action {} on {})",
                entry.message,
                context(&entry.action),
                context(&entry.subject)
            ),
            Severity::Error => write!(
                line,
                "*** Error *** - {} (Action {} on {})",
                entry.message,
                context(&entry.action),
                context(&entry.subject)
            ),
            Severity::Simple => write!(line, "{}", entry.message),
        };
        line
    }

    fn prefix(&self, now: DateTime<Local>) -> String {
        if !self.write_timestamp {
            return String::new();
        }
        format!("[{}] - ", now.format(&self.timestamp_format))
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self {
            write_timestamp: true,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

// Missing context renders as an empty placeholder.
fn context(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}
