//! This module defines the structure for a single log entry.
use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a log entry, which selects its line template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Trace,
    Info,
    Warning,
    Error,
    /// A bare message with no severity label.
    Simple,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Trace => "Trace",
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Simple => "Simple",
        };
        f.write_str(name)
    }
}

/// Represents a single logging call on its way from a producer to the writer.
///
/// Entries are immutable once built. `action` and `subject` are only carried
/// by warnings and errors; the other constructors leave them unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// The severity of the entry.
    pub severity: Severity,
    /// The message text. May be empty.
    pub message: String,
    /// The action that was being performed when the warning or error occurred.
    pub action: Option<String>,
    /// The object or resource the action was performed on.
    pub subject: Option<String>,
}

impl LogEntry {
    fn plain(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            action: None,
            subject: None,
        }
    }

    fn contextual(
        severity: Severity,
        message: impl Into<String>,
        action: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            action: Some(action.into()),
            subject: Some(subject.into()),
        }
    }

    pub fn simple(message: impl Into<String>) -> Self {
        Self::plain(Severity::Simple, message)
    }

    pub fn trace(message: impl Into<String>) -> Self {
        Self::plain(Severity::Trace, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::plain(Severity::Info, message)
    }

    /// Creates a warning entry.
    ///
    /// # Arguments
    ///
    /// * `message` - What went wrong.
    /// * `action` - The action that was being performed.
    /// * `subject` - The object the action was performed on.
    pub fn warning(
        message: impl Into<String>,
        action: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self::contextual(Severity::Warning, message, action, subject)
    }

    /// Creates an error entry. Takes the same arguments as [`LogEntry::warning`].
    pub fn error(
        message: impl Into<String>,
        action: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self::contextual(Severity::Error, message, action, subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_entries_carry_no_context() {
        for entry in [
            LogEntry::simple("a"),
            LogEntry::trace("b"),
            LogEntry::info("c"),
        ] {
            assert!(entry.action.is_none());
            assert!(entry.subject.is_none());
        }
        assert_eq!(LogEntry::trace("b").severity, Severity::Trace);
    }

    #[test]
    fn warnings_and_errors_keep_action_and_subject() {
        let entry = LogEntry::error("boom", "save", "record-42");
        assert_eq!(entry.severity, Severity::Error);
        assert_eq!(entry.action.as_deref(), Some("save"));
        assert_eq!(entry.subject.as_deref(), Some("record-42"));

        let entry = LogEntry::warning("", "", "");
        assert_eq!(entry.message, "");
        assert_eq!(entry.action.as_deref(), Some(""));
    }
}
