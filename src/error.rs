/// Error types for the mimetype library
use std::fmt;

/// Result type alias for type resolution operations
pub type Result<T> = std::result::Result<T, MimeError>;

/// Main error type for type resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeError {
    /// A backing signature table or glob file is missing, unreadable, or
    /// corrupt beyond recovery
    DatabaseUnavailable(String),

    /// The stream or path to classify could not be opened or read at all
    StreamUnreadable(String),

    /// Glob pattern could not be compiled
    InvalidPattern(String),

    /// Configuration is inconsistent (e.g. a file-backed adapter without a file)
    InvalidConfig(String),
}

impl fmt::Display for MimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MimeError::DatabaseUnavailable(msg) => write!(f, "Database unavailable: {}", msg),
            MimeError::StreamUnreadable(msg) => write!(f, "Stream unreadable: {}", msg),
            MimeError::InvalidPattern(msg) => write!(f, "Invalid pattern: {}", msg),
            MimeError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for MimeError {}

impl From<std::io::Error> for MimeError {
    fn from(err: std::io::Error) -> Self {
        MimeError::StreamUnreadable(err.to_string())
    }
}

/// A single database line or record that failed to parse.
///
/// Parsers skip the entry and continue; the condition is logged and counted
/// but never handed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MalformedEntry {
    /// 1-based line number (or byte offset for binary databases)
    pub position: usize,
    /// Why the entry was rejected
    pub reason: String,
}

impl MalformedEntry {
    pub(crate) fn new(position: usize, reason: impl Into<String>) -> Self {
        Self {
            position,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for MalformedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry {}: {}", self.position, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = MimeError::DatabaseUnavailable("/nope/magic".to_string());
        assert_eq!(err.to_string(), "Database unavailable: /nope/magic");

        let entry = MalformedEntry::new(7, "missing pattern");
        assert_eq!(entry.to_string(), "entry 7: missing pattern");
    }

    #[test]
    fn test_io_error_is_stream_unreadable() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(MimeError::from(io), MimeError::StreamUnreadable(_)));
    }
}
