//! Error types for registry operations
use thiserror::Error;

/// Boxed error type produced by resource open/close callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for registry operations.
///
/// Callback failures (`Open`, `Release`) carry the original error as a
/// `source` so the caller sees the full chain; the registry never retries
/// or suppresses them.
#[derive(Error, Debug)]
pub enum Error {
    /// The registry was already closed when an acquisition was attempted.
    ///
    /// Signals programmer misuse: using a context after its teardown
    /// boundary.
    #[error("registry is closed")]
    AlreadyClosed,

    /// No resource kind is registered under the requested name.
    #[error("unknown resource kind '{name}'")]
    UnknownKind {
        /// The requested kind name
        name: String,
    },

    /// A kind's open callback failed; nothing was recorded for release.
    #[error("open failed for resource kind '{name}'")]
    Open {
        /// The kind whose open callback failed
        name: String,
        /// The underlying error
        #[source]
        source: BoxError,
    },

    /// A release callback failed during [`Registry::close`](crate::Registry::close).
    ///
    /// Remaining release callbacks were not run (fail-fast); the registry
    /// is still marked closed.
    #[error("release failed for resource kind '{name}'")]
    Release {
        /// The kind whose close callback failed
        name: String,
        /// The underlying error
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Create an unknown-kind error.
    pub fn unknown_kind(name: impl Into<String>) -> Self {
        Self::UnknownKind { name: name.into() }
    }

    pub(crate) fn open(name: impl Into<String>, source: BoxError) -> Self {
        Self::Open {
            name: name.into(),
            source,
        }
    }

    pub(crate) fn release(name: impl Into<String>, source: BoxError) -> Self {
        Self::Release {
            name: name.into(),
            source,
        }
    }

    /// Get the resource kind name associated with this error (if any).
    #[must_use]
    pub fn kind_name(&self) -> Option<&str> {
        match self {
            Self::AlreadyClosed => None,
            Self::UnknownKind { name }
            | Self::Open { name, .. }
            | Self::Release { name, .. } => Some(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn already_closed_display() {
        assert_eq!(Error::AlreadyClosed.to_string(), "registry is closed");
    }

    #[test]
    fn unknown_kind_display() {
        let err = Error::unknown_kind("db");
        assert_eq!(err.to_string(), "unknown resource kind 'db'");
    }

    #[test]
    fn open_preserves_source() {
        let err = Error::open("db", "connection refused".into());
        assert_eq!(err.to_string(), "open failed for resource kind 'db'");
        assert_eq!(err.source().unwrap().to_string(), "connection refused");
    }

    #[test]
    fn release_preserves_source() {
        let err = Error::release("db", "flush failed".into());
        assert_eq!(err.to_string(), "release failed for resource kind 'db'");
        assert_eq!(err.source().unwrap().to_string(), "flush failed");
    }

    #[test]
    fn kind_name_accessor() {
        assert_eq!(Error::AlreadyClosed.kind_name(), None);
        assert_eq!(Error::unknown_kind("db").kind_name(), Some("db"));
        assert_eq!(Error::open("db", "x".into()).kind_name(), Some("db"));
        assert_eq!(Error::release("db", "x".into()).kind_name(), Some("db"));
    }
}
