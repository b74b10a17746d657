//! Error types for the cache crate

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// The way a stored entry violates the backend's structural invariants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorruptionKind {
    /// The key directory holds a number of entries other than one
    UnexpectedEntryCount {
        /// Number of entries found
        count: usize,
    },
    /// The single entry under the key directory is itself a directory
    DirectoryInsteadOfFile {
        /// Name of the offending entry
        name: String,
    },
    /// The key path exists but is not a directory
    NotADirectory,
}

impl fmt::Display for CorruptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEntryCount { count } => {
                write!(f, "expected exactly 1 payload file, found {count}")
            }
            Self::DirectoryInsteadOfFile { name } => {
                write!(f, "directory instead of file: {name}")
            }
            Self::NotADirectory => write!(f, "key path is not a directory"),
        }
    }
}

/// Error type for cache operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error during cache operations
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(pagecast::cache::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "create")
        operation: String,
    },

    /// Configuration or validation error
    #[error("Cache configuration error: {message}")]
    #[diagnostic(code(pagecast::cache::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },

    /// No backend is registered under the requested name
    #[error("Unknown cache backend: {name}")]
    #[diagnostic(
        code(pagecast::cache::unknown_backend),
        help("Run `pagecast cache backends` to list the available backends")
    )]
    UnknownBackend {
        /// The requested backend name
        name: String,
    },

    /// Cache key not found
    #[error("Cache key not found: {key}")]
    #[diagnostic(
        code(pagecast::cache::not_found),
        help("The cache entry may have been invalidated or never existed")
    )]
    NotFound {
        /// The cache key that was not found
        key: String,
    },

    /// Stored state violates backend invariants
    #[error("Cache entry {key} is corrupted: {kind}")]
    #[diagnostic(
        code(pagecast::cache::corruption),
        help("Invalidate the entry or clear the cache to recover")
    )]
    Corruption {
        /// The affected cache key
        key: String,
        /// What is wrong with the stored representation
        kind: CorruptionKind,
    },

    /// Key cannot be used to address storage
    #[error("Invalid cache key: {key:?}")]
    #[diagnostic(code(pagecast::cache::invalid_key))]
    InvalidKey {
        /// The rejected key
        key: String,
    },

    /// Entry metadata cannot be stored
    #[error("Invalid cache entry: {message}")]
    #[diagnostic(code(pagecast::cache::invalid_entry))]
    InvalidEntry {
        /// Error message describing the problem
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create a not found error
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a corruption error
    #[must_use]
    pub fn corruption(key: impl Into<String>, kind: CorruptionKind) -> Self {
        Self::Corruption {
            key: key.into(),
            kind,
        }
    }

    /// Create an invalid entry error
    #[must_use]
    pub fn invalid_entry(msg: impl Into<String>) -> Self {
        Self::InvalidEntry {
            message: msg.into(),
        }
    }

    /// Whether this error is a plain cache miss
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this error reports corrupted stored state
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption { .. })
    }
}

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguishable() {
        let err = Error::not_found("abc");
        assert!(err.is_not_found());
        assert!(!err.is_corruption());
        assert_eq!(err.to_string(), "Cache key not found: abc");
    }

    #[test]
    fn test_corruption_messages() {
        let count = Error::corruption("k", CorruptionKind::UnexpectedEntryCount { count: 2 });
        assert!(count.is_corruption());
        assert!(count.to_string().contains("found 2"));

        let dir = Error::corruption(
            "k",
            CorruptionKind::DirectoryInsteadOfFile {
                name: "page.1.png".to_string(),
            },
        );
        assert!(dir.to_string().contains("directory instead of file"));
    }

    #[test]
    fn test_io_error_display_includes_path() {
        let err = Error::io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            "/tmp/cache",
            "write",
        );
        assert_eq!(err.to_string(), "I/O write failed: /tmp/cache");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_configuration_message() {
        let err = Error::configuration("cache name cannot be empty");
        assert_eq!(
            err.to_string(),
            "Cache configuration error: cache name cannot be empty"
        );
    }
}
