//! Error types for rendering and the cache-aware render path

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Failures of the external rendering collaborators
#[derive(Error, Debug, Diagnostic)]
pub enum RenderError {
    /// Render configuration is out of range
    #[error("Invalid render configuration: {message}")]
    #[diagnostic(code(pagecast::render::config))]
    InvalidConfig {
        /// Error message describing the invalid setting
        message: String,
    },

    /// External program could not be started
    #[error("Failed to start '{program}'")]
    #[diagnostic(
        code(pagecast::render::spawn),
        help("Ensure the program is installed and on PATH, or configure its location")
    )]
    Spawn {
        /// Program that failed to start
        program: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// External program exited unsuccessfully
    #[error("'{program}' failed ({status}): {stderr}")]
    #[diagnostic(code(pagecast::render::command))]
    CommandFailed {
        /// Program that failed
        program: String,
        /// Exit status description
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// External program succeeded but produced no output file
    #[error("Renderer produced no output at {}", path.display())]
    #[diagnostic(code(pagecast::render::missing_output))]
    MissingOutput {
        /// Expected output location
        path: Box<Path>,
    },

    /// Page count could not be determined
    #[error("Could not determine page count: {message}")]
    #[diagnostic(code(pagecast::render::page_count))]
    PageCount {
        /// Error message describing the problem
        message: String,
    },
}

impl RenderError {
    /// Create an invalid configuration error
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a page count error
    #[must_use]
    pub fn page_count(message: impl Into<String>) -> Self {
        Self::PageCount {
            message: message.into(),
        }
    }
}

/// Failure of a cache-aware render request, tagged with the failing stage
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Render configuration was rejected before any work started
    #[error("Invalid render request")]
    #[diagnostic(code(pagecast::request::config))]
    Config {
        /// The validation failure
        #[source]
        source: RenderError,
    },

    /// Cache key could not be derived
    #[error("Failed to derive cache key for {}", path.display())]
    #[diagnostic(code(pagecast::request::key))]
    KeyDerivation {
        /// Document whose path could not be resolved
        path: Box<Path>,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Cache lookup failed with something other than a miss
    #[error("Cache read failed")]
    #[diagnostic(code(pagecast::request::storage_read))]
    StorageRead {
        /// The storage error
        #[source]
        source: pagecast_cache::Error,
    },

    /// The renderer failed
    #[error("Rendering page {page} failed")]
    #[diagnostic(code(pagecast::request::render))]
    Render {
        /// Page being rendered
        page: u32,
        /// The render error
        #[source]
        source: RenderError,
    },

    /// Scratch space or rendered output could not be accessed
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(pagecast::request::io),
        help("Check file permissions and available disk space")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed
        operation: String,
    },

    /// Rendered page could not be stored in the cache
    #[error("Cache write failed")]
    #[diagnostic(code(pagecast::request::storage_write))]
    StorageWrite {
        /// The storage error
        #[source]
        source: pagecast_cache::Error,
    },
}

impl Error {
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

    /// Create an I/O error without path context
    #[must_use]
    pub fn io_no_path(source: std::io::Error, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: None,
            operation: operation.into(),
        }
    }
}

/// Result type for cache-aware render requests
pub type Result<T> = std::result::Result<T, Error>;
