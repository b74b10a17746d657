//! Pluggable content-addressed cache for rendered pages
//!
//! This crate provides the caching infrastructure behind pagecast:
//! - Deterministic cache key derivation from a canonical request string
//! - A [`Storage`] contract every backend implements
//! - A [`BackendRegistry`] that constructs backends by name at runtime
//! - A filesystem backend storing one directory per key
//!
//! # Cache Key Derivation
//!
//! Keys are the lowercase hex SHA-256 of:
//! - The absolute source document path
//! - The page number and output format
//! - Rendering parameters, in a caller-fixed order
//!
//! # Example
//!
//! ```ignore
//! use pagecast_cache::{BackendConfig, BackendRegistry, CacheEntry};
//!
//! let registry = BackendRegistry::with_builtin_backends();
//! let storage = registry.create(
//!     &BackendConfig::new("filesystem").with_option("directory", ".pagecast-cache"),
//! )?;
//! storage.set(&CacheEntry::new(key, bytes, "report.1.png"))?;
//! ```

mod config;
mod error;
pub mod filesystem;
pub mod key;
pub mod registry;
mod storage;

// Re-export error types at crate root
pub use error::{CorruptionKind, Error, Result};

// Re-export main types
pub use config::{BackendConfig, LogConfig};
pub use filesystem::{FilesystemOptions, FilesystemStorage};
pub use key::{CanonicalRequest, KEY_LEN, derive_key};
pub use registry::{BackendRegistry, Constructor};
pub use storage::{CacheEntry, Storage, validate_entry, validate_key};
