//! Deterministic cache key derivation
//!
//! A cache key is the lowercase hex SHA-256 digest of a canonical request
//! string:
//!
//! ```text
//! <absolute document path>/<page>.<format>?<name>=<value>&<name>=<value>...
//! ```
//!
//! Parameters are emitted in the order they are added. The deriver never
//! sorts them, so two requests that differ only in parameter order produce
//! different keys. Callers fix the order themselves.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Length of a derived key in hex characters
pub const KEY_LEN: usize = 64;

/// Hash a canonical request string into a cache key
#[must_use]
pub fn derive_key(canonical: &str) -> String {
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)
}

/// Builder for canonical request strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    document: String,
    page: u32,
    format: String,
    params: Vec<(String, String)>,
}

impl CanonicalRequest {
    /// Start a request for one page of a document.
    ///
    /// `document` should already be absolute; it is used verbatim.
    #[must_use]
    pub fn new(document: &Path, page: u32, format: impl Into<String>) -> Self {
        Self {
            document: document.to_string_lossy().into_owned(),
            page,
            format: format.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Append a parameter only when a value is present
    #[must_use]
    pub fn optional_param<V: fmt::Display>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }

    /// Derive the cache key for this request
    #[must_use]
    pub fn key(&self) -> String {
        derive_key(&self.to_string())
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}?", self.document, self.page, self.format)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}
