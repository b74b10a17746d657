//! Storage contract shared by every cache backend

use crate::{Error, Result};
use std::fmt;

/// A cached payload and the metadata needed to re-serve it
#[derive(Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Content-derived cache key
    pub key: String,
    /// Raw payload bytes
    pub data: Vec<u8>,
    /// Suggested file name for the payload (`<basename>.<page>.<extension>`)
    pub filename: String,
}

impl CacheEntry {
    /// Create a new entry
    #[must_use]
    pub fn new(key: impl Into<String>, data: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data,
            filename: filename.into(),
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("data_len", &self.data.len())
            .field("filename", &self.filename)
            .finish()
    }
}

/// Operations every cache backend provides.
///
/// Implementations must tolerate concurrent calls on distinct keys. Calls on
/// the same key are not ordered: the last `set` to finish wins and a
/// concurrent `get` may observe a partially written payload.
pub trait Storage: Send + Sync + fmt::Debug {
    /// Name the backend is registered under
    fn name(&self) -> &'static str;

    /// Fetch the entry stored under `key`.
    ///
    /// Returns [`Error::NotFound`] on a miss and [`Error::Corruption`] when
    /// the stored state violates the backend's invariants.
    fn get(&self, key: &str) -> Result<CacheEntry>;

    /// Store `entry`, replacing any entry already stored under its key
    fn set(&self, entry: &CacheEntry) -> Result<()>;

    /// Remove the entry under `key`. Removing an absent key succeeds.
    fn invalidate(&self, key: &str) -> Result<()>;

    /// Remove every entry.
    ///
    /// Best effort: entries that cannot be removed are logged and skipped,
    /// and their failure is not reported to the caller.
    fn clear(&self) -> Result<()>;
}

/// Check that a key can address storage as a single path segment
pub fn validate_key(key: &str) -> Result<()> {
    if is_single_segment(key) {
        Ok(())
    } else {
        Err(Error::InvalidKey {
            key: key.to_string(),
        })
    }
}

/// Check that an entry can be stored
pub fn validate_entry(entry: &CacheEntry) -> Result<()> {
    validate_key(&entry.key)?;
    if !is_single_segment(&entry.filename) {
        return Err(Error::invalid_entry(format!(
            "filename {:?} must be a plain file name",
            entry.filename
        )));
    }
    Ok(())
}

fn is_single_segment(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\', '\0'])
}
