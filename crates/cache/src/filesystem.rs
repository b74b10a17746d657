//! Filesystem cache backend
//!
//! Layout: `<root>/<key>/<filename>`, one directory per key holding exactly
//! one payload file. Anything else found under a key directory is reported
//! as corruption rather than repaired.

use crate::storage::{validate_entry, validate_key};
use crate::{BackendConfig, CacheEntry, CorruptionKind, Error, LogConfig, Result, Storage};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Typed options for the filesystem backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemOptions {
    /// Root directory of the cache
    pub directory: PathBuf,
}

impl FilesystemOptions {
    const DIRECTORY: &'static str = "directory";

    /// Parse and validate raw backend options
    pub fn parse(options: &Map<String, Value>) -> Result<Self> {
        if let Some(unknown) = options.keys().find(|k| k.as_str() != Self::DIRECTORY) {
            return Err(Error::configuration(format!(
                "unknown filesystem cache option '{unknown}'"
            )));
        }

        match options.get(Self::DIRECTORY) {
            None => Err(Error::configuration(
                "filesystem cache requires a 'directory' option",
            )),
            Some(Value::String(dir)) if dir.trim().is_empty() => Err(Error::configuration(
                "filesystem cache 'directory' option cannot be empty",
            )),
            Some(Value::String(dir)) => Ok(Self {
                directory: PathBuf::from(dir),
            }),
            Some(other) => Err(Error::configuration(format!(
                "filesystem cache 'directory' option must be a string, got {}",
                json_type_name(other)
            ))),
        }
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Cache backend storing one directory per key
#[derive(Debug, Clone)]
pub struct FilesystemStorage {
    root: PathBuf,
    logging: LogConfig,
}

impl FilesystemStorage {
    /// Name the backend is registered under
    pub const NAME: &'static str = "filesystem";

    /// Open (creating if needed) a cache rooted at `directory`
    pub fn new(directory: impl AsRef<Path>, logging: LogConfig) -> Result<Self> {
        let directory = directory.as_ref();
        let root = std::path::absolute(directory)
            .map_err(|e| Error::io(e, directory, "resolve absolute path"))?;
        fs::create_dir_all(&root).map_err(|e| Error::io(e, &root, "create_dir_all"))?;

        tracing::debug!(root = %root.display(), "Opened filesystem cache");
        Ok(Self { root, logging })
    }

    /// Construct from a backend configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let options = FilesystemOptions::parse(&config.options)?;
        Self::new(options.directory, config.logging.clone())
    }

    /// Absolute root directory of the cache
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of all key directories, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(e, &self.root, "read_dir")),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(e, &self.root, "read_dir"))?;
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                keys.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn key_dir(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn trace(&self, operation: &str, key: &str) {
        if self.logging.trace_operations {
            tracing::debug!(backend = Self::NAME, operation, key, "Cache operation");
        }
    }
}

impl Storage for FilesystemStorage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn get(&self, key: &str) -> Result<CacheEntry> {
        validate_key(key)?;
        self.trace("get", key);
        let dir = self.key_dir(key);

        let metadata = match fs::symlink_metadata(&dir) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::not_found(key)),
            Err(e) => return Err(Error::io(e, &dir, "stat")),
        };
        if !metadata.is_dir() {
            return Err(Error::corruption(key, CorruptionKind::NotADirectory));
        }

        let mut entries = match fs::read_dir(&dir) {
            // Invalidated between the stat and the listing
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::not_found(key)),
            Err(e) => return Err(Error::io(e, &dir, "read_dir")),
            Ok(listing) => listing
                .collect::<std::io::Result<Vec<_>>>()
                .map_err(|e| Error::io(e, &dir, "read_dir"))?,
        };

        // An empty key directory counts as corruption, not a miss
        if entries.len() != 1 {
            return Err(Error::corruption(
                key,
                CorruptionKind::UnexpectedEntryCount {
                    count: entries.len(),
                },
            ));
        }

        let Some(payload) = entries.pop() else {
            return Err(Error::corruption(
                key,
                CorruptionKind::UnexpectedEntryCount { count: 0 },
            ));
        };
        let path = payload.path();
        let filename = payload.file_name().to_string_lossy().into_owned();
        let file_type = payload
            .file_type()
            .map_err(|e| Error::io(e, &path, "stat"))?;
        if file_type.is_dir() {
            return Err(Error::corruption(
                key,
                CorruptionKind::DirectoryInsteadOfFile { name: filename },
            ));
        }

        let data = fs::read(&path).map_err(|e| Error::io(e, &path, "read"))?;
        Ok(CacheEntry {
            key: key.to_string(),
            data,
            filename,
        })
    }

    fn set(&self, entry: &CacheEntry) -> Result<()> {
        validate_entry(entry)?;
        self.trace("set", &entry.key);
        let dir = self.key_dir(&entry.key);
        fs::create_dir_all(&dir).map_err(|e| Error::io(e, &dir, "create_dir_all"))?;

        let path = dir.join(&entry.filename);
        fs::write(&path, &entry.data).map_err(|e| Error::io(e, &path, "write"))?;

        remove_stale_payloads(&dir, &entry.filename)
    }

    fn invalidate(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.trace("invalidate", key);
        let dir = self.key_dir(key);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(e, &dir, "remove_dir_all")),
        }
    }

    fn clear(&self) -> Result<()> {
        self.trace("clear", "*");
        clear_entries(&self.root, |path| fs::remove_dir_all(path))
    }
}

/// Remove every key directory under `root` with `remove`.
///
/// Entries that cannot be read or removed are logged and left in place.
fn clear_entries(root: &Path, remove: impl Fn(&Path) -> io::Result<()>) -> Result<()> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(e, root, "read_dir")),
    };

    let mut removed = 0usize;
    let mut failed = 0usize;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "Failed to read cache entry; skipping");
                failed += 1;
                continue;
            }
        };
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }

        let path = entry.path();
        match remove(&path) {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove cache entry; skipping");
                failed += 1;
            }
        }
    }

    tracing::debug!(root = %root.display(), removed, failed, "Cleared filesystem cache");
    Ok(())
}

/// Remove payloads left behind by an earlier `set` under another filename
fn remove_stale_payloads(dir: &Path, keep: &str) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(e, dir, "read_dir"))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(e, dir, "read_dir"))?;
        if entry.file_name() == keep {
            continue;
        }
        let path = entry.path();
        let is_dir = entry
            .file_type()
            .map_err(|e| Error::io(e, &path, "stat"))?
            .is_dir();
        let removed = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| Error::io(e, &path, "remove"))?;
    }
    Ok(())
}
