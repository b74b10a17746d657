//! Backend registry
//!
//! Maps backend names to constructors so a backend can be selected by
//! configuration at runtime. Backends are registered explicitly during
//! startup (see [`BackendRegistry::with_builtin_backends`]); nothing
//! registers itself as a side effect of linking a module.

use crate::filesystem::FilesystemStorage;
use crate::{BackendConfig, Error, Result, Storage};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Constructor for a backend
pub type Constructor = Arc<dyn Fn(&BackendConfig) -> Result<Arc<dyn Storage>> + Send + Sync>;

/// Registry of cache backend constructors
///
/// Lookups and listing take a shared lock; registration takes the lock
/// exclusively.
#[derive(Default)]
pub struct BackendRegistry {
    constructors: RwLock<HashMap<String, Constructor>>,
}

impl BackendRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in backend registered
    #[must_use]
    pub fn with_builtin_backends() -> Self {
        let registry = Self::new();
        registry.register(FilesystemStorage::NAME, |config| {
            let storage = FilesystemStorage::from_config(config)?;
            Ok(Arc::new(storage) as Arc<dyn Storage>)
        });
        registry
    }

    /// Register a backend constructor.
    ///
    /// Re-registering a name replaces the previous constructor.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty. Registration happens while wiring up the
    /// process and must never be driven by user input.
    pub fn register<F>(&self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&BackendConfig) -> Result<Arc<dyn Storage>> + Send + Sync + 'static,
    {
        let name = name.into();
        assert!(!name.is_empty(), "cache backend name cannot be empty");

        let replaced = self
            .constructors
            .write()
            .insert(name.clone(), Arc::new(constructor))
            .is_some();
        tracing::debug!(backend = %name, replaced, "Registered cache backend");
    }

    /// Construct the backend selected by `config`
    pub fn create(&self, config: &BackendConfig) -> Result<Arc<dyn Storage>> {
        if config.name.is_empty() {
            return Err(Error::configuration("cache name cannot be empty"));
        }

        // Clone the constructor out so it runs without holding the lock
        let constructor = self
            .constructors
            .read()
            .get(&config.name)
            .cloned()
            .ok_or_else(|| Error::UnknownBackend {
                name: config.name.clone(),
            })?;

        let storage = constructor(config)?;
        tracing::debug!(backend = %config.name, "Created cache backend");
        Ok(storage)
    }

    /// Registered backend names in lexicographic order
    #[must_use]
    pub fn list_backends(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a backend is registered under `name`
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.constructors.read().contains_key(name)
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.list_backends())
            .finish()
    }
}
