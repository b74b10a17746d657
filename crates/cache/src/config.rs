//! Backend selection and options

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Logging behaviour handed to a backend at construction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Emit a debug event for every storage operation
    #[serde(default)]
    pub trace_operations: bool,
}

/// Selects a registered backend and carries its options.
///
/// `options` is opaque here; the selected backend parses and validates it
/// when it is constructed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Registered backend name
    pub name: String,
    /// Backend-specific options
    #[serde(default)]
    pub options: Map<String, Value>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LogConfig,
}

impl BackendConfig {
    /// Create a config for the named backend with no options
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Map::new(),
            logging: LogConfig::default(),
        }
    }

    /// Set a backend option
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Replace the logging configuration
    #[must_use]
    pub fn with_logging(mut self, logging: LogConfig) -> Self {
        self.logging = logging;
        self
    }
}
