//! `pagecast.toml` configuration file

use crate::cli::CliError;
use pagecast_cache::{BackendConfig, FilesystemStorage, LogConfig};
use pagecast_render::{MagickRenderer, PdfinfoPageCounter, RenderConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "pagecast.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Default render settings
    pub render: RenderConfig,
    /// Cache backend selection
    pub cache: CacheSection,
    /// External programs
    pub renderer: RendererSection,
}

/// `[cache]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSection {
    /// Whether rendered pages are cached at all
    pub enabled: bool,
    /// Registered backend name
    pub name: String,
    /// Backend-specific options
    pub options: Map<String, Value>,
    /// Backend logging
    pub logging: LogConfig,
}

impl Default for CacheSection {
    fn default() -> Self {
        let mut options = Map::new();
        options.insert(
            "directory".to_string(),
            Value::String(default_cache_dir().to_string_lossy().into_owned()),
        );
        Self {
            enabled: true,
            name: FilesystemStorage::NAME.to_string(),
            options,
            logging: LogConfig::default(),
        }
    }
}

impl CacheSection {
    /// Backend configuration, with `directory` overridden when given
    #[must_use]
    pub fn backend_config(&self, directory: Option<&Path>) -> BackendConfig {
        let mut config = BackendConfig {
            name: self.name.clone(),
            options: self.options.clone(),
            logging: self.logging.clone(),
        };
        if let Some(dir) = directory {
            config = config.with_option("directory", dir.to_string_lossy().into_owned());
        }
        config
    }
}

/// `[renderer]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererSection {
    /// Rasterizer executable
    pub program: String,
    /// Page counting executable
    pub pdfinfo: String,
}

impl Default for RendererSection {
    fn default() -> Self {
        Self {
            program: MagickRenderer::DEFAULT_PROGRAM.to_string(),
            pdfinfo: PdfinfoPageCounter::DEFAULT_PROGRAM.to_string(),
        }
    }
}

/// Default cache location: the platform cache directory, or the system
/// temp directory when there is none
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pagecast")
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        toml::from_str(content).map_err(|e| {
            CliError::config_with_help(
                format!("Invalid configuration: {e}"),
                "See the [render], [cache] and [renderer] sections in the documentation",
            )
        })
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `pagecast.toml` in the
    /// working directory is used if present, and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    tracing::debug!("No configuration file found; using defaults");
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            CliError::config(format!(
                "Failed to read configuration {}: {e}",
                path.display()
            ))
        })?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecast_render::ImageFormat;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.name, "filesystem");
        assert!(config.cache.options.contains_key("directory"));
        assert_eq!(config.renderer.program, "magick");
        assert_eq!(config.render, RenderConfig::default());
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml(
            r#"
            [render]
            format = "jpeg"
            dpi = 300
            rotation = 90

            [cache]
            name = "filesystem"
            [cache.options]
            directory = "/var/cache/pagecast"
            [cache.logging]
            trace_operations = true

            [renderer]
            program = "/opt/im/bin/magick"
            "#,
        )
        .unwrap();

        assert_eq!(config.render.format, ImageFormat::Jpeg);
        assert_eq!(config.render.dpi, 300);
        assert_eq!(config.render.rotation, Some(90));
        assert_eq!(
            config.cache.options.get("directory"),
            Some(&Value::String("/var/cache/pagecast".to_string()))
        );
        assert!(config.cache.logging.trace_operations);
        assert_eq!(config.renderer.program, "/opt/im/bin/magick");
        assert_eq!(config.renderer.pdfinfo, "pdfinfo");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_toml("[render]\nresolution = 300\n").unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_backend_config_directory_override() {
        let section = CacheSection::default();
        let backend = section.backend_config(Some(Path::new("/tmp/override")));
        assert_eq!(backend.name, "filesystem");
        assert_eq!(
            backend.options.get("directory"),
            Some(&Value::String("/tmp/override".to_string()))
        );
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(Some(&temp.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read configuration"));
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pagecast.toml");
        std::fs::write(&path, "[cache]\nenabled = false\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.name, "filesystem");
    }
}
