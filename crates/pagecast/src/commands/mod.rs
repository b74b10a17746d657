//! Command implementations

pub mod cache;
pub mod render;

use crate::cli::{Cli, CliError, Commands};
use crate::config::Config;
use pagecast_cache::{BackendRegistry, Storage};
use std::path::Path;
use std::sync::Arc;

/// State shared by every command
#[derive(Debug)]
pub struct Context {
    /// Loaded configuration
    pub config: Config,
    /// Backends available to `[cache] name`
    pub registry: BackendRegistry,
    /// Emit JSON envelopes instead of text
    pub json: bool,
}

impl Context {
    /// Context with the built-in backends registered
    #[must_use]
    pub fn new(config: Config, json: bool) -> Self {
        Self {
            config,
            registry: BackendRegistry::with_builtin_backends(),
            json,
        }
    }

    /// Construct the configured cache backend.
    ///
    /// `directory` overrides the configured `directory` option.
    pub fn storage(&self, directory: Option<&Path>) -> Result<Arc<dyn Storage>, CliError> {
        let backend = self.config.cache.backend_config(directory);
        tracing::debug!(backend = %backend.name, "Creating cache backend");
        Ok(self.registry.create(&backend)?)
    }
}

/// Run the parsed command line
pub fn execute(cli: Cli) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let ctx = Context::new(config, cli.json);

    match cli.command {
        Commands::Render(args) => render::execute(&ctx, &args),
        Commands::Cache {
            cache_dir,
            subcommand,
        } => cache::execute(&ctx, cache_dir.as_deref(), &subcommand),
    }
}
