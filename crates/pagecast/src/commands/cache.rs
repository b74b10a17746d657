//! `pagecast cache ...`

use super::Context;
use crate::cli::{CacheCommands, CliError, RenderSettings, print_json};
use pagecast_cache::FilesystemStorage;
use pagecast_render::cache_key;
use std::path::Path;

/// Run a cache subcommand
pub fn execute(
    ctx: &Context,
    cache_dir: Option<&Path>,
    command: &CacheCommands,
) -> Result<(), CliError> {
    match command {
        CacheCommands::Backends => {
            let backends = ctx.registry.list_backends();
            if ctx.json {
                return print_json(backends);
            }
            for name in backends {
                println!("{name}");
            }
            Ok(())
        }
        CacheCommands::List => {
            let keys = list_keys(ctx, cache_dir)?;
            if ctx.json {
                return print_json(keys);
            }
            for key in keys {
                println!("{key}");
            }
            Ok(())
        }
        CacheCommands::Key {
            document,
            page,
            settings,
        } => {
            let key = page_key(ctx, document, *page, settings)?;
            if ctx.json {
                return print_json(serde_json::json!({ "page": page, "key": key }));
            }
            println!("{key}");
            Ok(())
        }
        CacheCommands::Invalidate { key } => {
            ctx.storage(cache_dir)?.invalidate(key)?;
            tracing::info!(key = %key, "Invalidated cache entry");
            if ctx.json {
                return print_json(serde_json::json!({ "invalidated": key }));
            }
            Ok(())
        }
        CacheCommands::Clear => {
            ctx.storage(cache_dir)?.clear()?;
            tracing::info!("Cleared cache");
            if ctx.json {
                return print_json(serde_json::json!({ "cleared": true }));
            }
            Ok(())
        }
    }
}

/// Cache key `render` would use for `page` of `document` with `settings`
pub fn page_key(
    ctx: &Context,
    document: &Path,
    page: u32,
    settings: &RenderSettings,
) -> Result<String, CliError> {
    let config = settings.apply(&ctx.config.render);
    config.validate()?;
    Ok(cache_key(document, page, &config)?)
}

/// Keys in the filesystem cache. Other backends cannot enumerate entries.
fn list_keys(ctx: &Context, cache_dir: Option<&Path>) -> Result<Vec<String>, CliError> {
    let backend = ctx.config.cache.backend_config(cache_dir);
    if backend.name != FilesystemStorage::NAME {
        return Err(CliError::config(format!(
            "Listing keys is only supported by the '{}' backend, not '{}'",
            FilesystemStorage::NAME,
            backend.name
        )));
    }
    Ok(FilesystemStorage::from_config(&backend)?.keys()?)
}
