//! `pagecast render`

use super::Context;
use crate::cli::{CliError, RenderArgs, print_json};
use pagecast_render::{
    MagickRenderer, PageCounter, PageRenderer, PageSelection, PdfinfoPageCounter, RenderConfig,
    RenderedPage, data_uri,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One rendered page as reported to the user
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    /// 1-based page number
    pub page: u32,
    /// Image file name
    pub filename: String,
    /// Cache key, absent with caching disabled
    pub key: Option<String>,
    /// Whether the page came from the cache
    pub from_cache: bool,
    /// Where the image was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Inline image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_uri: Option<String>,
}

/// Render the requested pages and write or print them
pub fn execute(ctx: &Context, args: &RenderArgs) -> Result<(), CliError> {
    let config = args.settings.apply(&ctx.config.render);
    config.validate()?;

    if !args.document.is_file() {
        return Err(CliError::config(format!(
            "Document not found: {}",
            args.document.display()
        )));
    }

    let storage = if args.no_cache || !ctx.config.cache.enabled {
        tracing::debug!("Caching disabled");
        None
    } else {
        Some(ctx.storage(args.cache_dir.as_deref())?)
    };

    let pages = select_pages(ctx, &args.document, &args.pages)?;
    let renderer = PageRenderer::new(
        MagickRenderer::new(ctx.config.renderer.program.clone()),
        storage,
    );

    let rendered = match args.jobs {
        None => renderer.render_pages(&args.document, &pages, &config)?,
        Some(0) => return Err(CliError::config("--jobs must be at least 1")),
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .thread_name(|i| format!("pagecast-render-{i}"))
                .build()
                .map_err(|e| CliError::other(format!("Failed to start render pool: {e}")))?;
            pool.install(|| renderer.render_pages(&args.document, &pages, &config))?
        }
    };

    let hits = rendered.iter().filter(|p| p.from_cache).count();
    tracing::info!(
        pages = rendered.len(),
        cache_hits = hits,
        "Rendering complete"
    );

    let reports = if args.data_uri {
        rendered
            .into_iter()
            .map(|page| inline_report(page, &config))
            .collect::<Vec<_>>()
    } else {
        let dir = args.output.clone().unwrap_or_else(|| PathBuf::from("."));
        write_pages(&dir, rendered)?
    };

    if ctx.json {
        return print_json(reports);
    }
    for report in &reports {
        if let Some(uri) = &report.data_uri {
            println!("{uri}");
        } else if let Some(path) = &report.path {
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Expand the page selection.
///
/// Only `all` needs the page count; explicit ranges are bounded by
/// [`PageSelection::MAX_PAGES`] and a page past the end fails in the renderer.
fn select_pages(
    ctx: &Context,
    document: &Path,
    selection: &PageSelection,
) -> Result<Vec<u32>, CliError> {
    let page_count = match selection {
        PageSelection::All => {
            PdfinfoPageCounter::new(ctx.config.renderer.pdfinfo.clone()).page_count(document)?
        }
        PageSelection::Ranges(_) => PageSelection::MAX_PAGES,
    };
    let pages = selection.resolve(page_count)?;
    if pages.is_empty() {
        return Err(CliError::config(format!(
            "No pages to render in {}",
            document.display()
        )));
    }
    Ok(pages)
}

fn inline_report(page: RenderedPage, config: &RenderConfig) -> PageReport {
    PageReport {
        data_uri: Some(data_uri(config.format, &page.data)),
        page: page.page,
        filename: page.filename,
        key: page.key,
        from_cache: page.from_cache,
        path: None,
    }
}

fn write_pages(dir: &Path, rendered: Vec<RenderedPage>) -> Result<Vec<PageReport>, CliError> {
    fs::create_dir_all(dir).map_err(|e| {
        CliError::other(format!(
            "Failed to create output directory {}: {e}",
            dir.display()
        ))
    })?;

    rendered
        .into_iter()
        .map(|page| {
            let path = dir.join(&page.filename);
            fs::write(&path, &page.data)
                .map_err(|e| CliError::other(format!("Failed to write {}: {e}", path.display())))?;
            Ok(PageReport {
                page: page.page,
                filename: page.filename,
                key: page.key,
                from_cache: page.from_cache,
                path: Some(path),
                data_uri: None,
            })
        })
        .collect()
}
