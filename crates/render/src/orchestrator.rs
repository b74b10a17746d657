//! Cache-aware page rendering
//!
//! [`PageRenderer`] sits between a [`Renderer`] and an optional cache
//! [`Storage`]. Neither side knows about the other: the renderer only writes
//! files, and the storage only sees [`CacheEntry`] values.

use crate::{Error, RenderConfig, RenderRequest, Renderer, Result};
use pagecast_cache::{CacheEntry, Storage};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Bytes of one rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// 1-based page number
    pub page: u32,
    /// Suggested file name (`<basename>.<page>.<extension>`)
    pub filename: String,
    /// Encoded image
    pub data: Vec<u8>,
    /// Cache key, when caching is enabled
    pub key: Option<String>,
    /// Whether the bytes were served from the cache
    pub from_cache: bool,
}

/// Renders pages, consulting and repopulating a cache when one is configured
pub struct PageRenderer<R> {
    renderer: R,
    storage: Option<Arc<dyn Storage>>,
}

impl<R: Renderer> PageRenderer<R> {
    /// Create a page renderer. Pass `None` to disable caching.
    #[must_use]
    pub fn new(renderer: R, storage: Option<Arc<dyn Storage>>) -> Self {
        Self { renderer, storage }
    }

    /// The cache backend in use, if any
    #[must_use]
    pub fn storage(&self) -> Option<&Arc<dyn Storage>> {
        self.storage.as_ref()
    }

    /// The wrapped renderer
    #[must_use]
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Render one page, serving it from the cache when possible.
    ///
    /// A cache miss falls through to the renderer; any other cache read
    /// error aborts the request. With caching enabled a failure to store the
    /// rendered page fails the request.
    pub fn render_page(
        &self,
        document: &Path,
        page: u32,
        config: &RenderConfig,
    ) -> Result<RenderedPage> {
        config.validate().map_err(|source| Error::Config { source })?;
        let filename = output_filename(document, page, config);

        let key = match &self.storage {
            Some(storage) => {
                let key = cache_key(document, page, config)?;
                match storage.get(&key) {
                    Ok(entry) => {
                        tracing::debug!(page, key = %key, "Cache hit");
                        return Ok(RenderedPage {
                            page,
                            filename,
                            data: entry.data,
                            key: Some(key),
                            from_cache: true,
                        });
                    }
                    Err(e) if e.is_not_found() => {
                        tracing::debug!(page, key = %key, "Cache miss");
                        Some(key)
                    }
                    Err(source) => return Err(Error::StorageRead { source }),
                }
            }
            None => None,
        };

        let data = self.render_to_bytes(document, page, config)?;

        if let (Some(storage), Some(key)) = (&self.storage, &key) {
            let entry = CacheEntry::new(key.clone(), data, filename.clone());
            storage
                .set(&entry)
                .map_err(|source| Error::StorageWrite { source })?;
            tracing::debug!(page, key = %key, bytes = entry.data.len(), "Stored rendered page");
            return Ok(RenderedPage {
                page,
                filename,
                data: entry.data,
                key: Some(entry.key),
                from_cache: false,
            });
        }

        Ok(RenderedPage {
            page,
            filename,
            data,
            key,
            from_cache: false,
        })
    }

    /// Render several pages in parallel, returning them in input order.
    ///
    /// Stops at the first failing page.
    pub fn render_pages(
        &self,
        document: &Path,
        pages: &[u32],
        config: &RenderConfig,
    ) -> Result<Vec<RenderedPage>> {
        pages
            .par_iter()
            .map(|&page| self.render_page(document, page, config))
            .collect()
    }

    /// Invoke the renderer into scratch space and read the result back.
    ///
    /// The scratch directory is removed when this returns, whatever the
    /// outcome.
    fn render_to_bytes(&self, document: &Path, page: u32, config: &RenderConfig) -> Result<Vec<u8>> {
        let scratch = tempfile::Builder::new()
            .prefix("pagecast-")
            .tempdir()
            .map_err(|e| Error::io_no_path(e, "create scratch directory"))?;
        let output = scratch
            .path()
            .join(format!("page.{}", config.format.extension()));

        let request = RenderRequest {
            document,
            page,
            config,
        };
        self.renderer
            .render(&request, &output)
            .map_err(|source| Error::Render { page, source })?;

        let data = fs::read(&output).map_err(|e| Error::io(e, &output, "read"))?;
        tracing::info!(
            document = %document.display(),
            page,
            bytes = data.len(),
            "Rendered page"
        );
        Ok(data)
    }
}

impl<R> std::fmt::Debug for PageRenderer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRenderer")
            .field("storage", &self.storage.as_ref().map(|s| s.name()))
            .finish_non_exhaustive()
    }
}

/// Derive the cache key for one page of `document` under `config`.
///
/// The document path is made absolute first so the same file reached
/// through different relative paths shares a key.
pub fn cache_key(document: &Path, page: u32, config: &RenderConfig) -> Result<String> {
    let absolute = absolute_path(document)?;
    Ok(config.canonical_request(&absolute, page).key())
}

fn absolute_path(document: &Path) -> Result<PathBuf> {
    std::path::absolute(document).map_err(|source| Error::KeyDerivation {
        path: document.into(),
        source,
    })
}

/// File name for a rendered page: `<basename>.<page>.<extension>`
///
/// Path separators and NUL in the basename become `_` so the name is
/// always a single path segment.
#[must_use]
pub fn output_filename(document: &Path, page: u32, config: &RenderConfig) -> String {
    let stem = document
        .file_stem()
        .map_or_else(|| "page".into(), |s| s.to_string_lossy())
        .replace(['/', '\\', '\0'], "_");
    format!("{stem}.{page}.{}", config.format.extension())
}
