//! Page rendering for pagecast
//!
//! Renders PDF pages to images through an external rasterizer and, when a
//! cache backend is configured, serves repeated requests from the cache:
//!
//! ```text
//! PageRenderer -> cache key -> Storage::get
//!                                 hit  -> cached bytes
//!                                 miss -> Renderer -> Storage::set -> bytes
//! ```

mod config;
mod encoding;
mod error;
pub mod orchestrator;
pub mod pages;
pub mod renderer;

pub use config::{ImageFormat, RenderConfig};
pub use encoding::data_uri;
pub use error::{Error, RenderError, Result};
pub use orchestrator::{PageRenderer, RenderedPage, cache_key, output_filename};
pub use pages::{PageCounter, PageSelection, PdfinfoPageCounter, parse_pdfinfo_pages};
pub use renderer::{MagickRenderer, RenderRequest, Renderer};
