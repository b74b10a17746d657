//! Log output for the pagecast binary
//!
//! Everything goes to stderr so rendered data on stdout (data URIs, JSON
//! envelopes) stays machine readable.

use std::io;
use std::sync::OnceLock;
pub use tracing::Level;
use tracing_subscriber::{
    Layer, Registry, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};
use uuid::Uuid;

/// How log lines are formatted
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TracingFormat {
    /// Multi-line, human oriented
    Pretty,
    /// One line per event
    Compact,
    /// Newline-delimited JSON objects
    Json,
    /// Compact plus source locations and thread ids
    Dev,
}

/// `--level` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Everything
    Trace,
    /// Cache hits, misses and backend operations
    Debug,
    /// Rendered pages
    Info,
    /// Skipped cache entries and other recoverable problems
    Warn,
    /// Errors only
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Line format
    pub format: TracingFormat,
    /// Level for pagecast crates when `RUST_LOG` is unset
    pub level: Level,
    /// Filter directive taking precedence over `level` and `RUST_LOG`
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: TracingFormat::Compact,
            level: Level::WARN,
            filter: None,
        }
    }
}

static RUN_ID: OnceLock<Uuid> = OnceLock::new();

/// Identifier attached to the first event of this process
pub fn correlation_id() -> Uuid {
    *RUN_ID.get_or_init(Uuid::new_v4)
}

/// Filter directive enabling `level` for every pagecast crate
#[must_use]
pub fn default_directive(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    ["pagecast", "pagecast_cache", "pagecast_render"]
        .map(|target| format!("{target}={level}"))
        .join(",")
}

fn env_filter(config: &TracingConfig) -> Result<EnvFilter, String> {
    match &config.filter {
        Some(directive) => EnvFilter::try_new(directive).map_err(|e| e.to_string()),
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_directive(config.level)))
            .map_err(|e| e.to_string()),
    }
}

fn format_layer(format: TracingFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
    match format {
        TracingFormat::Pretty => layer.pretty().with_thread_names(true).boxed(),
        TracingFormat::Compact => layer.compact().with_target(false).boxed(),
        TracingFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        TracingFormat::Dev => layer
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .boxed(),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: TracingConfig) -> miette::Result<()> {
    let filter = env_filter(&config)
        .map_err(|e| miette::miette!("Failed to create tracing filter: {e}"))?;

    tracing_subscriber::registry()
        .with(format_layer(config.format))
        .with(filter)
        .try_init()
        .map_err(|e| miette::miette!("Failed to install tracing subscriber: {e}"))?;

    tracing::debug!(
        correlation_id = %correlation_id(),
        version = env!("CARGO_PKG_VERSION"),
        format = ?config.format,
        "Tracing initialized"
    );
    Ok(())
}
