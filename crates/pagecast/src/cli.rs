use crate::tracing::{LogLevel, TracingFormat};
use clap::{Args, Parser, Subcommand};
use miette::{Diagnostic, Report};
use pagecast_render::{ImageFormat, PageSelection, RenderConfig, RenderError};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Render or cache error exit code
pub const EXIT_RENDER: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(pagecast::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Rendering or cache failure (exit code 3)
    #[error("Render error: {message}")]
    #[diagnostic(code(pagecast::cli::render))]
    Render {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(pagecast::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new render error
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new render error with help text
    #[must_use]
    pub fn render_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }
}

/// Join an error and its sources into one line
#[must_use]
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn install_help(program: &str) -> String {
    format!("Install '{program}' or set [renderer] in pagecast.toml")
}

/// Cache errors split into configuration problems (exit code 2) and
/// runtime failures (exit code 3).
impl From<pagecast_cache::Error> for CliError {
    fn from(err: pagecast_cache::Error) -> Self {
        use pagecast_cache::Error;
        match err {
            Error::Configuration { message } => Self::config(message),
            Error::UnknownBackend { .. } => Self::config_with_help(
                err.to_string(),
                "Run 'pagecast cache backends' to list registered backends",
            ),
            Error::InvalidKey { .. } | Error::InvalidEntry { .. } => Self::config(err.to_string()),
            Error::Corruption { ref key, .. } => Self::render_with_help(
                err.to_string(),
                format!("Run 'pagecast cache invalidate {key}' to drop the damaged entry"),
            ),
            Error::NotFound { .. } => Self::render(err.to_string()),
            Error::Io { .. } => Self::render_with_help(
                error_chain(&err),
                "Check file permissions and ensure the cache directory exists",
            ),
        }
    }
}

impl From<RenderError> for CliError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::InvalidConfig { message } => Self::config(message),
            RenderError::Spawn { ref program, .. } => {
                Self::render_with_help(error_chain(&err), install_help(program))
            }
            RenderError::CommandFailed { .. }
            | RenderError::MissingOutput { .. }
            | RenderError::PageCount { .. } => Self::render(error_chain(&err)),
        }
    }
}

impl From<pagecast_render::Error> for CliError {
    fn from(err: pagecast_render::Error) -> Self {
        use pagecast_render::Error;
        match err {
            Error::Config { source } => source.into(),
            Error::StorageRead { source } | Error::StorageWrite { source } => source.into(),
            Error::Render { page, source } => {
                let help = match &source {
                    RenderError::Spawn { program, .. } => Some(install_help(program)),
                    _ => None,
                };
                Self::Render {
                    message: format!("Rendering page {page} failed: {}", error_chain(&source)),
                    help,
                }
            }
            Error::KeyDerivation { .. } | Error::Io { .. } => Self::render(error_chain(&err)),
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Render { .. } | CliError::Other { .. } => EXIT_RENDER,
    }
}

/// Render error appropriately based on JSON flag
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": match err {
                CliError::Config { .. } => "config",
                CliError::Render { .. } => "render",
                CliError::Other { .. } => "other",
            },
            "message": err.to_string()
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Print `data` wrapped in an [`OkEnvelope`]
pub fn print_json<T: Serialize>(data: T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(&OkEnvelope::new(data))
        .map_err(|e| CliError::other(format!("Failed to serialize output: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Render PDF pages to images through a content-addressed cache.
#[derive(Parser, Debug)]
#[command(name = "pagecast")]
#[command(about = "Render PDF pages to images through a content-addressed cache")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format.
    #[arg(
        long,
        global = true,
        help = "Set log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,

    /// Configuration file.
    #[arg(
        long,
        short = 'c',
        global = true,
        env = "PAGECAST_CONFIG",
        help = "Path to pagecast.toml",
        value_name = "FILE"
    )]
    pub config: Option<PathBuf>,

    /// Emit JSON envelope.
    #[arg(long, global = true, help = "Emit JSON envelope")]
    pub json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render pages of a PDF document.
    #[command(about = "Render pages of a PDF document", visible_alias = "r")]
    Render(RenderArgs),
    /// Inspect and maintain the page cache.
    #[command(about = "Inspect and maintain the page cache")]
    Cache {
        /// Cache directory overriding the configured one.
        #[arg(
            long,
            global = true,
            help = "Cache directory overriding the configured one",
            value_name = "DIR"
        )]
        cache_dir: Option<PathBuf>,
        /// Cache subcommand to execute.
        #[command(subcommand)]
        subcommand: CacheCommands,
    },
}

/// Arguments of `pagecast render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// PDF document to render.
    #[arg(value_name = "PDF")]
    pub document: PathBuf,

    /// Pages to render, e.g. `1,3-5` or `all`.
    #[arg(long, short = 'p', default_value = "all", help = "Pages to render, e.g. 1,3-5")]
    pub pages: PageSelection,

    /// Render settings overriding the configuration file.
    #[command(flatten)]
    pub settings: RenderSettings,

    /// Directory to write images into.
    #[arg(
        long,
        short = 'o',
        value_name = "DIR",
        conflicts_with = "data_uri",
        help = "Directory to write images into (default: current directory)"
    )]
    pub output: Option<PathBuf>,

    /// Print data URIs instead of writing files.
    #[arg(long, help = "Print data URIs instead of writing files")]
    pub data_uri: bool,

    /// Bypass the cache entirely.
    #[arg(long, help = "Bypass the cache entirely")]
    pub no_cache: bool,

    /// Cache directory overriding the configured one.
    #[arg(long, value_name = "DIR", help = "Cache directory overriding the configured one")]
    pub cache_dir: Option<PathBuf>,

    /// Number of pages rendered in parallel.
    #[arg(
        long,
        short = 'j',
        value_name = "N",
        help = "Number of pages rendered in parallel (default: one per CPU)"
    )]
    pub jobs: Option<usize>,
}

/// Render flags shared by `render` and `cache key`.
#[derive(Args, Debug, Clone, Default)]
pub struct RenderSettings {
    /// Output image format.
    #[arg(long, short = 'f', help = "Output image format (png, jpeg, webp, tiff)")]
    pub format: Option<ImageFormat>,
    /// Resolution in dots per inch.
    #[arg(long, help = "Resolution in dots per inch")]
    pub dpi: Option<u32>,
    /// Encoder quality.
    #[arg(long, help = "Encoder quality, 1-100")]
    pub quality: Option<u8>,
    /// Brightness adjustment.
    #[arg(long, allow_negative_numbers = true, help = "Brightness, -100 to 100")]
    pub brightness: Option<i32>,
    /// Contrast adjustment.
    #[arg(long, allow_negative_numbers = true, help = "Contrast, -100 to 100")]
    pub contrast: Option<i32>,
    /// Clockwise rotation.
    #[arg(long, allow_negative_numbers = true, help = "Clockwise rotation in degrees")]
    pub rotation: Option<i32>,
    /// Saturation change.
    #[arg(long, allow_negative_numbers = true, help = "Saturation change, -100 to 100")]
    pub saturation: Option<i32>,
}

impl RenderSettings {
    /// Overlay the flags that were given onto `base`
    #[must_use]
    pub fn apply(&self, base: &RenderConfig) -> RenderConfig {
        RenderConfig {
            format: self.format.unwrap_or(base.format),
            dpi: self.dpi.unwrap_or(base.dpi),
            quality: self.quality.unwrap_or(base.quality),
            brightness: self.brightness.or(base.brightness),
            contrast: self.contrast.or(base.contrast),
            rotation: self.rotation.or(base.rotation),
            saturation: self.saturation.or(base.saturation),
        }
    }
}

/// Cache maintenance subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// List registered cache backends.
    #[command(about = "List registered cache backends")]
    Backends,
    /// List keys stored in the filesystem cache.
    #[command(about = "List keys stored in the filesystem cache")]
    List,
    /// Print the cache key for one page.
    #[command(about = "Print the cache key for one page")]
    Key {
        /// PDF document.
        #[arg(value_name = "PDF")]
        document: PathBuf,
        /// 1-based page number.
        #[arg(long, short = 'p', help = "1-based page number")]
        page: u32,
        /// Render settings.
        #[command(flatten)]
        settings: RenderSettings,
    },
    /// Remove one entry.
    #[command(about = "Remove one cache entry")]
    Invalidate {
        /// Cache key.
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Remove every entry.
    #[command(about = "Remove every cache entry")]
    Clear,
}

/// Parse command-line arguments
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["pagecast", "cache", "backends"]).unwrap();

        assert!(matches!(cli.level, LogLevel::Warn));
        assert!(matches!(cli.log_format, TracingFormat::Compact));
        assert!(!cli.json);
        assert!(matches!(
            cli.command,
            Commands::Cache {
                subcommand: CacheCommands::Backends,
                cache_dir: None,
            }
        ));
    }

    #[test]
    fn test_render_args() {
        let cli = Cli::try_parse_from([
            "pagecast",
            "render",
            "doc.pdf",
            "--pages",
            "1,3-4",
            "--format",
            "jpg",
            "--dpi",
            "300",
            "--brightness",
            "-20",
            "--data-uri",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        let Commands::Render(args) = cli.command else {
            panic!("expected render command");
        };
        assert_eq!(args.document, PathBuf::from("doc.pdf"));
        assert_eq!(args.pages, PageSelection::Ranges(vec![(1, 1), (3, 4)]));
        assert_eq!(args.settings.format, Some(ImageFormat::Jpeg));
        assert_eq!(args.settings.dpi, Some(300));
        assert_eq!(args.settings.brightness, Some(-20));
        assert!(args.data_uri);
        assert!(!args.no_cache);
    }

    #[test]
    fn test_output_conflicts_with_data_uri() {
        let result =
            Cli::try_parse_from(["pagecast", "render", "doc.pdf", "-o", "out", "--data-uri"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_page_selection_rejected() {
        let result = Cli::try_parse_from(["pagecast", "render", "doc.pdf", "--pages", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_key_args() {
        let cli = Cli::try_parse_from([
            "pagecast",
            "cache",
            "key",
            "doc.pdf",
            "--page",
            "2",
            "--rotation",
            "90",
            "--cache-dir",
            "/tmp/c",
        ])
        .unwrap();

        let Commands::Cache {
            cache_dir,
            subcommand: CacheCommands::Key { page, settings, .. },
        } = cli.command
        else {
            panic!("expected cache key command");
        };
        assert_eq!(cache_dir, Some(PathBuf::from("/tmp/c")));
        assert_eq!(page, 2);
        assert_eq!(settings.rotation, Some(90));
    }

    #[test]
    fn test_settings_overlay() {
        let base = RenderConfig {
            dpi: 200,
            contrast: Some(10),
            ..RenderConfig::default()
        };
        let settings = RenderSettings {
            dpi: Some(72),
            saturation: Some(-5),
            ..RenderSettings::default()
        };

        let merged = settings.apply(&base);
        assert_eq!(merged.dpi, 72);
        assert_eq!(merged.contrast, Some(10));
        assert_eq!(merged.saturation, Some(-5));
        assert_eq!(merged.format, base.format);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&CliError::config("x")), EXIT_CLI);
        assert_eq!(exit_code_for(&CliError::render("x")), EXIT_RENDER);
        assert_eq!(exit_code_for(&CliError::other("x")), EXIT_RENDER);
    }

    #[test]
    fn test_cache_error_mapping() {
        let unknown: CliError = pagecast_cache::Error::UnknownBackend {
            name: "redis".to_string(),
        }
        .into();
        assert!(matches!(unknown, CliError::Config { .. }));

        let missing: CliError = pagecast_cache::Error::not_found("abc").into();
        assert!(matches!(missing, CliError::Render { .. }));
    }

    #[test]
    fn test_render_error_mapping() {
        let invalid: CliError = RenderError::invalid_config("dpi must be positive").into();
        assert!(matches!(invalid, CliError::Config { .. }));

        let staged: CliError = pagecast_render::Error::Render {
            page: 1,
            source: RenderError::PageCount {
                message: "no pages".to_string(),
            },
        }
        .into();
        assert!(matches!(staged, CliError::Render { .. }));
    }
}
