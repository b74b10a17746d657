//! Rendering collaborator
//!
//! Rendering is delegated to an external rasterizer. Calls block until the
//! process exits; there is no timeout.

use crate::{RenderConfig, RenderError};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// One page to render
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    /// Source document
    pub document: &'a Path,
    /// 1-based page number
    pub page: u32,
    /// Render settings
    pub config: &'a RenderConfig,
}

/// Produces an image of one document page
pub trait Renderer: Send + Sync {
    /// Render `request` into the file at `output`
    fn render(&self, request: &RenderRequest<'_>, output: &Path) -> Result<(), RenderError>;
}

/// Renders pages with ImageMagick
#[derive(Debug, Clone)]
pub struct MagickRenderer {
    program: String,
}

impl Default for MagickRenderer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

impl MagickRenderer {
    /// Program invoked when none is configured
    pub const DEFAULT_PROGRAM: &'static str = "magick";

    /// Create a renderer invoking `program`
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Program this renderer invokes
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command-line arguments for one render
    #[must_use]
    pub fn arguments(request: &RenderRequest<'_>, output: &Path) -> Vec<OsString> {
        let config = request.config;
        let mut args: Vec<OsString> = vec!["-density".into(), config.dpi.to_string().into()];

        // ImageMagick page selectors are 0-based
        let mut input = request.document.as_os_str().to_os_string();
        input.push(format!("[{}]", request.page.saturating_sub(1)));
        args.push(input);

        args.extend(
            ["-background", "white", "-alpha", "remove", "-alpha", "off"]
                .into_iter()
                .map(OsString::from),
        );

        if config.brightness.is_some() || config.contrast.is_some() {
            args.push("-brightness-contrast".into());
            args.push(
                format!(
                    "{}x{}",
                    config.brightness.unwrap_or(0),
                    config.contrast.unwrap_or(0)
                )
                .into(),
            );
        }
        if let Some(rotation) = config.rotation {
            args.push("-rotate".into());
            args.push(rotation.to_string().into());
        }
        if let Some(saturation) = config.saturation {
            args.push("-modulate".into());
            args.push(format!("100,{}", 100 + saturation).into());
        }

        args.push("-quality".into());
        args.push(config.quality.to_string().into());
        args.push(output.as_os_str().to_os_string());
        args
    }
}

impl Renderer for MagickRenderer {
    fn render(&self, request: &RenderRequest<'_>, output: &Path) -> Result<(), RenderError> {
        let args = Self::arguments(request, output);
        tracing::debug!(
            program = %self.program,
            document = %request.document.display(),
            page = request.page,
            "Invoking renderer"
        );

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(RenderError::CommandFailed {
                program: self.program.clone(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        if !output.is_file() {
            return Err(RenderError::MissingOutput {
                path: output.into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageFormat;

    fn args_as_strings(request: &RenderRequest<'_>) -> Vec<String> {
        MagickRenderer::arguments(request, Path::new("/tmp/out.png"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_default_arguments() {
        let config = RenderConfig::default();
        let request = RenderRequest {
            document: Path::new("/docs/a.pdf"),
            page: 1,
            config: &config,
        };

        assert_eq!(
            args_as_strings(&request),
            vec![
                "-density",
                "150",
                "/docs/a.pdf[0]",
                "-background",
                "white",
                "-alpha",
                "remove",
                "-alpha",
                "off",
                "-quality",
                "90",
                "/tmp/out.png",
            ]
        );
    }

    #[test]
    fn test_adjustment_arguments() {
        let config = RenderConfig {
            format: ImageFormat::Jpeg,
            dpi: 300,
            quality: 75,
            brightness: Some(10),
            contrast: None,
            rotation: Some(90),
            saturation: Some(-30),
        };
        let request = RenderRequest {
            document: Path::new("/docs/a.pdf"),
            page: 4,
            config: &config,
        };
        let args = args_as_strings(&request);

        assert!(args.contains(&"/docs/a.pdf[3]".to_string()));
        let joined = args.join(" ");
        assert!(joined.contains("-brightness-contrast 10x0"));
        assert!(joined.contains("-rotate 90"));
        assert!(joined.contains("-modulate 100,70"));
        assert!(joined.contains("-quality 75"));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let renderer = MagickRenderer::new("pagecast-test-no-such-program");
        let config = RenderConfig::default();
        let request = RenderRequest {
            document: Path::new("/docs/a.pdf"),
            page: 1,
            config: &config,
        };

        let err = renderer
            .render(&request, Path::new("/tmp/never-written.png"))
            .unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program_is_command_failed() {
        let renderer = MagickRenderer::new("false");
        let config = RenderConfig::default();
        let request = RenderRequest {
            document: Path::new("/docs/a.pdf"),
            page: 1,
            config: &config,
        };

        let err = renderer
            .render(&request, Path::new("/tmp/never-written.png"))
            .unwrap_err();
        assert!(matches!(err, RenderError::CommandFailed { .. }));
    }
}
