//! Render settings and their canonical cache request

use crate::RenderError;
use pagecast_cache::CanonicalRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Portable Network Graphics
    #[default]
    Png,
    /// JPEG
    Jpeg,
    /// WebP
    Webp,
    /// TIFF
    Tiff,
}

impl ImageFormat {
    /// All supported formats
    pub const ALL: [Self; 4] = [Self::Png, Self::Jpeg, Self::Webp, Self::Tiff];

    /// File extension, also used in cache keys and filenames
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Tiff => "tiff",
        }
    }

    /// MIME type of the encoded image
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Tiff => "image/tiff",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            "tif" | "tiff" => Ok(Self::Tiff),
            other => Err(RenderError::invalid_config(format!(
                "unsupported image format '{other}'"
            ))),
        }
    }
}

/// Everything that affects the bytes of a rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Output format
    pub format: ImageFormat,
    /// Rasterization resolution in dots per inch
    pub dpi: u32,
    /// Encoder quality, 1-100
    pub quality: u8,
    /// Brightness adjustment, -100 to 100
    pub brightness: Option<i32>,
    /// Contrast adjustment, -100 to 100
    pub contrast: Option<i32>,
    /// Clockwise rotation in degrees
    pub rotation: Option<i32>,
    /// Saturation change in percent, -100 to 100
    pub saturation: Option<i32>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            dpi: 150,
            quality: 90,
            brightness: None,
            contrast: None,
            rotation: None,
            saturation: None,
        }
    }
}

impl RenderConfig {
    /// Highest accepted resolution
    pub const MAX_DPI: u32 = 2400;

    /// Check every setting is within range
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.dpi == 0 || self.dpi > Self::MAX_DPI {
            return Err(RenderError::invalid_config(format!(
                "dpi must be between 1 and {}, got {}",
                Self::MAX_DPI,
                self.dpi
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(RenderError::invalid_config(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        for (name, value) in [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
        ] {
            if let Some(v) = value.filter(|v| !(-100..=100).contains(v)) {
                return Err(RenderError::invalid_config(format!(
                    "{name} must be between -100 and 100, got {v}"
                )));
            }
        }
        Ok(())
    }

    /// Canonical cache request for one page of `document`.
    ///
    /// The parameter order is part of the key format: mandatory `dpi` and
    /// `quality` first, then the optional adjustments in a fixed order.
    /// `document` should be absolute.
    #[must_use]
    pub fn canonical_request(&self, document: &Path, page: u32) -> CanonicalRequest {
        CanonicalRequest::new(document, page, self.format.extension())
            .param("dpi", self.dpi)
            .param("quality", self.quality)
            .optional_param("brightness", self.brightness)
            .optional_param("contrast", self.contrast)
            .optional_param("rotation", self.rotation)
            .optional_param("saturation", self.saturation)
    }
}
