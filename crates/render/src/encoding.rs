//! Output encodings for rendered pages

use crate::ImageFormat;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encode image bytes as a `data:` URI
#[must_use]
pub fn data_uri(format: ImageFormat, data: &[u8]) -> String {
    format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(data))
}
