pub mod color;
pub mod resize;

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, RgbImage};
use ndarray::Array2;

use crate::error::InferenceError;

/// Side length every descriptor assumes.
pub const CANONICAL_SIZE: u32 = 256;

/// Where an image to classify comes from.
#[derive(Debug, Clone)]
pub enum ImageSource<'a> {
    /// Encoded image bytes (PNG, JPEG, BMP, ...).
    Encoded(&'a [u8]),
    /// Base64 text, optionally behind a `<metadata>,` prefix such as a data URI header.
    Transport(&'a str),
    /// An image file on disk.
    Path(&'a Path),
    /// An image that has already been decoded.
    Decoded(DynamicImage),
}

/// A 256×256 RGB image. Only [`normalize`] produces these.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalImage {
    rgb: RgbImage,
}

impl CanonicalImage {
    /// All-black canonical image.
    pub fn blank() -> Self {
        Self { rgb: RgbImage::new(CANONICAL_SIZE, CANONICAL_SIZE) }
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn to_gray(&self) -> Array2<u8> {
        color::to_gray(&self.rgb)
    }
}

/// Strips an optional `<metadata>,` prefix and decodes the base64 remainder.
pub fn decode_transport(payload: &str) -> Result<Vec<u8>, InferenceError> {
    let body = match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    };
    let body: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if body.is_empty() {
        return Err(InferenceError::InvalidImage("empty image payload".to_string()));
    }
    Ok(STANDARD.decode(body.as_bytes())?)
}

fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage, InferenceError> {
    if bytes.is_empty() {
        return Err(InferenceError::InvalidImage("zero-length image buffer".to_string()));
    }
    Ok(image::load_from_memory(bytes)?)
}

pub fn decode(source: ImageSource<'_>) -> Result<DynamicImage, InferenceError> {
    match source {
        ImageSource::Encoded(bytes) => decode_bytes(bytes),
        ImageSource::Transport(text) => decode_bytes(&decode_transport(text)?),
        ImageSource::Path(path) => {
            let bytes = std::fs::read(path).map_err(|e| {
                InferenceError::InvalidImage(format!("could not read {}: {}", path.display(), e))
            })?;
            decode_bytes(&bytes)
        }
        ImageSource::Decoded(image) => Ok(image),
    }
}

/// Decodes `source` and resizes it to the canonical resolution.
pub fn normalize(source: ImageSource<'_>) -> Result<CanonicalImage, InferenceError> {
    let decoded = decode(source)?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(InferenceError::InvalidImage(format!(
            "image has no pixels ({}x{})",
            decoded.width(),
            decoded.height()
        )));
    }
    log::debug!("Decoded image {}x{} ({:?})", decoded.width(), decoded.height(), decoded.color());

    let rgb = decoded.to_rgb8();
    let rgb = resize::resize_bilinear(&rgb, CANONICAL_SIZE, CANONICAL_SIZE);
    Ok(CanonicalImage { rgb })
}
