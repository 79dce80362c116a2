//! Raster decode and encode helpers.
//!
//! Thin wrappers over the `image` crate so the rest of the workspace
//! deals in [`RgbaImage`] buffers and one error type.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder as _, RgbaImage};
use thiserror::Error;

/// Raster decode/encode failure.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The input byte slice was empty.
    #[error("input contained no bytes")]
    EmptyInput,
    /// The bytes were not a decodable image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[source] image::ImageError),
    /// PNG encoding failed.
    #[error("failed to encode PNG: {0}")]
    PngEncode(#[source] image::ImageError),
}

/// Decode encoded image bytes into an RGBA buffer.
///
/// The format is sniffed from the bytes; PNG, JPEG, BMP, and WebP are
/// enabled in this workspace.
///
/// # Errors
///
/// Returns [`RasterError::EmptyInput`] for an empty slice and
/// [`RasterError::ImageDecode`] when the bytes cannot be decoded.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, RasterError> {
    if bytes.is_empty() {
        return Err(RasterError::EmptyInput);
    }
    let image = image::load_from_memory(bytes).map_err(RasterError::ImageDecode)?;
    Ok(image.to_rgba8())
}

/// Encode an RGBA buffer as PNG bytes.
///
/// # Errors
///
/// Returns [`RasterError::PngEncode`] when encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RasterError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(RasterError::PngEncode)?;
    Ok(bytes)
}
