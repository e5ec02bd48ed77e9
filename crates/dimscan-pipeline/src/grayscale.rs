//! Frame decoding and intensity conversion.
//!
//! This is the first step of single-frame analysis: a color frame (or
//! raw encoded bytes) in, a single-channel `GrayImage` out.

use image::{DynamicImage, GrayImage};

use crate::types::{Frame, PipelineError};

/// Convert a frame to single-channel intensity.
///
/// Uses the `image` crate's luminance weights
/// (`0.2126*R + 0.7152*G + 0.0722*B`); alpha is ignored.
#[must_use = "returns the grayscale image"]
pub fn to_intensity(frame: &Frame) -> GrayImage {
    DynamicImage::ImageRgba8(frame.clone()).to_luma8()
}

/// Decode raw image bytes into a frame.
///
/// Supports PNG, JPEG, BMP, and WebP formats (whatever the `image` crate
/// was built to decode). Grayscale inputs are expanded to RGBA.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}
