//! Persistence of annotated artifacts.
//!
//! Each artifact of an [`AnalysisResult`] is written as a JPEG named
//! `analysis_<YYYYmmdd_HHMMSS>_<capture>.jpg`, where the timestamp is the
//! local time of the save and the capture is the index of the capture
//! attempt that produced the frame.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use dimscan_pipeline::{AnalysisResult, RgbaImage};
use image::ImageEncoder;
use serde::Serialize;

use crate::IoError;

/// JPEG quality of saved artifacts (1-100).
pub const JPEG_QUALITY: u8 = 90;

/// An artifact that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedArtifact {
    /// File name without directory.
    pub filename: String,
    /// Full path of the written file.
    pub path: PathBuf,
    /// Capture attempt the artifact came from.
    pub capture_index: usize,
}

/// File name for the artifact of capture `capture_index` saved at `at`.
#[must_use]
pub fn artifact_filename(at: &DateTime<Local>, capture_index: usize) -> String {
    format!(
        "analysis_{}_{capture_index}.jpg",
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Encode an RGBA image as JPEG bytes, dropping the alpha channel.
///
/// # Errors
///
/// Returns [`IoError::Image`] if encoding fails.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, IoError> {
    let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder.write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}

/// Write every artifact of `result` into `dir`, creating it if needed.
///
/// Returns the saved files in artifact order. A failed run has no
/// artifacts and writes nothing.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the directory or a file cannot be written,
/// or [`IoError::Image`] if encoding fails.
pub fn save_artifacts(result: &AnalysisResult, dir: &Path) -> Result<Vec<SavedArtifact>, IoError> {
    if result.artifacts.is_empty() {
        return Ok(Vec::new());
    }
    std::fs::create_dir_all(dir)?;

    let now = Local::now();
    let mut saved = Vec::with_capacity(result.artifacts.len());
    for artifact in &result.artifacts {
        let filename = artifact_filename(&now, artifact.capture_index);
        let path = dir.join(&filename);
        std::fs::write(&path, encode_jpeg(&artifact.image, JPEG_QUALITY)?)?;
        tracing::info!(path = %path.display(), capture = artifact.capture_index, "saved artifact");
        saved.push(SavedArtifact {
            filename,
            path,
            capture_index: artifact.capture_index,
        });
    }
    Ok(saved)
}
