//! Shared types for the dimscan measurement pipeline.

use serde::{Deserialize, Serialize};

use crate::annotate::Label;

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can reference
/// frames without depending on `image` directly.
pub use image::RgbaImage;

/// A single captured camera frame.
///
/// Frames are owned by the pipeline for the duration of one analysis
/// step and dropped afterwards. Grayscale sources convert into RGBA so
/// that annotation can draw colored boxes.
pub type Frame = RgbaImage;

/// A point on the pixel grid of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Column (pixels from left edge).
    pub x: u32,
    /// Row (pixels from top edge).
    pub y: u32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Minimal axis-aligned rectangle enclosing a contour, in pixels.
///
/// Follows the inclusive pixel convention: a contour whose points span
/// columns `10..=19` has `x = 10` and `width = 10`. A nondegenerate
/// contour therefore always has `width >= 1` and `height >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge (inclusive).
    pub x: u32,
    /// Top edge (inclusive).
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// Create a new bounding box.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Compute the bounding box of a point set.
    ///
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// One past the rightmost column (`x + width`).
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the bottom row (`y + height`).
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Returns `true` if `other` lies entirely within `self`.
    ///
    /// Touching edges count as contained.
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns `true` if `self` is strictly narrower than `ratio * other.width`
    /// and strictly shorter than `ratio * other.height`.
    #[must_use]
    pub fn is_smaller_than(&self, other: &Self, ratio: f64) -> bool {
        f64::from(self.width) < ratio * f64::from(other.width)
            && f64::from(self.height) < ratio * f64::from(other.height)
    }
}

/// Configuration consumed by one analysis run.
///
/// Everything else in the pipeline (blur kernel, Canny thresholds,
/// noise threshold, size ratio) is a fixed constant; see the crate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Real-world width of the reference object in centimeters.
    pub reference_width_cm: f64,

    /// Number of frames to capture and analyze per run.
    pub num_captures: usize,
}

impl AnalysisConfig {
    /// Default reference width: a 10 cm card.
    pub const DEFAULT_REFERENCE_WIDTH_CM: f64 = 10.0;

    /// Default number of captures per run.
    pub const DEFAULT_NUM_CAPTURES: usize = 8;

    /// Check the configuration before a run starts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositiveReferenceWidth`] if the reference
    /// width is zero, negative, or not finite.
    /// Returns [`ConfigError::ZeroCaptures`] if `num_captures` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.reference_width_cm.is_finite() || self.reference_width_cm <= 0.0 {
            return Err(ConfigError::NonPositiveReferenceWidth(
                self.reference_width_cm,
            ));
        }
        if self.num_captures == 0 {
            return Err(ConfigError::ZeroCaptures);
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            reference_width_cm: Self::DEFAULT_REFERENCE_WIDTH_CM,
            num_captures: Self::DEFAULT_NUM_CAPTURES,
        }
    }
}

/// Real-world size of the measured object in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Horizontal extent in centimeters.
    pub width_cm: f64,
    /// Vertical extent in centimeters.
    pub length_cm: f64,
}

/// Mean measurements reported by a successful run.
///
/// `height_cm` repeats `length_cm`: only two dimensions are observable
/// from a single top-down frame, and consumers of the result expect the
/// three-field shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    /// Mean width in centimeters, rounded to 2 decimals.
    pub width_cm: f64,
    /// Mean length in centimeters, rounded to 2 decimals.
    pub length_cm: f64,
    /// Copy of `length_cm`.
    pub height_cm: f64,
}

impl Measurements {
    /// Build from mean width and length, duplicating length as height.
    #[must_use]
    pub const fn from_mean(width_cm: f64, length_cm: f64) -> Self {
        Self {
            width_cm,
            length_cm,
            height_cm: length_cm,
        }
    }
}

/// An annotated frame kept as an output of a run.
///
/// Serializes as a descriptor (capture index, size, labels); the pixel
/// data is left for the caller to encode and persist.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    /// Zero-based index of the capture attempt that produced this frame.
    pub capture_index: usize,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Text labels belonging to the drawn boxes.
    pub labels: Vec<Label>,
    /// The annotated frame.
    #[serde(skip)]
    pub image: RgbaImage,
}

/// Outcome of one analysis run.
///
/// Created once by [`crate::analyze`] and not modified afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// `true` when at least one frame produced a valid measurement.
    pub success: bool,
    /// Human-readable summary of the outcome.
    pub message: String,
    /// Mean measurements, `None` on failure.
    pub measurements: Option<Measurements>,
    /// At most two annotated frames: first and last valid sample.
    #[serde(rename = "images")]
    pub artifacts: Vec<Artifact>,
    /// Number of frames that produced a valid measurement.
    pub num_valid_captures: usize,
    /// Number of capture attempts that delivered a frame.
    pub num_frames_captured: usize,
    /// Number of delivered frames in which detection failed.
    pub num_invalid_captures: usize,
}

/// Configuration rejected before a run starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The reference width would produce a meaningless calibration ratio.
    #[error("reference width must be positive and finite, got {0}")]
    NonPositiveReferenceWidth(f64),

    /// A run must attempt at least one capture.
    #[error("capture count must be at least 1")]
    ZeroCaptures,
}

/// Why a single frame produced no measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DetectionError {
    /// Edge detection produced no contours.
    #[error("no contours found in the frame")]
    NoContours,

    /// Every contour fell below the noise area threshold.
    #[error("no contour larger than the noise threshold")]
    NoCandidates,

    /// A reference was found but nothing qualified as the measured object.
    #[error("no object found inside the reference")]
    NoMeasuredObject,
}

/// A frame source could not be opened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unable to open frame source: {0}")]
pub struct SourceError(pub String);

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Analysis configuration is invalid.
    #[error("invalid analysis configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// No measurement could be taken from the frame.
    #[error("detection failed: {0}")]
    Detection(#[from] DetectionError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- BoundingBox tests ---

    #[test]
    fn bounding_box_from_points_is_inclusive() {
        let points = [Point::new(10, 5), Point::new(19, 5), Point::new(19, 8)];
        let bbox = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bbox, BoundingBox::new(10, 5, 10, 4));
    }

    #[test]
    fn bounding_box_of_single_point_is_one_pixel() {
        let bbox = BoundingBox::from_points(&[Point::new(3, 4)]).unwrap();
        assert_eq!(bbox, BoundingBox::new(3, 4, 1, 1));
    }

    #[test]
    fn bounding_box_of_nothing_is_none() {
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn contains_accepts_touching_edges() {
        let outer = BoundingBox::new(10, 10, 100, 50);
        assert!(outer.contains(&BoundingBox::new(10, 10, 100, 50)));
        assert!(outer.contains(&BoundingBox::new(20, 20, 90, 40)));
    }

    #[test]
    fn contains_rejects_overhang() {
        let outer = BoundingBox::new(10, 10, 100, 50);
        assert!(!outer.contains(&BoundingBox::new(9, 20, 10, 10)));
        assert!(!outer.contains(&BoundingBox::new(20, 20, 91, 10)));
        assert!(!outer.contains(&BoundingBox::new(20, 55, 10, 6)));
    }

    #[test]
    fn smaller_than_is_strict_at_ratio_boundary() {
        let reference = BoundingBox::new(0, 0, 200, 100);
        // Exactly 95% in width is rejected.
        assert!(!BoundingBox::new(0, 0, 190, 50).is_smaller_than(&reference, 0.95));
        assert!(BoundingBox::new(0, 0, 189, 50).is_smaller_than(&reference, 0.95));
        // Exactly 95% in height is rejected.
        assert!(!BoundingBox::new(0, 0, 50, 95).is_smaller_than(&reference, 0.95));
    }

    // --- AnalysisConfig tests ---

    #[test]
    fn config_defaults() {
        let config = AnalysisConfig::default();
        assert!((config.reference_width_cm - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.num_captures, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_non_positive_width() {
        for width in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = AnalysisConfig {
                reference_width_cm: width,
                ..AnalysisConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::NonPositiveReferenceWidth(_))
            ));
        }
    }

    #[test]
    fn config_rejects_zero_captures() {
        let config = AnalysisConfig {
            num_captures: 0,
            ..AnalysisConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCaptures));
    }

    #[test]
    fn config_fills_missing_fields_from_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"num_captures": 3}"#).unwrap();
        assert_eq!(config.num_captures, 3);
        assert!((config.reference_width_cm - 10.0).abs() < f64::EPSILON);
    }

    // --- Measurements tests ---

    #[test]
    fn height_duplicates_length() {
        let m = Measurements::from_mean(3.0, 2.5);
        assert!((m.height_cm - m.length_cm).abs() < f64::EPSILON);
    }

    // --- Error display tests ---

    #[test]
    fn error_invalid_config_display() {
        let err = PipelineError::from(ConfigError::ZeroCaptures);
        assert_eq!(
            err.to_string(),
            "invalid analysis configuration: capture count must be at least 1",
        );
    }

    #[test]
    fn error_detection_display() {
        let err = PipelineError::from(DetectionError::NoContours);
        assert_eq!(err.to_string(), "detection failed: no contours found in the frame");
    }

    #[test]
    fn source_error_display() {
        let err = SourceError("device busy".to_string());
        assert_eq!(err.to_string(), "unable to open frame source: device busy");
    }

    #[test]
    fn analysis_result_serializes_to_report_shape() {
        let result = AnalysisResult {
            success: true,
            message: "ok".to_string(),
            measurements: Some(Measurements::from_mean(3.0, 2.0)),
            artifacts: vec![Artifact {
                capture_index: 0,
                width: 4,
                height: 3,
                labels: vec![],
                image: RgbaImage::new(4, 3),
            }],
            num_valid_captures: 1,
            num_frames_captured: 1,
            num_invalid_captures: 0,
        };
        let json: serde_json::Value = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["measurements"]["height_cm"], 2.0);
        assert_eq!(json["images"][0]["capture_index"], 0);
        assert!(json["images"][0].get("image").is_none());
        assert_eq!(json["num_valid_captures"], 1);
    }
}
