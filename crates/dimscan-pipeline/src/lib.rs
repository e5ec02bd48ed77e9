//! dimscan-pipeline: Calibrated dimensional measurement (sans-IO).
//!
//! Estimates the real-world width and length of an object by comparing
//! it, within one frame, against a reference object of known width:
//! grayscale -> blur -> edge detection -> contour forest ->
//! reference/object selection -> calibration -> dimensions.
//!
//! [`analyze`] repeats that single-frame pipeline over a fixed number of
//! captures from a [`FrameSource`] and averages the valid samples.
//!
//! This crate has **no I/O dependencies** -- frames come from a
//! [`FrameSource`] implementation and results are returned as
//! structured data. Filesystem access lives in `dimscan-io`.

pub mod aggregate;
pub mod annotate;
pub mod blur;
pub mod calibrate;
pub mod canny;
pub mod contour;
pub mod edge;
pub mod grayscale;
pub mod measure;
pub mod select;
pub mod source;
pub mod types;

pub use aggregate::analyze;
pub use annotate::{Annotation, Label};
pub use blur::KERNEL_SIZE as BLUR_KERNEL_SIZE;
pub use calibrate::Calibration;
pub use contour::{ContourForest, ContourId, ContourRecord};
pub use edge::{CANNY_HIGH, CANNY_LOW};
pub use select::{NOISE_AREA_THRESHOLD, SIZE_RATIO_LIMIT, Selection, Strategy};
pub use source::{ConnectionStatus, FrameSource, SourceGuard, test_connection};
pub use types::{
    AnalysisConfig, AnalysisResult, Artifact, BoundingBox, ConfigError, DetectionError, Frame,
    GrayImage, Measurement, Measurements, PipelineError, Point, RgbaImage, SourceError,
};

/// Everything derived from one successfully measured frame.
#[derive(Debug, Clone)]
pub struct FrameMeasurement {
    /// Object size in centimeters.
    pub measurement: Measurement,
    /// Chosen reference and measured contours.
    pub selection: Selection,
    /// Scale derived from the reference.
    pub calibration: Calibration,
    /// Annotated copy of the frame.
    pub annotation: Annotation,
}

/// Extract the contour forest of a frame.
///
/// # Steps
///
/// 1. Convert to single-channel intensity
/// 2. 7x7 Gaussian blur
/// 3. Canny edge detection (thresholds 50 / 150, no further smoothing)
/// 4. Border following over the full contour tree
///
/// Returns an empty forest if the frame has no edges.
#[must_use]
pub fn extract_contours(frame: &Frame) -> ContourForest {
    let gray = grayscale::to_intensity(frame);
    let blurred = blur::gaussian_blur(&gray);
    let edges = edge::canny(&blurred);
    if !edge::has_edges(&edges) {
        return ContourForest::default();
    }
    ContourForest::trace(&edges)
}

/// Run the single-frame measurement pipeline.
///
/// # Errors
///
/// Returns [`PipelineError::Detection`] if the frame has no contours, no
/// candidate above the noise threshold, or no object to measure.
/// Returns [`PipelineError::InvalidConfig`] if the configured reference
/// width is not positive.
pub fn analyze_frame(
    frame: &Frame,
    config: &AnalysisConfig,
) -> Result<FrameMeasurement, PipelineError> {
    let forest = extract_contours(frame);
    if forest.is_empty() {
        return Err(DetectionError::NoContours.into());
    }

    let selection = select::select(&forest)?;
    let calibration =
        Calibration::from_reference(selection.reference_box.width, config.reference_width_cm)?;
    let measurement = measure::compute_dimensions(&selection.measured_box, &calibration);
    let annotation = annotate::annotate(frame, &selection, &measurement);

    tracing::debug!(
        contours = forest.len(),
        pixels_per_cm = calibration.pixels_per_cm(),
        width_cm = measurement.width_cm,
        length_cm = measurement.length_cm,
        "frame measured"
    );

    Ok(FrameMeasurement {
        measurement,
        selection,
        calibration,
        annotation,
    })
}

/// Decode an encoded still image and measure it.
///
/// Convenience for callers holding an uploaded photo rather than an open
/// frame source.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for an invalid configuration.
/// Returns [`PipelineError::EmptyInput`] or [`PipelineError::ImageDecode`]
/// if the bytes cannot be decoded, and [`PipelineError::Detection`] if
/// nothing could be measured.
pub fn analyze_image_bytes(
    image_bytes: &[u8],
    config: &AnalysisConfig,
) -> Result<FrameMeasurement, PipelineError> {
    config.validate()?;
    let frame = grayscale::decode_frame(image_bytes)?;
    analyze_frame(&frame, config)
}

#[cfg(test)]
pub(crate) mod test_frames {
    //! Synthetic frames shared by unit tests.

    use image::Rgba;

    use crate::types::{BoundingBox, Frame};

    pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
    pub const CARD: Rgba<u8> = Rgba([0, 0, 0, 255]);
    pub const OBJECT: Rgba<u8> = Rgba([255, 255, 255, 255]);

    /// A dark reference card on a white background with a light object
    /// lying on it.
    pub fn card_with_object(card: BoundingBox, object: BoundingBox) -> Frame {
        let inside = |b: &BoundingBox, x: u32, y: u32| {
            x >= b.x && x < b.right() && y >= b.y && y < b.bottom()
        };
        Frame::from_fn(320, 240, |x, y| {
            if inside(&object, x, y) {
                OBJECT
            } else if inside(&card, x, y) {
                CARD
            } else {
                BACKGROUND
            }
        })
    }

    /// The default scene: a 200x150 card with a 60x40 object.
    pub fn scene() -> Frame {
        card_with_object(
            BoundingBox::new(40, 40, 200, 150),
            BoundingBox::new(100, 80, 60, 40),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::test_frames::*;
    use super::*;

    fn encode_png(frame: &Frame) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            frame.as_raw(),
            frame.width(),
            frame.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn uniform_frame_has_no_contours() {
        let frame = Frame::from_pixel(64, 48, image::Rgba([128, 128, 128, 255]));
        assert!(extract_contours(&frame).is_empty());
        let result = analyze_frame(&frame, &AnalysisConfig::default());
        assert!(matches!(
            result,
            Err(PipelineError::Detection(DetectionError::NoContours))
        ));
    }

    #[test]
    fn card_without_object_has_nothing_to_measure() {
        let frame = card_with_object(
            BoundingBox::new(40, 40, 200, 150),
            BoundingBox::new(0, 0, 0, 0),
        );
        let result = analyze_frame(&frame, &AnalysisConfig::default());
        assert!(matches!(
            result,
            Err(PipelineError::Detection(DetectionError::NoMeasuredObject))
        ));
    }

    #[test]
    fn scene_measures_object_against_card() {
        let fm = analyze_frame(&scene(), &AnalysisConfig::default()).unwrap();

        // Canny edges sit within a pixel or two of the true boundaries.
        let r = fm.selection.reference_box;
        assert!(r.width.abs_diff(200) <= 4, "reference box {r:?}");
        assert!(r.height.abs_diff(150) <= 4, "reference box {r:?}");

        let m = fm.measurement;
        assert!((m.width_cm - 3.0).abs() < 0.2, "width {}", m.width_cm);
        assert!((m.length_cm - 2.0).abs() < 0.2, "length {}", m.length_cm);
    }

    #[test]
    fn annotation_leaves_measurement_unchanged() {
        let frame = scene();
        let fm = analyze_frame(&frame, &AnalysisConfig::default()).unwrap();
        assert_ne!(fm.annotation.image, frame);
        let repeat = analyze_frame(&frame, &AnalysisConfig::default()).unwrap();
        assert_eq!(fm.measurement, repeat.measurement);
        assert_eq!(fm.selection, repeat.selection);
    }

    #[test]
    fn reference_width_scales_result() {
        let frame = scene();
        let a = analyze_frame(&frame, &AnalysisConfig::default()).unwrap();
        let b = analyze_frame(
            &frame,
            &AnalysisConfig {
                reference_width_cm: 20.0,
                ..AnalysisConfig::default()
            },
        )
        .unwrap();
        assert!((a.calibration.pixels_per_cm() - 2.0 * b.calibration.pixels_per_cm()).abs() < 1e-9);
        assert!((b.measurement.width_cm - 2.0 * a.measurement.width_cm).abs() < 1e-9);
    }

    #[test]
    fn image_bytes_are_decoded_and_measured() {
        let fm = analyze_image_bytes(&encode_png(&scene()), &AnalysisConfig::default()).unwrap();
        assert!((fm.measurement.width_cm - 3.0).abs() < 0.2);
    }

    #[test]
    fn image_bytes_reject_invalid_config_first() {
        let config = AnalysisConfig {
            reference_width_cm: 0.0,
            ..AnalysisConfig::default()
        };
        let result = analyze_image_bytes(&[], &config);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn empty_bytes_are_rejected() {
        let result = analyze_image_bytes(&[], &AnalysisConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }
}
