//! Pixel-to-centimeter calibration from the reference object.

use crate::types::ConfigError;

/// Scale factor between frame pixels and real-world centimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pixels_per_cm: f64,
}

impl Calibration {
    /// Calibrate from the reference object's bounding-box width.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositiveReferenceWidth`] if
    /// `reference_width_cm` is not a positive finite number. Runs reject
    /// such configurations up front via
    /// [`AnalysisConfig::validate`](crate::AnalysisConfig::validate), so
    /// this only fires for direct callers.
    pub fn from_reference(
        reference_width_px: u32,
        reference_width_cm: f64,
    ) -> Result<Self, ConfigError> {
        if !reference_width_cm.is_finite() || reference_width_cm <= 0.0 {
            return Err(ConfigError::NonPositiveReferenceWidth(reference_width_cm));
        }
        Ok(Self {
            pixels_per_cm: f64::from(reference_width_px) / reference_width_cm,
        })
    }

    /// Pixels per centimeter.
    #[must_use]
    pub const fn pixels_per_cm(&self) -> f64 {
        self.pixels_per_cm
    }

    /// Convert a pixel length to centimeters.
    #[must_use]
    pub fn to_cm(&self, pixels: u32) -> f64 {
        f64::from(pixels) / self.pixels_per_cm
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_pixels_over_centimeters() {
        let c = Calibration::from_reference(200, 10.0).unwrap();
        assert!((c.pixels_per_cm() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn doubling_reference_width_halves_ratio() {
        let a = Calibration::from_reference(300, 10.0).unwrap();
        let b = Calibration::from_reference(300, 20.0).unwrap();
        assert!((a.pixels_per_cm() - 2.0 * b.pixels_per_cm()).abs() < 1e-12);
        assert!((b.to_cm(90) - 2.0 * a.to_cm(90)).abs() < 1e-12);
    }

    #[test]
    fn to_cm_divides_by_ratio() {
        let c = Calibration::from_reference(200, 10.0).unwrap();
        assert!((c.to_cm(60) - 3.0).abs() < 1e-12);
        assert!((c.to_cm(40) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn non_positive_width_is_rejected() {
        for width in [0.0, -5.0, f64::NAN] {
            assert!(matches!(
                Calibration::from_reference(200, width),
                Err(ConfigError::NonPositiveReferenceWidth(_))
            ));
        }
    }
}
