//! Real-world dimensions of the measured object.

use crate::calibrate::Calibration;
use crate::types::{BoundingBox, Measurement};

/// Convert the measured object's bounding box to centimeters.
///
/// Width is the horizontal extent of the box, length the vertical one.
#[must_use]
pub fn compute_dimensions(measured_box: &BoundingBox, calibration: &Calibration) -> Measurement {
    Measurement {
        width_cm: calibration.to_cm(measured_box.width),
        length_cm: calibration.to_cm(measured_box.height),
    }
}
