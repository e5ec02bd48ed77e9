//! Canny edge detection.
//!
//! Runs the crate's Canny detector (see [`crate::canny`]) with the fixed
//! thresholds used for measurement. The input is expected to be smoothed
//! already; no further blur is applied. Returns a binary image where
//! white pixels (255) are edges and black pixels (0) are background.

use image::GrayImage;

/// Gradient magnitude below which a pixel is never an edge.
pub const CANNY_LOW: f32 = 50.0;

/// Gradient magnitude above which a pixel is always an edge.
pub const CANNY_HIGH: f32 = 150.0;
const _: () = assert!(CANNY_LOW <= CANNY_HIGH);

/// Detect edges using the Canny algorithm with [`CANNY_LOW`] and
/// [`CANNY_HIGH`].
///
/// Pixels with gradient magnitude above the high threshold are definite
/// edges; those between the thresholds are edges only if connected to a
/// definite edge. Frames smaller than 3x3 have no interior and yield an
/// empty edge map.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage) -> GrayImage {
    crate::canny::canny(image, CANNY_LOW, CANNY_HIGH)
}

/// Returns `true` if the edge map contains at least one edge pixel.
#[must_use]
pub fn has_edges(edges: &GrayImage) -> bool {
    edges.pixels().any(|p| p.0[0] > 0)
}
