//! Gaussian smoothing for noise reduction before edge detection.
//!
//! Uses a fixed 7x7 neighborhood, applied as two separable 1-D passes
//! via [`imageproc::filter::separable_filter_equal`]. Both passes run on
//! `f32` intensities and the result is rounded once at the end, so flat
//! regions keep their exact value. Sensor noise would
//! otherwise produce spurious short edges in the Canny detector, which
//! turn into small contours that compete with the objects being measured.

use image::{GrayImage, ImageBuffer, Luma};

/// Side length of the smoothing neighborhood in pixels.
pub const KERNEL_SIZE: usize = 7;
const _: () = assert!(KERNEL_SIZE % 2 == 1);

/// Standard deviation matching the kernel size.
///
/// Derived with the usual rule for an automatic sigma,
/// `0.3 * ((size - 1) / 2 - 1) + 0.8`, which gives 1.4 for a 7-tap kernel.
#[allow(clippy::cast_precision_loss)]
pub const SIGMA: f32 = 0.3 * ((KERNEL_SIZE as f32 - 1.0) * 0.5 - 1.0) + 0.8;

/// Normalized 1-D Gaussian weights for [`KERNEL_SIZE`] taps.
#[allow(clippy::cast_precision_loss)]
fn kernel() -> [f32; KERNEL_SIZE] {
    let half = (KERNEL_SIZE / 2) as f32;
    let mut weights: [f32; KERNEL_SIZE] = std::array::from_fn(|i| {
        let d = i as f32 - half;
        (-(d * d) / (2.0 * SIGMA * SIGMA)).exp()
    });
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Smooth a grayscale image with the fixed 7x7 Gaussian.
#[must_use = "returns the blurred image"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn gaussian_blur(image: &GrayImage) -> GrayImage {
    let intensities: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
            Luma([f32::from(image.get_pixel(x, y).0[0])])
        });
    let blurred = imageproc::filter::separable_filter_equal(&intensities, &kernel());
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([blurred.get_pixel(x, y).0[0].round().clamp(0.0, 255.0) as u8])
    })
}
