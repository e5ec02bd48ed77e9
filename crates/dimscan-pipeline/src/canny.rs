//! Canny edge detection on an already smoothed image.
//!
//! Same stages as `imageproc::edges::canny` (Sobel gradients,
//! non-maximum suppression, hysteresis) minus its built-in Gaussian
//! blur: the pipeline smooths once with its own 7x7 kernel, and a
//! second blur would weaken gradients against the fixed thresholds.
//!
//! Gradient magnitude is the L1 norm `|gx| + |gy|`.
//!
//! Hysteresis follows all 8 neighbors and bounds-checks them, so edges
//! touching the image border are tracked without wrapping.

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;

/// Quantized gradient direction used to pick the suppression neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Horizontal,
    Diagonal,
    Vertical,
    AntiDiagonal,
}

impl Direction {
    /// Quantize a gradient vector to the nearest of four directions.
    fn of(gx: f32, gy: f32) -> Self {
        let mut angle = gy.atan2(gx).to_degrees();
        if angle < 0.0 {
            angle += 180.0;
        }
        if (22.5..67.5).contains(&angle) {
            Self::Diagonal
        } else if (67.5..112.5).contains(&angle) {
            Self::Vertical
        } else if (112.5..157.5).contains(&angle) {
            Self::AntiDiagonal
        } else {
            Self::Horizontal
        }
    }

    /// The two neighbors of `(x, y)` across the edge.
    const fn neighbors(self, x: u32, y: u32) -> [(u32, u32); 2] {
        match self {
            Self::Horizontal => [(x - 1, y), (x + 1, y)],
            Self::Diagonal => [(x + 1, y + 1), (x - 1, y - 1)],
            Self::Vertical => [(x, y - 1), (x, y + 1)],
            Self::AntiDiagonal => [(x - 1, y + 1), (x + 1, y - 1)],
        }
    }
}

/// Detect edges in `image` without further smoothing.
///
/// Returns a binary map (0 or 255) of the same size. Images smaller than
/// 3x3 have no interior pixels and yield an empty map.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (w, h) = image.dimensions();
    if w < 3 || h < 3 {
        return GrayImage::new(w, h);
    }

    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);
    let magnitude: Image<Luma<f32>> = Image::from_fn(w, h, |x, y| {
        let dx = f32::from(gx.get_pixel(x, y).0[0]);
        let dy = f32::from(gy.get_pixel(x, y).0[0]);
        Luma([dx.abs() + dy.abs()])
    });

    let thinned = non_maximum_suppression(&magnitude, &gx, &gy);
    hysteresis(&thinned, low, high)
}

/// Zero every pixel that is not a local maximum across its edge.
///
/// The one-pixel border has no complete neighborhood and is always zero.
fn non_maximum_suppression(
    magnitude: &Image<Luma<f32>>,
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
) -> Image<Luma<f32>> {
    let (w, h) = magnitude.dimensions();
    Image::from_fn(w, h, |x, y| {
        if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
            return Luma([0.0]);
        }
        let m = magnitude.get_pixel(x, y).0[0];
        let direction = Direction::of(
            f32::from(gx.get_pixel(x, y).0[0]),
            f32::from(gy.get_pixel(x, y).0[0]),
        );
        let is_max = direction
            .neighbors(x, y)
            .iter()
            .all(|&(nx, ny)| m >= magnitude.get_pixel(nx, ny).0[0]);
        Luma([if is_max { m } else { 0.0 }])
    })
}

/// Keep pixels at or above `high`, plus pixels at or above `low` that are
/// 8-connected to them.
fn hysteresis(input: &Image<Luma<f32>>, low: f32, high: f32) -> GrayImage {
    let (w, h) = input.dimensions();
    let mut out = GrayImage::new(w, h);
    let mut stack = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if input.get_pixel(x, y).0[0] < high || out.get_pixel(x, y).0[0] != 0 {
                continue;
            }
            out.put_pixel(x, y, Luma([255]));
            stack.push((x, y));

            while let Some((cx, cy)) = stack.pop() {
                for (nx, ny) in neighbors8(cx, cy, w, h) {
                    if input.get_pixel(nx, ny).0[0] >= low && out.get_pixel(nx, ny).0[0] == 0 {
                        out.put_pixel(nx, ny, Luma([255]));
                        stack.push((nx, ny));
                    }
                }
            }
        }
    }
    out
}

/// In-bounds 8-neighbors of `(x, y)`.
fn neighbors8(x: u32, y: u32, w: u32, h: u32) -> impl Iterator<Item = (u32, u32)> {
    (-1i64..=1)
        .flat_map(|dy| (-1i64..=1).map(move |dx| (dx, dy)))
        .filter(|&d| d != (0, 0))
        .filter_map(move |(dx, dy)| {
            let nx = u32::try_from(i64::from(x) + dx).ok()?;
            let ny = u32::try_from(i64::from(y) + dy).ok()?;
            (nx < w && ny < h).then_some((nx, ny))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(width: u32, height: u32, at: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| Luma([if x < at { 0 } else { 255 }]))
    }

    #[test]
    fn direction_quantization() {
        assert_eq!(Direction::of(1.0, 0.0), Direction::Horizontal);
        assert_eq!(Direction::of(-1.0, 0.0), Direction::Horizontal);
        assert_eq!(Direction::of(1.0, 1.0), Direction::Diagonal);
        assert_eq!(Direction::of(0.0, 1.0), Direction::Vertical);
        assert_eq!(Direction::of(-1.0, 1.0), Direction::AntiDiagonal);
    }

    #[test]
    fn neighbors_stay_in_bounds_at_corners() {
        assert_eq!(neighbors8(0, 0, 5, 5).count(), 3);
        assert_eq!(neighbors8(4, 4, 5, 5).count(), 3);
        assert_eq!(neighbors8(2, 0, 5, 5).count(), 5);
        assert_eq!(neighbors8(2, 2, 5, 5).count(), 8);
    }

    #[test]
    fn unsmoothed_step_is_a_thin_edge() {
        // Without an internal blur a hard step yields edges only on the
        // two columns either side of the boundary.
        let edges = canny(&step(20, 12, 10), 50.0, 150.0);
        for (x, y, p) in edges.enumerate_pixels() {
            if (1..11).contains(&y) && (x == 9 || x == 10) {
                assert_eq!(p.0[0], 255, "missing edge at ({x}, {y})");
            } else if x != 9 && x != 10 {
                assert_eq!(p.0[0], 0, "stray edge at ({x}, {y})");
            }
        }
    }

    #[test]
    fn weak_gradient_below_low_threshold_is_ignored() {
        // A 10-level step gives an L1 Sobel response of 40.
        let img = GrayImage::from_fn(20, 12, |x, _| Luma([if x < 10 { 100 } else { 110 }]));
        let edges = canny(&img, 50.0, 150.0);
        assert!(edges.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn edge_next_to_border_does_not_panic() {
        let edges = canny(&step(10, 10, 1), 1.0, 2.0);
        assert_eq!(edges.dimensions(), (10, 10));
    }

    #[test]
    fn tiny_image_has_no_edges() {
        let edges = canny(&step(2, 8, 1), 50.0, 150.0);
        assert_eq!(edges.dimensions(), (2, 8));
        assert!(edges.pixels().all(|p| p.0[0] == 0));
    }
}
