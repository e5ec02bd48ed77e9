//! Diagnostic annotation of measured frames.
//!
//! Draws the reference box in green and the measured box in blue on a
//! copy of the frame, with a label above each: `"reference"` in green and
//! the measured dimensions in white. Text is rendered with the bundled
//! DejaVu Sans face. The same labels are also returned as [`Label`]
//! records for callers that describe the artifact without the image.
//!
//! Annotation never feeds back into measurement.

use ab_glyph::{FontRef, PxScale};
use image::Rgba;
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::select::Selection;
use crate::types::{BoundingBox, Frame, Measurement, RgbaImage};

/// Stroke color of the reference box.
pub const REFERENCE_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);

/// Stroke color of the measured box.
pub const MEASURED_COLOR: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Stroke width of both boxes, in pixels.
pub const LINE_THICKNESS: u32 = 2;

/// Color of the dimension label.
pub const DIMENSION_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Vertical gap between a box's top edge and its label anchor.
const LABEL_OFFSET: i32 = 10;

/// Label text height in pixels.
const LABEL_HEIGHT: i16 = 16;

static FONT_DATA: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");

/// A text label attached to an annotated frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label text.
    pub text: String,
    /// Anchor column (left edge of the text).
    pub x: i32,
    /// Anchor row (text baseline); may be negative near the top edge.
    pub y: i32,
}

/// An annotated copy of a frame together with its labels.
#[derive(Debug, Clone)]
pub struct Annotation {
    /// Frame with both boxes drawn.
    pub image: RgbaImage,
    /// `"reference"` label followed by the dimension label.
    pub labels: Vec<Label>,
}

/// Draw the reference and measured boxes and their labels on a copy of
/// `frame`.
#[must_use = "returns the annotated copy"]
pub fn annotate(frame: &Frame, selection: &Selection, measurement: &Measurement) -> Annotation {
    let mut image = frame.clone();
    draw_box(&mut image, &selection.reference_box, REFERENCE_COLOR);
    draw_box(&mut image, &selection.measured_box, MEASURED_COLOR);

    let labels = vec![
        label_above(&selection.reference_box, "reference".to_string()),
        label_above(
            &selection.measured_box,
            format!("{:.2}x{:.2} cm", measurement.width_cm, measurement.length_cm),
        ),
    ];

    match FontRef::try_from_slice(FONT_DATA) {
        Ok(font) => {
            draw_label(&mut image, &font, &labels[0], REFERENCE_COLOR);
            draw_label(&mut image, &font, &labels[1], DIMENSION_COLOR);
        }
        Err(e) => tracing::warn!(error = %e, "label font unavailable, drawing boxes only"),
    }

    Annotation { image, labels }
}

/// Render `label` with its baseline on the anchor row.
///
/// Glyph pixels outside the image are clipped.
fn draw_label(image: &mut RgbaImage, font: &FontRef<'_>, label: &Label, color: Rgba<u8>) {
    let top = label.y - i32::from(LABEL_HEIGHT);
    let scale = PxScale::from(f32::from(LABEL_HEIGHT));
    draw_text_mut(image, color, label.x, top, scale, font, &label.text);
}

#[allow(clippy::cast_possible_wrap)]
fn label_above(bbox: &BoundingBox, text: String) -> Label {
    Label {
        text,
        x: bbox.x as i32,
        y: bbox.y as i32 - LABEL_OFFSET,
    }
}

/// Draw a hollow box `LINE_THICKNESS` pixels wide, growing outward.
///
/// Strokes falling outside the image are clipped.
#[allow(clippy::cast_possible_wrap)]
fn draw_box(image: &mut RgbaImage, bbox: &BoundingBox, color: Rgba<u8>) {
    for t in 0..LINE_THICKNESS {
        let rect = Rect::at(bbox.x as i32 - t as i32, bbox.y as i32 - t as i32)
            .of_size((bbox.width + 2 * t).max(1), (bbox.height + 2 * t).max(1));
        draw_hollow_rect_mut(image, rect, color);
    }
}
