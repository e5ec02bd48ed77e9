//! Reference and measured object selection.
//!
//! Given a [`ContourForest`], pick the reference object (the largest
//! candidate contour) and the object to measure. Two strategies find
//! the measured object, tried in order:
//!
//! 1. [`select_by_hierarchy`]: a candidate nested directly inside the
//!    reference contour.
//! 2. [`select_by_containment`]: the largest remaining candidate whose
//!    bounding box lies inside the reference's bounding box.
//!
//! Both strategies reject anything at least [`SIZE_RATIO_LIMIT`] times
//! the reference in either dimension, which keeps the reference's own
//! hole border (or noise hugging it) from being measured as the object.

use crate::contour::{ContourForest, ContourId};
use crate::types::{BoundingBox, DetectionError};

/// Contours with an area at or below this many square pixels are noise.
pub const NOISE_AREA_THRESHOLD: f64 = 100.0;

/// A measured object must be strictly smaller than this fraction of the
/// reference in both width and height.
pub const SIZE_RATIO_LIMIT: f64 = 0.95;

/// Which strategy found the measured object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Direct child of the reference contour.
    Hierarchy,
    /// Bounding box inside the reference's bounding box.
    Containment,
}

/// The outcome of object selection for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Id of the reference contour.
    pub reference: ContourId,
    /// Bounding box of the reference contour.
    pub reference_box: BoundingBox,
    /// Id of the measured contour.
    pub measured: ContourId,
    /// Bounding box of the measured contour.
    pub measured_box: BoundingBox,
    /// Strategy that produced `measured`.
    pub strategy: Strategy,
}

/// Returns `true` if the contour clears the noise threshold.
fn is_candidate(forest: &ContourForest, id: ContourId) -> bool {
    forest
        .get(id)
        .is_some_and(|r| r.area > NOISE_AREA_THRESHOLD)
}

/// Ids of all candidate contours, ordered by descending area.
///
/// Contours of equal area keep their discovery order.
#[must_use]
pub fn ranked_candidates(forest: &ContourForest) -> Vec<ContourId> {
    let mut ranked: Vec<(ContourId, f64)> = forest
        .iter()
        .filter(|(_, r)| r.area > NOISE_AREA_THRESHOLD)
        .map(|(id, r)| (id, r.area))
        .collect();
    // Stable sort: ties stay in discovery order.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().map(|(id, _)| id).collect()
}

/// First child of `reference`, in sibling order, that is a candidate
/// and smaller than the reference in both dimensions.
#[must_use]
pub fn select_by_hierarchy(forest: &ContourForest, reference: ContourId) -> Option<ContourId> {
    let reference_box = forest.get(reference)?.bbox;
    forest
        .children(reference)
        .filter(|&(id, _)| id != reference && is_candidate(forest, id))
        .find(|(_, r)| r.bbox.is_smaller_than(&reference_box, SIZE_RATIO_LIMIT))
        .map(|(id, _)| id)
}

/// First entry of `ranked` (other than `reference`) whose bounding box
/// lies inside the reference's bounding box and is smaller than it in
/// both dimensions.
///
/// `ranked` is expected in descending-area order, as produced by
/// [`ranked_candidates`].
#[must_use]
pub fn select_by_containment(
    forest: &ContourForest,
    ranked: &[ContourId],
    reference: ContourId,
) -> Option<ContourId> {
    let reference_box = forest.get(reference)?.bbox;
    ranked.iter().copied().find(|&id| {
        id != reference
            && forest.get(id).is_some_and(|r| {
                reference_box.contains(&r.bbox)
                    && r.bbox.is_smaller_than(&reference_box, SIZE_RATIO_LIMIT)
            })
    })
}

/// Choose the reference and measured objects.
///
/// # Errors
///
/// Returns [`DetectionError::NoCandidates`] if no contour clears the
/// noise threshold.
/// Returns [`DetectionError::NoMeasuredObject`] if neither strategy
/// finds an object to measure.
pub fn select(forest: &ContourForest) -> Result<Selection, DetectionError> {
    let ranked = ranked_candidates(forest);
    let &reference = ranked.first().ok_or(DetectionError::NoCandidates)?;
    let reference_box = forest
        .get(reference)
        .ok_or(DetectionError::NoCandidates)?
        .bbox;

    let (measured, strategy) = select_by_hierarchy(forest, reference)
        .map(|id| (id, Strategy::Hierarchy))
        .or_else(|| {
            select_by_containment(forest, &ranked, reference).map(|id| (id, Strategy::Containment))
        })
        .ok_or(DetectionError::NoMeasuredObject)?;

    let measured_box = forest
        .get(measured)
        .ok_or(DetectionError::NoMeasuredObject)?
        .bbox;

    tracing::debug!(
        candidates = ranked.len(),
        reference,
        measured,
        ?strategy,
        "selected objects"
    );

    Ok(Selection {
        reference,
        reference_box,
        measured,
        measured_box,
        strategy,
    })
}
