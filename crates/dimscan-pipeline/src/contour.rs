//! Contour extraction: turn a binary edge map into a contour forest.
//!
//! Contours are traced with Suzuki-Abe border following via
//! [`imageproc::contours::find_contours`], which reports both outer
//! borders and hole borders together with the index of each contour's
//! parent. The parent links are turned into an arena of
//! [`ContourRecord`]s with explicit first-child / next-sibling links so
//! that the selector can walk a contour's children in a fixed order.
//!
//! # Ordering
//!
//! Contour ids are assigned in border-following discovery order (a
//! raster scan of the edge map). Children are linked in the same order.
//! Selection relies on this order to break ties between contours of
//! equal area, so it must stay reproducible for a given edge map.

use image::GrayImage;
use imageproc::contours::BorderType;

use crate::types::{BoundingBox, Point};

/// Index of a contour within a [`ContourForest`].
pub type ContourId = usize;

/// Whether a contour bounds a foreground region from the outside or
/// encloses a hole inside one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderKind {
    /// Outer boundary of a connected edge component.
    Outer,
    /// Boundary of a background hole enclosed by an edge component.
    Hole,
}

/// One traced contour with its derived metrics and tree links.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourRecord {
    /// Vertex-reduced closed point sequence.
    pub points: Vec<Point>,
    /// Enclosed polygon area in square pixels (always >= 0).
    pub area: f64,
    /// Minimal axis-aligned box around `points`.
    pub bbox: BoundingBox,
    /// Outer or hole border.
    pub kind: BorderKind,
    /// Enclosing contour, if any.
    pub parent: Option<ContourId>,
    /// First directly nested contour.
    pub first_child: Option<ContourId>,
    /// Next contour sharing the same parent.
    pub next_sibling: Option<ContourId>,
}

/// Arena of contours forming a forest of nesting relationships.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourForest {
    records: Vec<ContourRecord>,
}

impl ContourForest {
    /// Trace every contour in a binary edge map.
    ///
    /// Any non-zero pixel counts as an edge. Returns an empty forest when
    /// the map has no edges.
    #[must_use]
    pub fn trace(edges: &GrayImage) -> Self {
        let contours: Vec<imageproc::contours::Contour<u32>> =
            imageproc::contours::find_contours(edges);

        Self::from_chains(contours.into_iter().map(|c| {
            let points = c.points.iter().map(|p| Point::new(p.x, p.y)).collect();
            let kind = match c.border_type {
                BorderType::Outer => BorderKind::Outer,
                BorderType::Hole => BorderKind::Hole,
            };
            (points, kind, c.parent)
        }))
    }

    /// Build a forest from raw point chains and parent indices.
    ///
    /// Chains are vertex-reduced, measured, and linked in iteration order.
    /// Empty chains are kept as zero-area records so that parent indices
    /// stay valid. A parent index that is out of range or refers to the
    /// chain itself is treated as "no parent".
    pub fn from_chains<I>(chains: I) -> Self
    where
        I: IntoIterator<Item = (Vec<Point>, BorderKind, Option<ContourId>)>,
    {
        let mut records: Vec<ContourRecord> = chains
            .into_iter()
            .map(|(points, kind, parent)| {
                let points = compress_chain(points);
                ContourRecord {
                    area: polygon_area(&points),
                    bbox: BoundingBox::from_points(&points).unwrap_or(BoundingBox::new(0, 0, 0, 0)),
                    points,
                    kind,
                    parent,
                    first_child: None,
                    next_sibling: None,
                }
            })
            .collect();

        let len = records.len();
        let mut last_child: Vec<Option<ContourId>> = vec![None; len];
        for id in 0..len {
            let parent = records[id].parent.filter(|&p| p < len && p != id);
            records[id].parent = parent;
            let Some(parent) = parent else {
                continue;
            };
            match last_child[parent] {
                Some(prev) => records[prev].next_sibling = Some(id),
                None => records[parent].first_child = Some(id),
            }
            last_child[parent] = Some(id);
        }

        Self { records }
    }

    /// Number of contours.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no contours were traced.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a contour by id.
    #[must_use]
    pub fn get(&self, id: ContourId) -> Option<&ContourRecord> {
        self.records.get(id)
    }

    /// All contours with their ids, in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (ContourId, &ContourRecord)> {
        self.records.iter().enumerate()
    }

    /// Direct children of `id`, in sibling order.
    #[must_use]
    pub fn children(&self, id: ContourId) -> Children<'_> {
        Children {
            forest: self,
            next: self.get(id).and_then(|r| r.first_child),
        }
    }
}

/// Iterator over the direct children of a contour.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    forest: &'a ContourForest,
    next: Option<ContourId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = (ContourId, &'a ContourRecord);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let record = self.forest.get(id)?;
        self.next = record.next_sibling;
        Some((id, record))
    }
}

/// Drop chain points that continue a straight horizontal, vertical, or
/// diagonal run, keeping only the run endpoints.
///
/// The chain is treated as closed: the last point connects back to the
/// first. Area and bounding box are unchanged by the reduction.
fn compress_chain(mut points: Vec<Point>) -> Vec<Point> {
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    let n = points.len();
    if n < 3 {
        return points;
    }

    let step = |a: Point, b: Point| {
        (
            i64::from(b.x) - i64::from(a.x),
            i64::from(b.y) - i64::from(a.y),
        )
    };

    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect()
}

/// Absolute area of a closed polygon (shoelace formula).
#[allow(clippy::cast_precision_loss)]
fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    twice.abs() as f64 / 2.0
}
