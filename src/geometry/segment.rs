use crate::math::intersect_3d::{line_line_intersect, PointPlaneClassification};
use crate::math::{Point3, TOLERANCE};

use super::Line;

/// Where a cut passes through a triangle: through a corner vertex, along or
/// across an edge, or across the face interior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    Vertex,
    Edge,
    Face,
}

/// One endpoint of a [`Segment`]: the place where the intersection line
/// enters or leaves the triangle.
#[derive(Debug, Clone, Copy)]
pub struct SegmentEnd {
    /// Whether the endpoint sits on a corner or inside an edge.
    pub kind: CutKind,
    /// The endpoint position in 3D.
    pub position: Point3,
    /// Signed distance of the endpoint along the intersection line.
    pub distance: f64,
    /// Corner index for `Vertex` ends; edge index (`i` spans corner `i` to
    /// corner `i + 1`) for `Edge` ends.
    pub index: usize,
}

/// The interval that the intersection line of two face planes covers on one
/// triangle.
///
/// Both triangles of an intersecting pair build their segments against the
/// same line, so endpoint distances are directly comparable between them.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    /// The endpoint with the smaller distance along the line.
    pub start: SegmentEnd,
    /// The endpoint with the larger distance along the line.
    pub end: SegmentEnd,
    /// What the interior of the interval runs through.
    pub middle: CutKind,
}

impl Segment {
    /// Builds the segment where `line` crosses the triangle `points`, given
    /// the classification of each corner against the other face's plane.
    ///
    /// Returns `None` when the line misses the triangle, which only happens
    /// for sign patterns the caller should have filtered out, or when an
    /// edge crossing degenerates.
    #[must_use]
    pub fn from_triangle(
        line: &Line,
        points: &[Point3; 3],
        signs: &[PointPlaneClassification; 3],
    ) -> Option<Self> {
        let mut ends: Vec<SegmentEnd> = Vec::with_capacity(2);

        // Corners lying on the other plane are segment ends themselves.
        for (i, point) in points.iter().enumerate() {
            if signs[i] != PointPlaneClassification::On {
                continue;
            }
            let end = SegmentEnd {
                kind: CutKind::Vertex,
                position: *point,
                distance: line.signed_distance(point),
                index: i,
            };
            ends.push(end);
            // When the other two corners lie on one side, the line touches
            // the triangle in this single point.
            if signs[(i + 1) % 3] == signs[(i + 2) % 3] {
                ends.push(end);
            }
        }

        // Edges whose endpoints straddle the plane cross the line once.
        if ends.len() < 2 {
            for i in 0..3 {
                let j = (i + 1) % 3;
                let straddles = matches!(
                    (signs[i], signs[j]),
                    (PointPlaneClassification::Front, PointPlaneClassification::Back)
                        | (PointPlaneClassification::Back, PointPlaneClassification::Front)
                );
                if !straddles {
                    continue;
                }
                let edge = Line::new(points[i], points[j] - points[i]).ok()?;
                let position = line_line_intersect(line, &edge)?;
                ends.push(SegmentEnd {
                    kind: CutKind::Edge,
                    position,
                    distance: line.signed_distance(&position),
                    index: i,
                });
            }
        }

        if ends.len() != 2 {
            return None;
        }
        let (mut start, mut end) = (ends[0], ends[1]);
        if start.distance > end.distance {
            std::mem::swap(&mut start, &mut end);
        }

        let middle = if start.kind == CutKind::Edge || end.kind == CutKind::Edge {
            CutKind::Face
        } else if start.index == end.index {
            CutKind::Vertex
        } else {
            CutKind::Edge
        };

        Some(Self { start, end, middle })
    }

    /// Checks whether the two segments share more than a tolerance-sized
    /// stretch of the line.
    #[must_use]
    pub fn overlaps(&self, other: &Segment) -> bool {
        !(self.end.distance < other.start.distance + TOLERANCE
            || other.end.distance < self.start.distance + TOLERANCE)
    }
}
