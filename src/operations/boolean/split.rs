use tracing::trace;

use crate::error::Result;
use crate::geometry::{CutKind, Line, Segment};
use crate::math::intersect_3d::{
    classify_point_plane, plane_plane_intersect, PlanePairRelation, PointPlaneClassification,
};
use crate::math::{triangle_area, Point3, TOLERANCE};
use crate::operations::control::StageWindow;
use crate::topology::{FaceId, Solid, VertexId, VertexStatus};

/// Subdivides `solid`'s faces until none of them improperly crosses a face
/// of `other`. Afterwards every mutual intersection runs along shared
/// vertices and edges.
///
/// Faces produced by a split go back onto the work stack, so they are
/// themselves tested against the remaining candidates before the pass
/// completes.
pub(crate) fn split_faces(
    solid: &mut Solid,
    other: &Solid,
    window: &StageWindow<'_>,
) -> Result<()> {
    let mut stack: Vec<FaceId> = solid.face_ids().collect();
    let other_bounds = other.bounds();
    let mut processed = 0_usize;

    while let Some(face_id) = stack.pop() {
        window.check_cancelled()?;
        processed += 1;
        #[allow(clippy::cast_precision_loss)]
        window.report(processed as f64 / (processed + stack.len()) as f64);

        // Ids already consumed by an earlier split are tombstones.
        if !solid.contains_face(face_id) {
            continue;
        }
        let bounds = solid.face(face_id)?.bounds;
        if !bounds.overlaps(&other_bounds) {
            continue;
        }

        for candidate in other.search_faces(&bounds) {
            if let Some(replacements) = split_pair(solid, face_id, other, candidate)? {
                trace!(fragments = replacements.len(), "face split");
                stack.extend(replacements);
                break;
            }
        }
    }
    window.report(1.0);
    Ok(())
}

/// Tests one face pair and splits `face_id` where the pair genuinely
/// intersects. Returns the replacement face ids, or `None` when the face
/// was left alone.
fn split_pair(
    solid: &mut Solid,
    face_id: FaceId,
    other: &Solid,
    other_id: FaceId,
) -> Result<Option<Vec<FaceId>>> {
    let points = solid.face_points(face_id)?;
    let other_points = other.face_points(other_id)?;
    let plane = solid.face_plane(face_id)?;
    let other_plane = other.face_plane(other_id)?;

    // A face whose corners all lie strictly on one side of the other face's
    // plane cannot cross it.
    let signs = [
        classify_point_plane(&points[0], &other_plane),
        classify_point_plane(&points[1], &other_plane),
        classify_point_plane(&points[2], &other_plane),
    ];
    if one_sided(&signs) {
        return Ok(None);
    }
    let other_signs = [
        classify_point_plane(&other_points[0], &plane),
        classify_point_plane(&other_points[1], &plane),
        classify_point_plane(&other_points[2], &plane),
    ];
    if one_sided(&other_signs) {
        return Ok(None);
    }

    // Coplanar pairs are resolved by classification, not by splitting.
    let PlanePairRelation::IntersectionLine { origin, direction } =
        plane_plane_intersect(&plane, &other_plane)
    else {
        return Ok(None);
    };
    let line = Line::new(origin, direction)?;

    let Some(segment) = Segment::from_triangle(&line, &points, &signs) else {
        return Ok(None);
    };
    let Some(other_segment) = Segment::from_triangle(&line, &other_points, &other_signs) else {
        return Ok(None);
    };
    if !segment.overlaps(&other_segment) {
        return Ok(None);
    }

    split_face(solid, face_id, &segment, &other_segment)
}

fn one_sided(signs: &[PointPlaneClassification; 3]) -> bool {
    signs.iter().all(|s| *s == PointPlaneClassification::Front)
        || signs.iter().all(|s| *s == PointPlaneClassification::Back)
}

/// Splits one face along the stretch both segments share, dispatching on
/// where the cut starts, runs, and ends (corner, edge, or interior).
fn split_face(
    solid: &mut Solid,
    face_id: FaceId,
    segment: &Segment,
    other: &Segment,
) -> Result<Option<Vec<FaceId>>> {
    // Clip this face's interval to the shared stretch: the later start and
    // the earlier end win. A clipped endpoint moves into the interval's
    // interior, so it takes on the middle kind.
    let (start_kind, start_pos, start_dist) =
        if other.start.distance > segment.start.distance + TOLERANCE {
            (segment.middle, other.start.position, other.start.distance)
        } else {
            (
                segment.start.kind,
                segment.start.position,
                segment.start.distance,
            )
        };
    let (end_kind, end_pos, end_dist) = if other.end.distance < segment.end.distance - TOLERANCE {
        (segment.middle, other.end.position, other.end.distance)
    } else {
        (segment.end.kind, segment.end.position, segment.end.distance)
    };

    // Corners hit by the cut lie on the other solid's surface.
    let corners = solid.face(face_id)?.vertices;
    if start_kind == CutKind::Vertex {
        solid.vertex_mut(corners[segment.start.index])?.status = VertexStatus::Boundary;
    }
    if end_kind == CutKind::Vertex {
        solid.vertex_mut(corners[segment.end.index])?.status = VertexStatus::Boundary;
    }

    let candidates = match (start_kind, segment.middle, end_kind) {
        // The cut only touches existing corners; nothing to subdivide.
        (CutKind::Vertex, _, CutKind::Vertex) => return Ok(None),

        // The cut runs along one edge of the face.
        (_, CutKind::Edge, _) => {
            let edge = edge_between(segment.start.index, segment.end.index);
            match (start_kind, end_kind) {
                (CutKind::Vertex, _) => break_in_two(solid, &corners, edge, &end_pos),
                (_, CutKind::Vertex) => break_in_two(solid, &corners, edge, &start_pos),
                _ if end_dist - start_dist < TOLERANCE => {
                    break_in_two(solid, &corners, edge, &end_pos)
                }
                // Both cut points fall inside the edge; order them in the
                // winding direction from the edge's first corner.
                _ => {
                    if (segment.start.index + 1) % 3 == segment.end.index {
                        break_along_edge(solid, &corners, edge, &start_pos, &end_pos)
                    } else {
                        break_along_edge(solid, &corners, edge, &end_pos, &start_pos)
                    }
                }
            }
        }

        // The cut crosses the interior from a corner or an edge.
        (CutKind::Vertex, _, CutKind::Edge) => {
            break_in_two(solid, &corners, segment.end.index, &end_pos)
        }
        (CutKind::Edge, _, CutKind::Vertex) => {
            break_in_two(solid, &corners, segment.start.index, &start_pos)
        }
        (CutKind::Vertex, _, CutKind::Face) => break_fan(solid, &corners, &end_pos),
        (CutKind::Face, _, CutKind::Vertex) => break_fan(solid, &corners, &start_pos),
        (CutKind::Edge, _, CutKind::Edge) => break_across(
            solid,
            &corners,
            segment.start.index,
            segment.end.index,
            &start_pos,
            &end_pos,
        ),
        (CutKind::Edge, _, CutKind::Face) => {
            break_toward_interior(solid, &corners, segment.start.index, &start_pos, &end_pos)
        }
        (CutKind::Face, _, CutKind::Edge) => {
            break_toward_interior(solid, &corners, segment.end.index, &end_pos, &start_pos)
        }

        // The cut lies entirely inside the face.
        (CutKind::Face, _, CutKind::Face) => {
            let span = start_pos - end_pos;
            if span.x.abs() < TOLERANCE && span.y.abs() < TOLERANCE && span.z.abs() < TOLERANCE {
                break_fan(solid, &corners, &start_pos)
            } else {
                let points = solid.face_points(face_id)?;
                break_around_corner(solid, &corners, &points, &start_pos, &end_pos)
            }
        }
    };

    // A cut point that welded onto an existing corner degrades the case:
    // candidate triangles with repeated corners or no area drop out.
    let mut replacements: Vec<[VertexId; 3]> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if candidate[0] == candidate[1]
            || candidate[1] == candidate[2]
            || candidate[2] == candidate[0]
        {
            continue;
        }
        let a = solid.vertex(candidate[0])?.point;
        let b = solid.vertex(candidate[1])?.point;
        let c = solid.vertex(candidate[2])?.point;
        if triangle_area(&a, &b, &c) <= TOLERANCE {
            continue;
        }
        replacements.push(candidate);
    }

    // When everything degrades back to the original triangle, the pair
    // needed no split after all.
    if replacements.is_empty()
        || (replacements.len() == 1 && same_triangle(&replacements[0], &corners))
    {
        return Ok(None);
    }

    solid.remove_face(face_id)?;
    let mut added = Vec::with_capacity(replacements.len());
    for replacement in replacements {
        if let Some(id) = solid.add_face(replacement)? {
            added.push(id);
        }
    }
    Ok(Some(added))
}

/// The edge index spanning two distinct corner indices.
fn edge_between(a: usize, b: usize) -> usize {
    if (a + 1) % 3 == b {
        a
    } else {
        b
    }
}

fn same_triangle(a: &[VertexId; 3], b: &[VertexId; 3]) -> bool {
    (0..3).any(|shift| (0..3).all(|i| a[i] == b[(i + shift) % 3]))
}

/// Splits edge `edge` at `cut`, yielding two faces.
fn break_in_two(
    solid: &mut Solid,
    corners: &[VertexId; 3],
    edge: usize,
    cut: &Point3,
) -> Vec<[VertexId; 3]> {
    let mid = solid.add_vertex(*cut, VertexStatus::Boundary);
    let a = corners[edge];
    let b = corners[(edge + 1) % 3];
    let c = corners[(edge + 2) % 3];
    vec![[a, mid, c], [mid, b, c]]
}

/// Splits edge `edge` at two interior points, yielding three faces. The
/// points must be ordered along the winding direction of the edge.
fn break_along_edge(
    solid: &mut Solid,
    corners: &[VertexId; 3],
    edge: usize,
    first: &Point3,
    second: &Point3,
) -> Vec<[VertexId; 3]> {
    let p1 = solid.add_vertex(*first, VertexStatus::Boundary);
    let p2 = solid.add_vertex(*second, VertexStatus::Boundary);
    let a = corners[edge];
    let b = corners[(edge + 1) % 3];
    let c = corners[(edge + 2) % 3];
    vec![[a, p1, c], [p1, p2, c], [p2, b, c]]
}

/// Fans the face around one interior point, yielding three faces.
fn break_fan(solid: &mut Solid, corners: &[VertexId; 3], interior: &Point3) -> Vec<[VertexId; 3]> {
    let p = solid.add_vertex(*interior, VertexStatus::Boundary);
    vec![
        [corners[0], corners[1], p],
        [corners[1], corners[2], p],
        [corners[2], corners[0], p],
    ]
}

/// Splits a face whose cut enters on one edge and leaves on another,
/// yielding three faces. The corner between the two edges ends up isolated
/// in its own triangle.
fn break_across(
    solid: &mut Solid,
    corners: &[VertexId; 3],
    entry: usize,
    exit: usize,
    entry_pos: &Point3,
    exit_pos: &Point3,
) -> Vec<[VertexId; 3]> {
    let p1 = solid.add_vertex(*entry_pos, VertexStatus::Boundary);
    let p2 = solid.add_vertex(*exit_pos, VertexStatus::Boundary);
    let a = corners[entry];
    let b = corners[(entry + 1) % 3];
    let c = corners[(entry + 2) % 3];
    if (entry + 1) % 3 == exit {
        vec![[a, p1, p2], [a, p2, c], [p1, b, p2]]
    } else {
        vec![[a, p1, p2], [c, p2, p1], [c, p1, b]]
    }
}

/// Splits a face whose cut enters on edge `edge` and ends inside the face,
/// yielding four faces around the interior point.
fn break_toward_interior(
    solid: &mut Solid,
    corners: &[VertexId; 3],
    edge: usize,
    edge_pos: &Point3,
    interior_pos: &Point3,
) -> Vec<[VertexId; 3]> {
    let p1 = solid.add_vertex(*edge_pos, VertexStatus::Boundary);
    let p2 = solid.add_vertex(*interior_pos, VertexStatus::Boundary);
    let a = corners[edge];
    let b = corners[(edge + 1) % 3];
    let c = corners[(edge + 2) % 3];
    vec![[a, p1, p2], [p1, b, p2], [b, c, p2], [c, a, p2]]
}

/// Splits a face whose cut lies entirely in the interior, yielding five
/// faces. The subdivision hangs off the corner most aligned with the cut,
/// with the far cut point bridging the opposite edge.
fn break_around_corner(
    solid: &mut Solid,
    corners: &[VertexId; 3],
    points: &[Point3; 3],
    start: &Point3,
    end: &Point3,
) -> Vec<[VertexId; 3]> {
    let span = (start - end).normalize();
    let mut lined = 0;
    let mut best = -1.0;
    for (i, corner) in points.iter().enumerate() {
        let toward = end - corner;
        let len = toward.norm();
        if len < TOLERANCE {
            continue;
        }
        let dot = span.dot(&toward).abs() / len;
        if dot > best {
            best = dot;
            lined = i;
        }
    }

    let (far, near) = if (points[lined] - start).norm() > (points[lined] - end).norm() {
        (start, end)
    } else {
        (end, start)
    };
    let p1 = solid.add_vertex(*far, VertexStatus::Boundary);
    let p2 = solid.add_vertex(*near, VertexStatus::Boundary);
    let a = corners[lined];
    let b = corners[(lined + 1) % 3];
    let c = corners[(lined + 2) % 3];
    vec![
        [b, c, p1],
        [b, p1, p2],
        [c, p2, p1],
        [b, p2, a],
        [c, a, p2],
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use crate::mesh::TriangleMesh;
    use crate::operations::control::{CancelToken, OpControl, Stage};

    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn cube(min: Point3, size: f64) -> TriangleMesh {
        let (x, y, z, s) = (min.x, min.y, min.z, size);
        TriangleMesh::new(
            vec![
                p(x, y, z),
                p(x + s, y, z),
                p(x + s, y + s, z),
                p(x, y + s, z),
                p(x, y, z + s),
                p(x + s, y, z + s),
                p(x + s, y + s, z + s),
                p(x, y + s, z + s),
            ],
            vec![
                [0, 2, 1],
                [0, 3, 2],
                [4, 5, 6],
                [4, 6, 7],
                [0, 1, 5],
                [0, 5, 4],
                [1, 2, 6],
                [1, 6, 5],
                [2, 3, 7],
                [2, 7, 6],
                [3, 0, 4],
                [3, 4, 7],
            ],
        )
    }

    fn surface_area(solid: &Solid) -> f64 {
        solid
            .face_ids()
            .map(|id| {
                let [a, b, c] = solid.face_points(id).unwrap();
                triangle_area(&a, &b, &c)
            })
            .sum()
    }

    fn run_split(solid: &mut Solid, other: &Solid) {
        let control = OpControl {
            progress: None,
            cancel: None,
        };
        let window = control.window(Stage::Split, 0.0, 1.0);
        split_faces(solid, other, &window).unwrap();
    }

    #[test]
    fn intersecting_faces_get_subdivided() {
        let mut a = Solid::from_mesh(&cube(p(0.0, 0.0, 0.0), 1.0)).unwrap();
        let b = Solid::from_mesh(&cube(p(0.5, 0.5, 0.5), 1.0)).unwrap();
        let area_before = surface_area(&a);

        run_split(&mut a, &b);
        assert!(
            a.face_count() > 12,
            "expected subdivision, got {} faces",
            a.face_count()
        );
        // Subdivision rearranges the surface without changing it.
        assert_relative_eq!(surface_area(&a), area_before, epsilon = 1e-9);
    }

    #[test]
    fn resplitting_is_a_fixed_point() {
        let mut a = Solid::from_mesh(&cube(p(0.0, 0.0, 0.0), 1.0)).unwrap();
        let mut b = Solid::from_mesh(&cube(p(0.5, 0.5, 0.5), 1.0)).unwrap();
        run_split(&mut a, &b);
        run_split(&mut b, &a);
        let faces_a = a.face_count();
        let faces_b = b.face_count();

        run_split(&mut a, &b);
        run_split(&mut b, &a);
        assert_eq!(a.face_count(), faces_a);
        assert_eq!(b.face_count(), faces_b);
    }

    #[test]
    fn coplanar_faces_are_not_split() {
        let mut a = Solid::from_mesh(&cube(p(0.0, 0.0, 0.0), 1.0)).unwrap();
        let b = Solid::from_mesh(&cube(p(0.0, 0.0, 0.0), 1.0)).unwrap();
        run_split(&mut a, &b);
        assert_eq!(a.face_count(), 12);
    }

    #[test]
    fn disjoint_solids_are_untouched() {
        let mut a = Solid::from_mesh(&cube(p(0.0, 0.0, 0.0), 1.0)).unwrap();
        let b = Solid::from_mesh(&cube(p(5.0, 5.0, 5.0), 1.0)).unwrap();
        run_split(&mut a, &b);

        assert_eq!(a.face_count(), 12);
        for id in a.vertex_ids() {
            assert_eq!(a.vertex(id).unwrap().status, VertexStatus::Unknown);
        }
    }

    #[test]
    fn touching_faces_mark_boundary_vertices() {
        // Two cubes stacked along z, sharing the z = 1 plane. The shared
        // ring is marked without any subdivision.
        let mut a = Solid::from_mesh(&cube(p(0.0, 0.0, 0.0), 1.0)).unwrap();
        let b = Solid::from_mesh(&cube(p(0.0, 0.0, 1.0), 1.0)).unwrap();
        run_split(&mut a, &b);

        assert_eq!(a.face_count(), 12);
        let boundary = a
            .vertex_ids()
            .filter(|id| a.vertex(*id).unwrap().status == VertexStatus::Boundary)
            .count();
        assert_eq!(boundary, 4, "expected the shared ring to be marked");
    }

    #[test]
    fn cancellation_stops_splitting() {
        let mut a = Solid::from_mesh(&cube(p(0.0, 0.0, 0.0), 1.0)).unwrap();
        let b = Solid::from_mesh(&cube(p(0.5, 0.5, 0.5), 1.0)).unwrap();

        let token = CancelToken::new();
        token.cancel();
        let control = OpControl {
            progress: None,
            cancel: Some(token),
        };
        let window = control.window(Stage::Split, 0.0, 1.0);
        let err = split_faces(&mut a, &b, &window).unwrap_err();
        assert!(err.is_cancelled());
    }
}
