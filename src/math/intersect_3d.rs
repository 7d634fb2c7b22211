use crate::geometry::{Line, Plane};

use super::{Point3, Vector3, TOLERANCE};

/// Relationship between two planes.
#[derive(Debug)]
pub enum PlanePairRelation {
    /// Planes intersect along a line.
    IntersectionLine { origin: Point3, direction: Vector3 },
    /// Planes are parallel but not coincident.
    Parallel { distance: f64 },
    /// Planes are the same (coincident).
    Coincident,
}

/// Computes the intersection of two planes.
///
/// Returns an [`IntersectionLine`](PlanePairRelation::IntersectionLine) with a
/// unit-length `direction` when the planes cross, [`Parallel`](PlanePairRelation::Parallel)
/// when they don't, or [`Coincident`](PlanePairRelation::Coincident) when they overlap.
#[must_use]
pub fn plane_plane_intersect(a: &Plane, b: &Plane) -> PlanePairRelation {
    let na = a.normal();
    let nb = b.normal();

    let dir = na.cross(&nb);
    let dir_len = dir.norm();

    if dir_len < TOLERANCE {
        // Normals are (anti-)parallel, so the planes are parallel or coincident.
        let dist = (na.dot(&nb) * b.offset() - a.offset()).abs();
        if dist < TOLERANCE {
            PlanePairRelation::Coincident
        } else {
            PlanePairRelation::Parallel { distance: dist }
        }
    } else {
        // Find a point on the line by zeroing the coordinate of the dominant
        // direction component and solving the two plane equations in the
        // remaining coordinates.
        let (oa, ob) = (a.offset(), b.offset());
        let (dx, dy, dz) = (dir.x.abs(), dir.y.abs(), dir.z.abs());

        let origin = if dx >= dy && dx >= dz {
            Point3::new(
                0.0,
                (oa * nb.z - ob * na.z) / dir.x,
                (ob * na.y - oa * nb.y) / dir.x,
            )
        } else if dy >= dz {
            Point3::new(
                (ob * na.z - oa * nb.z) / dir.y,
                0.0,
                (oa * nb.x - ob * na.x) / dir.y,
            )
        } else {
            Point3::new(
                (oa * nb.y - ob * na.y) / dir.z,
                (ob * na.x - oa * nb.x) / dir.z,
                0.0,
            )
        };

        PlanePairRelation::IntersectionLine {
            origin,
            direction: dir / dir_len,
        }
    }
}

/// Relationship of a line with a plane.
#[derive(Debug)]
pub enum LinePlaneRelation {
    /// Line intersects the plane at a single point.
    Point { point: Point3, t: f64 },
    /// Line is parallel to the plane (does not intersect).
    Parallel,
    /// Line lies entirely on the plane.
    OnPlane,
}

/// Computes the intersection of a line with a plane.
///
/// The returned `t` is the signed distance from the line origin to the
/// intersection point, since line directions are unit length.
#[must_use]
pub fn line_plane_intersect(line: &Line, plane: &Plane) -> LinePlaneRelation {
    let normal = plane.normal();
    let denom = normal.dot(&line.direction());
    let numer = plane.offset() - normal.dot(&line.origin().coords);

    if denom.abs() < TOLERANCE {
        // Line is parallel to the plane
        if numer.abs() < TOLERANCE {
            LinePlaneRelation::OnPlane
        } else {
            LinePlaneRelation::Parallel
        }
    } else {
        let t = numer / denom;
        LinePlaneRelation::Point {
            point: line.point_at(t),
            t,
        }
    }
}

/// Computes the intersection of two lines.
///
/// Returns the point on `a` nearest to `b`, which is the exact intersection
/// point when the lines are coplanar. Returns `None` for (anti-)parallel
/// lines.
#[must_use]
pub fn line_line_intersect(a: &Line, b: &Line) -> Option<Point3> {
    let cross = a.direction().cross(&b.direction());
    let denom = cross.norm_squared();
    if denom < TOLERANCE {
        return None;
    }

    let diff = b.origin() - a.origin();
    let t = diff.cross(&b.direction()).dot(&cross) / denom;
    Some(a.point_at(t))
}

/// Classification of a point relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointPlaneClassification {
    /// Point is on the positive side (in the direction of the normal).
    Front,
    /// Point is on the negative side (opposite the normal).
    Back,
    /// Point lies on the plane (within tolerance).
    On,
}

/// Classifies a point relative to a plane.
#[must_use]
pub fn classify_point_plane(point: &Point3, plane: &Plane) -> PointPlaneClassification {
    let dist = plane.signed_distance(point);

    if dist > TOLERANCE {
        PointPlaneClassification::Front
    } else if dist < -TOLERANCE {
        PointPlaneClassification::Back
    } else {
        PointPlaneClassification::On
    }
}

/// Tests whether a point lying on a triangle's plane falls inside the
/// triangle. Points on an edge or vertex count as contained.
#[must_use]
pub fn point_in_triangle(point: &Point3, triangle: &[Point3; 3], normal: &Vector3) -> bool {
    // Project out the dominant normal axis and test edge signs in 2D.
    let (u, v) = dominant_plane_axes(normal);
    let pu = point[u];
    let pv = point[v];

    let mut has_pos = false;
    let mut has_neg = false;
    for i in 0..3 {
        let a = &triangle[i];
        let b = &triangle[(i + 1) % 3];
        let cross = (b[u] - a[u]) * (pv - a[v]) - (b[v] - a[v]) * (pu - a[u]);
        if cross > TOLERANCE {
            has_pos = true;
        } else if cross < -TOLERANCE {
            has_neg = true;
        }
    }
    !(has_pos && has_neg)
}

/// Picks the two coordinate axes spanning the plane most perpendicular to
/// `normal`.
fn dominant_plane_axes(normal: &Vector3) -> (usize, usize) {
    let (nx, ny, nz) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
    if nz >= nx && nz >= ny {
        (0, 1)
    } else if ny >= nx {
        (0, 2)
    } else {
        (1, 2)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    // ── plane_plane_intersect ──

    #[test]
    fn perpendicular_planes_intersect() {
        // XY-plane and XZ-plane should intersect along the X-axis
        let xy = Plane::from_normal(&p(0.0, 0.0, 0.0), &v(0.0, 0.0, 1.0)).unwrap();
        let xz = Plane::from_normal(&p(0.0, 0.0, 0.0), &v(0.0, 1.0, 0.0)).unwrap();

        match plane_plane_intersect(&xy, &xz) {
            PlanePairRelation::IntersectionLine { direction, .. } => {
                assert!(
                    direction.x.abs() > 0.99,
                    "expected X-axis direction, got {direction:?}"
                );
            }
            other => panic!("expected IntersectionLine, got {other:?}"),
        }
    }

    #[test]
    fn intersection_point_lies_on_both_planes() {
        let a = Plane::from_normal(&p(1.0, 0.0, 0.0), &v(1.0, 0.0, 0.0)).unwrap();
        let b = Plane::from_normal(&p(0.0, 2.0, 0.0), &v(0.0, 1.0, 0.0)).unwrap();

        match plane_plane_intersect(&a, &b) {
            PlanePairRelation::IntersectionLine { origin, direction } => {
                assert!(a.signed_distance(&origin).abs() < TOLERANCE);
                assert!(b.signed_distance(&origin).abs() < TOLERANCE);
                // Intersection of x = 1 and y = 2 runs along the Z-axis
                assert!(direction.z.abs() > 0.99);
            }
            other => panic!("expected IntersectionLine, got {other:?}"),
        }
    }

    #[test]
    fn oblique_intersection_point_lies_on_both_planes() {
        let a = Plane::from_points(&p(0.3, 0.0, 0.1), &p(1.0, 0.2, 0.0), &p(0.0, 1.0, 0.4))
            .unwrap();
        let b = Plane::from_points(&p(0.0, 0.0, 0.7), &p(1.0, 0.0, 0.2), &p(0.0, 1.0, 0.9))
            .unwrap();

        match plane_plane_intersect(&a, &b) {
            PlanePairRelation::IntersectionLine { origin, direction } => {
                assert!(a.signed_distance(&origin).abs() < 1e-9);
                assert!(b.signed_distance(&origin).abs() < 1e-9);
                // Every point along the line stays on both planes.
                let further = origin + direction * 3.0;
                assert!(a.signed_distance(&further).abs() < 1e-9);
                assert!(b.signed_distance(&further).abs() < 1e-9);
            }
            other => panic!("expected IntersectionLine, got {other:?}"),
        }
    }

    #[test]
    fn parallel_planes() {
        let a = Plane::from_normal(&p(0.0, 0.0, 0.0), &v(0.0, 0.0, 1.0)).unwrap();
        let b = Plane::from_normal(&p(0.0, 0.0, 5.0), &v(0.0, 0.0, 1.0)).unwrap();

        match plane_plane_intersect(&a, &b) {
            PlanePairRelation::Parallel { distance } => {
                assert!((distance - 5.0).abs() < TOLERANCE);
            }
            other => panic!("expected Parallel, got {other:?}"),
        }
    }

    #[test]
    fn coincident_planes() {
        let a = Plane::from_normal(&p(0.0, 0.0, 0.0), &v(0.0, 0.0, 1.0)).unwrap();
        let b = Plane::from_normal(&p(1.0, 2.0, 0.0), &v(0.0, 0.0, 1.0)).unwrap();

        assert!(matches!(
            plane_plane_intersect(&a, &b),
            PlanePairRelation::Coincident
        ));
    }

    #[test]
    fn anti_parallel_planes_are_parallel() {
        let a = Plane::from_normal(&p(0.0, 0.0, 0.0), &v(0.0, 0.0, 1.0)).unwrap();
        let b = Plane::from_normal(&p(0.0, 0.0, 3.0), &v(0.0, 0.0, -1.0)).unwrap();

        match plane_plane_intersect(&a, &b) {
            PlanePairRelation::Parallel { distance } => {
                assert!((distance - 3.0).abs() < TOLERANCE);
            }
            other => panic!("expected Parallel, got {other:?}"),
        }
    }

    // ── line_plane_intersect ──

    #[test]
    fn line_hits_plane() {
        let plane = Plane::from_normal(&p(0.0, 0.0, 5.0), &v(0.0, 0.0, 1.0)).unwrap();
        let line = Line::new(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)).unwrap();
        match line_plane_intersect(&line, &plane) {
            LinePlaneRelation::Point { point, t } => {
                assert!((t - 5.0).abs() < TOLERANCE);
                assert!((point.z - 5.0).abs() < TOLERANCE);
            }
            other => panic!("expected Point, got {other:?}"),
        }
    }

    #[test]
    fn line_parallel_to_plane() {
        let plane = Plane::from_normal(&p(0.0, 0.0, 5.0), &v(0.0, 0.0, 1.0)).unwrap();
        let line = Line::new(p(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0)).unwrap();
        assert!(matches!(
            line_plane_intersect(&line, &plane),
            LinePlaneRelation::Parallel
        ));
    }

    #[test]
    fn line_on_plane() {
        let plane = Plane::from_normal(&p(0.0, 0.0, 0.0), &v(0.0, 0.0, 1.0)).unwrap();
        let line = Line::new(p(1.0, 2.0, 0.0), v(1.0, 0.0, 0.0)).unwrap();
        assert!(matches!(
            line_plane_intersect(&line, &plane),
            LinePlaneRelation::OnPlane
        ));
    }

    #[test]
    fn t_is_signed_distance_for_oblique_hit() {
        let plane = Plane::from_normal(&p(0.0, 0.0, 0.0), &v(0.0, 0.0, 1.0)).unwrap();
        let line = Line::new(p(0.0, 0.0, -3.0), v(0.0, 1.0, 1.0)).unwrap();
        match line_plane_intersect(&line, &plane) {
            LinePlaneRelation::Point { point, t } => {
                // Direction is normalized, so t is the travelled distance.
                let expected = 3.0 * std::f64::consts::SQRT_2;
                assert!((t - expected).abs() < 1e-9);
                assert!(point.z.abs() < 1e-9);
            }
            other => panic!("expected Point, got {other:?}"),
        }
    }

    // ── line_line_intersect ──

    #[test]
    fn crossing_lines_intersect() {
        let a = Line::new(p(-1.0, 0.0, 0.0), v(1.0, 0.0, 0.0)).unwrap();
        let b = Line::new(p(0.0, -1.0, 0.0), v(0.0, 1.0, 0.0)).unwrap();
        let point = line_line_intersect(&a, &b).unwrap();
        assert!((point - p(0.0, 0.0, 0.0)).norm() < TOLERANCE);
    }

    #[test]
    fn parallel_lines_do_not_intersect() {
        let a = Line::new(p(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0)).unwrap();
        let b = Line::new(p(0.0, 1.0, 0.0), v(-1.0, 0.0, 0.0)).unwrap();
        assert!(line_line_intersect(&a, &b).is_none());
    }

    // ── classify_point_plane ──

    #[test]
    fn point_in_front_of_plane() {
        let plane = Plane::from_normal(&p(0.0, 0.0, 0.0), &v(0.0, 0.0, 1.0)).unwrap();
        assert_eq!(
            classify_point_plane(&p(0.0, 0.0, 1.0), &plane),
            PointPlaneClassification::Front
        );
    }

    #[test]
    fn point_behind_plane() {
        let plane = Plane::from_normal(&p(0.0, 0.0, 0.0), &v(0.0, 0.0, 1.0)).unwrap();
        assert_eq!(
            classify_point_plane(&p(0.0, 0.0, -1.0), &plane),
            PointPlaneClassification::Back
        );
    }

    #[test]
    fn point_on_plane() {
        let plane = Plane::from_normal(&p(0.0, 0.0, 0.0), &v(0.0, 0.0, 1.0)).unwrap();
        assert_eq!(
            classify_point_plane(&p(5.0, 3.0, 0.0), &plane),
            PointPlaneClassification::On
        );
    }

    // ── point_in_triangle ──

    #[test]
    fn interior_point_is_contained() {
        let tri = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)];
        let n = v(0.0, 0.0, 1.0);
        assert!(point_in_triangle(&p(0.25, 0.25, 0.0), &tri, &n));
    }

    #[test]
    fn exterior_point_is_not_contained() {
        let tri = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)];
        let n = v(0.0, 0.0, 1.0);
        assert!(!point_in_triangle(&p(0.75, 0.75, 0.0), &tri, &n));
    }

    #[test]
    fn edge_and_vertex_points_are_contained() {
        let tri = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)];
        let n = v(0.0, 0.0, 1.0);
        assert!(point_in_triangle(&p(0.5, 0.0, 0.0), &tri, &n));
        assert!(point_in_triangle(&p(0.5, 0.5, 0.0), &tri, &n));
        assert!(point_in_triangle(&p(1.0, 0.0, 0.0), &tri, &n));
    }

    #[test]
    fn containment_works_for_vertical_triangles() {
        // Triangle in the XZ-plane, normal along Y.
        let tri = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 0.0, 1.0)];
        let n = v(0.0, -1.0, 0.0);
        assert!(point_in_triangle(&p(0.2, 0.0, 0.2), &tri, &n));
        assert!(!point_in_triangle(&p(0.8, 0.0, 0.8), &tri, &n));
    }
}
