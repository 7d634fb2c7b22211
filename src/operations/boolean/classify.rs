use rand::rngs::StdRng;
use tracing::warn;

use crate::error::{OperationError, Result};
use crate::geometry::Line;
use crate::math::intersect_3d::{line_plane_intersect, point_in_triangle, LinePlaneRelation};
use crate::math::{triangle_centroid, TOLERANCE};
use crate::operations::control::StageWindow;
use crate::topology::{FaceId, FaceStatus, Solid, VertexStatus};

/// How often a classification ray may be re-aimed before giving up.
pub(crate) const MAX_RAY_RETRIES: usize = 64;
/// Magnitude of the random nudge applied to a ray that grazes a face plane.
pub(crate) const RAY_PERTURBATION: f64 = 1e-5;

/// Labels every face of `solid` as inside, outside, or on the surface of
/// `other`. Faces must already be split so that none of them straddles the
/// other solid's surface.
pub(crate) fn classify_faces(
    solid: &mut Solid,
    other: &Solid,
    rng: &mut StdRng,
    window: &StageWindow<'_>,
) -> Result<()> {
    // Step 1: vertices outside the other solid's bounding box cannot be
    // inside it, which settles most of a typical mesh without any rays.
    let other_bounds = other.bounds();
    let vertex_ids: Vec<_> = solid.vertex_ids().collect();
    for id in vertex_ids {
        let vertex = solid.vertex_mut(id)?;
        if vertex.status == VertexStatus::Unknown && !other_bounds.contains_point(&vertex.point) {
            vertex.status = VertexStatus::Outside;
        }
    }

    // Step 2: record vertex adjacency so face verdicts can flood across
    // the surface.
    let face_ids: Vec<_> = solid.face_ids().collect();
    for &face_id in &face_ids {
        let corners = solid.face(face_id)?.vertices;
        for i in 0..3 {
            let j = (i + 1) % 3;
            solid.vertex_mut(corners[i])?.add_adjacent(corners[j]);
            solid.vertex_mut(corners[j])?.add_adjacent(corners[i]);
        }
    }

    // Step 3: classify each face, preferring the verdict already carried
    // by its corners and shooting a ray only when they are undecided.
    let total = face_ids.len();
    for (done, &face_id) in face_ids.iter().enumerate() {
        window.check_cancelled()?;
        let status = match simple_classify(solid, face_id)? {
            Some(status) => status,
            None => ray_trace(solid, face_id, other, rng)?,
        };
        solid.face_mut(face_id)?.status = status;
        propagate(solid, face_id, status)?;
        #[allow(clippy::cast_precision_loss)]
        window.report((done + 1) as f64 / total as f64);
    }
    window.report(1.0);
    Ok(())
}

/// Derives the face status from a corner that already carries a verdict.
/// Boundary corners sit on the other solid's surface and say nothing about
/// which side the face lies on.
fn simple_classify(solid: &Solid, face_id: FaceId) -> Result<Option<FaceStatus>> {
    for corner in solid.face(face_id)?.vertices {
        match solid.vertex(corner)?.status {
            VertexStatus::Inside => return Ok(Some(FaceStatus::Inside)),
            VertexStatus::Outside => return Ok(Some(FaceStatus::Outside)),
            VertexStatus::Unknown | VertexStatus::Boundary => {}
        }
    }
    Ok(None)
}

/// Shoots a ray from the face centroid along its normal and classifies the
/// face by the nearest surface of `other` that the ray hits.
///
/// A ray that grazes a candidate's plane gives no reliable verdict, so it
/// is nudged by a small random amount and retried. The retry count is
/// capped to keep pathological geometry from looping forever.
fn ray_trace(
    solid: &Solid,
    face_id: FaceId,
    other: &Solid,
    rng: &mut StdRng,
) -> Result<FaceStatus> {
    let points = solid.face_points(face_id)?;
    let plane = solid.face_plane(face_id)?;
    let origin = triangle_centroid(&points[0], &points[1], &points[2]);
    let mut ray = Line::new(origin, *plane.normal())?;

    'retry: for _ in 0..MAX_RAY_RETRIES {
        // Nearest accepted hit so far: (distance, normal alignment).
        let mut closest: Option<(f64, f64)> = None;

        for candidate in other.faces_along_ray(ray.origin(), ray.direction()) {
            let candidate_points = other.face_points(candidate)?;
            let candidate_plane = other.face_plane(candidate)?;
            let dot = candidate_plane.normal().dot(ray.direction());

            match line_plane_intersect(&ray, &candidate_plane) {
                LinePlaneRelation::Parallel => {}
                LinePlaneRelation::OnPlane => {
                    ray.perturb(RAY_PERTURBATION, rng);
                    continue 'retry;
                }
                LinePlaneRelation::Point { point, t } => {
                    if t.abs() < TOLERANCE {
                        // The centroid itself lies on the candidate's plane;
                        // if it is on the candidate, the faces coincide.
                        if point_in_triangle(&point, &candidate_points, candidate_plane.normal()) {
                            closest = Some((0.0, dot));
                            break;
                        }
                    } else if t > TOLERANCE
                        && closest.map_or(true, |(best, _)| t < best)
                        && point_in_triangle(&point, &candidate_points, candidate_plane.normal())
                    {
                        closest = Some((t, dot));
                    }
                }
            }
        }

        return Ok(match closest {
            // Nothing ahead of the ray: the face lies outside.
            None => FaceStatus::Outside,
            Some((distance, dot)) if distance < TOLERANCE => {
                if dot > 0.0 {
                    FaceStatus::Same
                } else {
                    FaceStatus::Opposite
                }
            }
            Some((_, dot)) => {
                if dot > 0.0 {
                    // The nearest surface faces away from the ray, so the
                    // ray started behind it.
                    FaceStatus::Inside
                } else {
                    FaceStatus::Outside
                }
            }
        });
    }

    warn!(attempts = MAX_RAY_RETRIES, "ray perturbation retry limit reached");
    Err(OperationError::ClassificationFailed {
        attempts: MAX_RAY_RETRIES,
    }
    .into())
}

/// Writes a face verdict onto its corners and floods inside/outside labels
/// across connected unknown vertices.
///
/// Boundary labels stay on the face's own corners: a coincident face says
/// its corners touch the surface, not that the surrounding region does.
/// Inside and outside may flood because, on a split solid, every region of
/// unknown vertices is fenced in by boundary vertices along the
/// intersection curve.
fn propagate(solid: &mut Solid, face_id: FaceId, status: FaceStatus) -> Result<()> {
    let vertex_status = match status {
        FaceStatus::Inside => VertexStatus::Inside,
        FaceStatus::Outside => VertexStatus::Outside,
        FaceStatus::Same | FaceStatus::Opposite => VertexStatus::Boundary,
        FaceStatus::Unknown => return Ok(()),
    };

    let mut worklist = Vec::new();
    for corner in solid.face(face_id)?.vertices {
        let vertex = solid.vertex_mut(corner)?;
        if vertex.status == VertexStatus::Unknown {
            vertex.status = vertex_status;
            worklist.push(corner);
        }
    }
    if vertex_status == VertexStatus::Boundary {
        return Ok(());
    }

    while let Some(id) = worklist.pop() {
        let adjacent = solid.vertex(id)?.adjacent.clone();
        for neighbor in adjacent {
            let vertex = solid.vertex_mut(neighbor)?;
            if vertex.status == VertexStatus::Unknown {
                vertex.status = vertex_status;
                worklist.push(neighbor);
            }
        }
    }
    Ok(())
}
