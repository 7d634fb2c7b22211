use std::collections::HashMap;

use crate::error::{OperationError, Result};
use crate::geometry::Bounds;
use crate::math::Point3;

/// An indexed triangle mesh: shared vertex positions plus index triples,
/// wound counter-clockwise seen from outside the solid.
///
/// This is the exchange type at the crate boundary. Boolean operations
/// consume and produce it; the arena-based representation used while
/// processing lives in [`Solid`](crate::topology::Solid).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub positions: Vec<Point3>,
    /// Triangles as counter-clockwise index triples into `positions`.
    pub triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Creates a mesh from positions and triangles.
    #[must_use]
    pub fn new(positions: Vec<Point3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
        }
    }

    /// Checks whether the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Returns the number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Tight bounding box over all positions, or `None` for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.positions.iter())
    }

    /// Checks structural soundness: all positions finite and all triangle
    /// indices in range.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] describing the first
    /// violation found.
    pub fn validate(&self) -> Result<()> {
        for (i, position) in self.positions.iter().enumerate() {
            if !position.coords.iter().all(|c| c.is_finite()) {
                return Err(
                    OperationError::InvalidInput(format!("position {i} is not finite")).into(),
                );
            }
        }
        let count = self.positions.len();
        for (i, triangle) in self.triangles.iter().enumerate() {
            if triangle.iter().any(|&v| v as usize >= count) {
                return Err(OperationError::InvalidInput(format!(
                    "triangle {i} references a vertex beyond the {count} positions"
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Signed enclosed volume by the divergence theorem. Meaningful for
    /// closed meshes; positive when wound counter-clockwise.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let mut total = 0.0;
        for triangle in &self.triangles {
            let (Some(a), Some(b), Some(c)) = (
                self.positions.get(triangle[0] as usize),
                self.positions.get(triangle[1] as usize),
                self.positions.get(triangle[2] as usize),
            ) else {
                continue;
            };
            total += a.coords.dot(&b.coords.cross(&c.coords));
        }
        total / 6.0
    }

    /// Checks whether the mesh is a closed two-manifold: every edge shared
    /// by exactly two triangles with opposite directions.
    ///
    /// Closure is an indexed property. Vertices that coincide in space but
    /// are not shared through the index count as open.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        // (forward, backward) uses per undirected edge
        let mut edges: HashMap<(u32, u32), (u32, u32)> = HashMap::new();
        for triangle in &self.triangles {
            for k in 0..3 {
                let a = triangle[k];
                let b = triangle[(k + 1) % 3];
                if a == b {
                    return false;
                }
                let uses = edges.entry((a.min(b), a.max(b))).or_insert((0, 0));
                if a < b {
                    uses.0 += 1;
                } else {
                    uses.1 += 1;
                }
            }
        }
        edges.values().all(|&uses| uses == (1, 1))
    }
}
