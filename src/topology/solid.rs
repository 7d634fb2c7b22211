use std::collections::HashMap;

use slotmap::SlotMap;

use crate::error::{Result, TopologyError};
use crate::geometry::{Bounds, Plane};
use crate::math::{triangle_area, Point3, Vector3, TOLERANCE};
use crate::mesh::TriangleMesh;
use crate::octree::Octree;

use super::face::{FaceData, FaceId};
use super::vertex::{VertexData, VertexId, VertexStatus};

/// Distance under which two vertex positions are merged into one vertex.
pub const WELD_TOLERANCE: f64 = 1e-6;

/// One solid prepared for boolean processing: vertex and face arenas, a
/// spatial index over face bounds, and the overall bounding box.
///
/// Vertices are welded by position and never removed. Faces are immutable;
/// splitting removes a face and inserts its replacements, so `FaceId`s may
/// go stale while vertex ids stay valid for the lifetime of the solid.
#[derive(Debug)]
pub struct Solid {
    vertices: SlotMap<VertexId, VertexData>,
    faces: SlotMap<FaceId, FaceData>,
    index: Octree<FaceId>,
    bounds: Bounds,
    lookup: WeldMap<VertexId>,
}

impl Solid {
    /// Ingests a triangle mesh, welding coincident vertex positions so that
    /// faces meeting at a point share one vertex entry.
    ///
    /// # Errors
    ///
    /// Returns an error when the mesh fails [`TriangleMesh::validate`].
    /// Degenerate triangles (repeated corners or near-zero area) are
    /// silently dropped.
    pub fn from_mesh(mesh: &TriangleMesh) -> Result<Self> {
        mesh.validate()?;

        let origin = Point3::new(0.0, 0.0, 0.0);
        let bounds = mesh.bounds().unwrap_or(Bounds::new(origin, origin));
        let mut solid = Self {
            vertices: SlotMap::with_key(),
            faces: SlotMap::with_key(),
            index: Octree::new(bounds),
            bounds,
            lookup: WeldMap::new(),
        };

        for triangle in &mesh.triangles {
            let corners = [
                solid.add_vertex(mesh.positions[triangle[0] as usize], VertexStatus::Unknown),
                solid.add_vertex(mesh.positions[triangle[1] as usize], VertexStatus::Unknown),
                solid.add_vertex(mesh.positions[triangle[2] as usize], VertexStatus::Unknown),
            ];
            solid.add_face(corners)?;
        }
        Ok(solid)
    }

    /// Returns the bounding box of the whole solid.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Returns the number of live faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Iterates over all live face ids.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.keys()
    }

    /// Iterates over all vertex ids.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys()
    }

    /// Checks whether the face id is still live.
    #[must_use]
    pub fn contains_face(&self, id: FaceId) -> bool {
        self.faces.contains_key(id)
    }

    /// Returns a reference to the vertex data.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the solid.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()).into())
    }

    /// Returns a mutable reference to the vertex data.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the solid.
    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()).into())
    }

    /// Returns a reference to the face data.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the solid.
    pub fn face(&self, id: FaceId) -> Result<&FaceData> {
        self.faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()).into())
    }

    /// Returns a mutable reference to the face data.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the solid.
    pub fn face_mut(&mut self, id: FaceId) -> Result<&mut FaceData> {
        self.faces
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()).into())
    }

    /// Returns the corner positions of a face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or one of its vertices is not found.
    pub fn face_points(&self, id: FaceId) -> Result<[Point3; 3]> {
        let face = self.face(id)?;
        Ok([
            self.vertex(face.vertices[0])?.point,
            self.vertex(face.vertices[1])?.point,
            self.vertex(face.vertices[2])?.point,
        ])
    }

    /// Returns the supporting plane of a face, computing and caching it on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is not found. Plane construction cannot
    /// fail because degenerate faces are rejected at insertion.
    pub fn face_plane(&self, id: FaceId) -> Result<Plane> {
        let face = self.face(id)?;
        if let Some(plane) = face.cached_plane() {
            return Ok(*plane);
        }
        let [a, b, c] = self.face_points(id)?;
        let plane = Plane::from_points(&a, &b, &c)?;
        self.face(id)?.cache_plane(plane);
        Ok(plane)
    }

    /// Adds a vertex, welding it onto an existing vertex when one lies
    /// within [`WELD_TOLERANCE`]. The status is applied either way, so a
    /// reused vertex takes on the caller's classification.
    pub fn add_vertex(&mut self, point: Point3, status: VertexStatus) -> VertexId {
        if let Some(existing) = self.lookup.get(&point) {
            if let Some(vertex) = self.vertices.get_mut(existing) {
                vertex.status = status;
            }
            return existing;
        }
        let mut data = VertexData::new(point);
        data.status = status;
        let id = self.vertices.insert(data);
        self.lookup.insert(point, id);
        id
    }

    /// Adds a face over three existing vertices and indexes it.
    ///
    /// Returns `Ok(None)` for degenerate triangles: repeated corners or an
    /// area within tolerance of zero. Those are dropped silently.
    ///
    /// # Errors
    ///
    /// Returns an error if a corner vertex is not found.
    pub fn add_face(&mut self, corners: [VertexId; 3]) -> Result<Option<FaceId>> {
        if corners[0] == corners[1] || corners[1] == corners[2] || corners[2] == corners[0] {
            return Ok(None);
        }
        let a = self.vertex(corners[0])?.point;
        let b = self.vertex(corners[1])?.point;
        let c = self.vertex(corners[2])?.point;
        if triangle_area(&a, &b, &c) <= TOLERANCE {
            return Ok(None);
        }

        let bounds = Bounds::from_triangle(&a, &b, &c);
        let id = self.faces.insert(FaceData::new(corners, bounds));
        self.index.insert(id, bounds);
        Ok(Some(id))
    }

    /// Removes a face from the arena and the spatial index. Its vertices
    /// stay, since other faces may share them.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is not found.
    pub fn remove_face(&mut self, id: FaceId) -> Result<()> {
        let bounds = self.face(id)?.bounds;
        self.index.remove(&id, &bounds);
        self.faces.remove(id);
        Ok(())
    }

    /// Collects the faces whose bounds overlap the query box.
    #[must_use]
    pub fn search_faces(&self, query: &Bounds) -> Vec<FaceId> {
        self.index.search_bounds(query)
    }

    /// Collects the faces whose bounds lie along the ray.
    #[must_use]
    pub fn faces_along_ray(&self, origin: &Point3, direction: &Vector3) -> Vec<FaceId> {
        self.index.along_ray(origin, direction)
    }
}

/// Spatial hash over quantized positions backing vertex welding.
///
/// Cells are two weld tolerances wide, so a lookup only has to probe the
/// cells touched by the tolerance ball around the query point.
#[derive(Debug)]
pub(crate) struct WeldMap<V> {
    cells: HashMap<[i64; 3], Vec<(Point3, V)>>,
}

const WELD_CELL: f64 = WELD_TOLERANCE * 2.0;

impl<V: Copy> WeldMap<V> {
    pub(crate) fn new() -> Self {
        Self {
            cells: HashMap::new(),
        }
    }

    /// Finds the value stored within [`WELD_TOLERANCE`] of `point`.
    pub(crate) fn get(&self, point: &Point3) -> Option<V> {
        let lo = cell_key(&Point3::new(
            point.x - WELD_TOLERANCE,
            point.y - WELD_TOLERANCE,
            point.z - WELD_TOLERANCE,
        ));
        let hi = cell_key(&Point3::new(
            point.x + WELD_TOLERANCE,
            point.y + WELD_TOLERANCE,
            point.z + WELD_TOLERANCE,
        ));

        for x in lo[0]..=hi[0] {
            for y in lo[1]..=hi[1] {
                for z in lo[2]..=hi[2] {
                    let Some(entries) = self.cells.get(&[x, y, z]) else {
                        continue;
                    };
                    for (held, value) in entries {
                        if (held - point).norm() < WELD_TOLERANCE {
                            return Some(*value);
                        }
                    }
                }
            }
        }
        None
    }

    pub(crate) fn insert(&mut self, point: Point3, value: V) {
        self.cells.entry(cell_key(&point)).or_default().push((point, value));
    }
}

#[allow(clippy::cast_possible_truncation)]
fn cell_key(point: &Point3) -> [i64; 3] {
    [
        (point.x / WELD_CELL).floor() as i64,
        (point.y / WELD_CELL).floor() as i64,
        (point.z / WELD_CELL).floor() as i64,
    ]
}
