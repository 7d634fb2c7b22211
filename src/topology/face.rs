use std::cell::OnceCell;

use crate::geometry::{Bounds, Plane};

use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a face within one solid.
    pub struct FaceId;
}

/// Classification of a face relative to the other solid of a boolean
/// operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaceStatus {
    /// Not classified yet.
    #[default]
    Unknown,
    /// Strictly inside the other solid.
    Inside,
    /// Strictly outside the other solid.
    Outside,
    /// Coplanar with a face of the other solid, normals aligned.
    Same,
    /// Coplanar with a face of the other solid, normals opposed.
    Opposite,
}

/// Data associated with a triangular face.
///
/// A face's geometry never changes after insertion; splitting replaces the
/// face with new ones. Only the classification status is mutated in place.
#[derive(Debug, Clone)]
pub struct FaceData {
    /// The three corner vertices, wound counter-clockwise seen from outside.
    pub vertices: [VertexId; 3],
    /// Classification relative to the other solid.
    pub status: FaceStatus,
    /// Bounding box over the corner positions, kept alongside the face so
    /// the spatial index can be updated on removal.
    pub bounds: Bounds,
    /// Supporting plane, computed on first use.
    plane: OnceCell<Plane>,
}

impl FaceData {
    /// Creates a new, unclassified face.
    #[must_use]
    pub fn new(vertices: [VertexId; 3], bounds: Bounds) -> Self {
        Self {
            vertices,
            status: FaceStatus::Unknown,
            bounds,
            plane: OnceCell::new(),
        }
    }

    /// Returns the cached supporting plane, if it has been computed.
    #[must_use]
    pub(crate) fn cached_plane(&self) -> Option<&Plane> {
        self.plane.get()
    }

    /// Caches the supporting plane. Later calls keep the first value.
    pub(crate) fn cache_plane(&self, plane: Plane) {
        let _ = self.plane.set(plane);
    }
}
