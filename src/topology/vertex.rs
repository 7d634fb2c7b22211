use crate::math::Point3;

slotmap::new_key_type! {
    /// Unique identifier for a vertex within one solid.
    pub struct VertexId;
}

/// Classification of a vertex relative to the other solid of a boolean
/// operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexStatus {
    /// Not classified yet.
    #[default]
    Unknown,
    /// Strictly inside the other solid.
    Inside,
    /// Strictly outside the other solid.
    Outside,
    /// On the boundary between the two solids.
    Boundary,
}

/// Data associated with a mesh vertex.
#[derive(Debug, Clone)]
pub struct VertexData {
    /// The 3D position of the vertex.
    pub point: Point3,
    /// Classification relative to the other solid.
    pub status: VertexStatus,
    /// Vertices connected to this one through a face edge.
    pub adjacent: Vec<VertexId>,
}

impl VertexData {
    /// Creates a new, unclassified vertex at the given point.
    #[must_use]
    pub fn new(point: Point3) -> Self {
        Self {
            point,
            status: VertexStatus::Unknown,
            adjacent: Vec::new(),
        }
    }

    /// Records `other` as adjacent, ignoring duplicates.
    pub fn add_adjacent(&mut self, other: VertexId) {
        if !self.adjacent.contains(&other) {
            self.adjacent.push(other);
        }
    }
}
