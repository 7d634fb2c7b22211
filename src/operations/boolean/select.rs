use std::fmt;

use crate::error::Result;
use crate::math::Point3;
use crate::mesh::TriangleMesh;
use crate::topology::solid::WeldMap;
use crate::topology::{FaceStatus, Solid};

/// The boolean operation to perform on two solids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Intersection,
    /// The first solid minus the second.
    Difference,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Union => "union",
            Self::Intersection => "intersection",
            Self::Difference => "difference",
        };
        f.write_str(name)
    }
}

/// Which face statuses one operand contributes, and whether its faces are
/// emitted with reversed orientation.
struct Selection {
    keep: [FaceStatus; 2],
    invert: bool,
}

/// The composition rule per operand.
///
/// | Operation    | from A            | from B             |
/// |--------------|-------------------|--------------------|
/// | Union        | Outside, Same     | Outside            |
/// | Intersection | Inside, Same      | Inside             |
/// | Difference   | Outside, Opposite | Inside (inverted)  |
///
/// Coincident regions are contributed by A alone, so shared surface is
/// emitted once: same-facing coincident faces belong to the union and the
/// intersection, opposite-facing ones to the difference.
fn selection(op: BooleanOp) -> (Selection, Selection) {
    match op {
        BooleanOp::Union => (
            Selection {
                keep: [FaceStatus::Outside, FaceStatus::Same],
                invert: false,
            },
            Selection {
                keep: [FaceStatus::Outside, FaceStatus::Outside],
                invert: false,
            },
        ),
        BooleanOp::Intersection => (
            Selection {
                keep: [FaceStatus::Inside, FaceStatus::Same],
                invert: false,
            },
            Selection {
                keep: [FaceStatus::Inside, FaceStatus::Inside],
                invert: false,
            },
        ),
        BooleanOp::Difference => (
            Selection {
                keep: [FaceStatus::Outside, FaceStatus::Opposite],
                invert: false,
            },
            Selection {
                keep: [FaceStatus::Inside, FaceStatus::Inside],
                invert: true,
            },
        ),
    }
}

/// Assembles the result mesh from two classified solids.
///
/// Both operands feed one builder, so coincident vertices along the
/// intersection curve weld to a single index and the output mesh is closed
/// wherever the inputs were.
pub(crate) fn compose(a: &Solid, b: &Solid, op: BooleanOp) -> Result<TriangleMesh> {
    let (first, second) = selection(op);
    let mut builder = MeshBuilder::new();
    emit(a, &first, &mut builder)?;
    emit(b, &second, &mut builder)?;
    Ok(builder.finish())
}

fn emit(solid: &Solid, selection: &Selection, builder: &mut MeshBuilder) -> Result<()> {
    for face_id in solid.face_ids() {
        let face = solid.face(face_id)?;
        if !selection.keep.contains(&face.status) {
            continue;
        }
        let points = solid.face_points(face_id)?;
        builder.push(&points, selection.invert);
    }
    Ok(())
}

/// Accumulates triangles into an indexed mesh, merging positions that
/// coincide within the welding tolerance.
struct MeshBuilder {
    positions: Vec<Point3>,
    triangles: Vec<[u32; 3]>,
    lookup: WeldMap<u32>,
}

impl MeshBuilder {
    fn new() -> Self {
        Self {
            positions: Vec::new(),
            triangles: Vec::new(),
            lookup: WeldMap::new(),
        }
    }

    fn index_of(&mut self, point: &Point3) -> u32 {
        if let Some(index) = self.lookup.get(point) {
            return index;
        }
        #[allow(clippy::cast_possible_truncation)]
        let index = self.positions.len() as u32;
        self.positions.push(*point);
        self.lookup.insert(*point, index);
        index
    }

    fn push(&mut self, points: &[Point3; 3], invert: bool) {
        let mut triangle = [
            self.index_of(&points[0]),
            self.index_of(&points[1]),
            self.index_of(&points[2]),
        ];
        if invert {
            triangle.swap(1, 2);
        }
        self.triangles.push(triangle);
    }

    fn finish(self) -> TriangleMesh {
        TriangleMesh::new(self.positions, self.triangles)
    }
}
