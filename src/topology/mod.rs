pub mod face;
pub mod solid;
pub mod vertex;

pub use face::{FaceData, FaceId, FaceStatus};
pub use solid::{Solid, WELD_TOLERANCE};
pub use vertex::{VertexData, VertexId, VertexStatus};
