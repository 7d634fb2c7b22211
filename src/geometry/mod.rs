pub mod bounds;
pub mod line;
pub mod plane;
pub mod segment;

pub use bounds::Bounds;
pub use line::Line;
pub use plane::Plane;
pub use segment::{CutKind, Segment, SegmentEnd};
