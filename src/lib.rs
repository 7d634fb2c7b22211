pub mod error;
pub mod geometry;
pub mod math;
pub mod mesh;
pub mod octree;
pub mod operations;
pub mod topology;

pub use error::{BoolisError, Result};
