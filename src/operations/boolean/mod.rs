mod classify;
mod engine;
mod select;
mod split;

pub use engine::{BooleanOperation, BooleanOptions};
pub use select::BooleanOp;
