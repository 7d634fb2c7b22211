pub mod boolean;
pub mod control;

pub use boolean::{BooleanOp, BooleanOperation, BooleanOptions};
pub use control::{CancelToken, ProgressFn, Stage};
