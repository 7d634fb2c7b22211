use thiserror::Error;

/// Top-level error type for the Boolis CSG engine.
#[derive(Debug, Error)]
pub enum BoolisError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

impl BoolisError {
    /// Returns `true` if the error reports cooperative cancellation rather
    /// than a failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Operation(OperationError::Cancelled))
    }
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to mesh topology.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),
}

/// Errors related to boolean operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("ray classification failed after {attempts} perturbed retries")]
    ClassificationFailed { attempts: usize },
}

/// Convenience type alias for results using [`BoolisError`].
pub type Result<T> = std::result::Result<T, BoolisError>;
