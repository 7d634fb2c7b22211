use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::error::Result;
use crate::mesh::TriangleMesh;
use crate::operations::control::{CancelToken, OpControl, ProgressFn, Stage};
use crate::topology::Solid;

use super::classify::classify_faces;
use super::select::{compose, BooleanOp};
use super::split::split_faces;

/// Hooks and tuning for one boolean operation.
#[derive(Default)]
pub struct BooleanOptions {
    /// Observer for pipeline progress, called with each stage's completed
    /// fraction.
    pub progress: Option<Box<ProgressFn>>,
    /// Cooperative cancellation flag, checked between faces.
    pub cancel: Option<CancelToken>,
    /// Seed for the ray-perturbation randomness. Runs with the same inputs
    /// and seed produce identical meshes.
    pub seed: u64,
}

impl fmt::Debug for BooleanOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BooleanOptions")
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel.is_some())
            .field("seed", &self.seed)
            .finish()
    }
}

/// A prepared boolean operation on two closed triangle meshes.
///
/// Construction runs the expensive part of the pipeline: both solids are
/// split along each other's faces and every face is classified. The union,
/// intersection, and difference of the pair can then each be assembled from
/// the same prepared state.
#[derive(Debug)]
pub struct BooleanOperation {
    a: Solid,
    b: Solid,
}

impl BooleanOperation {
    /// Prepares the operation with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if either mesh is malformed or if classification
    /// fails on degenerate geometry.
    pub fn new(a: &TriangleMesh, b: &TriangleMesh) -> Result<Self> {
        Self::with_options(a, b, BooleanOptions::default())
    }

    /// Prepares the operation, reporting progress and honoring cancellation
    /// through `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if either mesh is malformed, if classification
    /// fails on degenerate geometry, or with
    /// [`OperationError::Cancelled`](crate::error::OperationError::Cancelled)
    /// if the caller cancels mid-pipeline.
    pub fn with_options(
        a: &TriangleMesh,
        b: &TriangleMesh,
        options: BooleanOptions,
    ) -> Result<Self> {
        let control = OpControl {
            progress: options.progress,
            cancel: options.cancel,
        };
        let mut rng = StdRng::seed_from_u64(options.seed);

        let mut solid_a = Solid::from_mesh(a)?;
        let mut solid_b = Solid::from_mesh(b)?;
        info!(
            faces_a = solid_a.face_count(),
            faces_b = solid_b.face_count(),
            seed = options.seed,
            "boolean pipeline start"
        );

        // Step 1: subdivide each solid until no face crosses the other's
        // surface.
        split_faces(&mut solid_a, &solid_b, &control.window(Stage::Split, 0.0, 0.5))?;
        split_faces(&mut solid_b, &solid_a, &control.window(Stage::Split, 0.5, 0.5))?;
        debug!(
            faces_a = solid_a.face_count(),
            faces_b = solid_b.face_count(),
            "faces split"
        );

        // Step 2: label every face relative to the other solid.
        classify_faces(
            &mut solid_a,
            &solid_b,
            &mut rng,
            &control.window(Stage::Classify, 0.0, 0.5),
        )?;
        classify_faces(
            &mut solid_b,
            &solid_a,
            &mut rng,
            &control.window(Stage::Classify, 0.5, 0.5),
        )?;
        debug!("faces classified");

        Ok(Self {
            a: solid_a,
            b: solid_b,
        })
    }

    /// Assembles the union of the two solids.
    ///
    /// # Errors
    ///
    /// Returns an error if the prepared solids cannot be read back.
    pub fn union(&self) -> Result<TriangleMesh> {
        self.result(BooleanOp::Union)
    }

    /// Assembles the intersection of the two solids. The result is empty
    /// when the solids do not overlap.
    ///
    /// # Errors
    ///
    /// Returns an error if the prepared solids cannot be read back.
    pub fn intersection(&self) -> Result<TriangleMesh> {
        self.result(BooleanOp::Intersection)
    }

    /// Assembles the first solid minus the second. The result is empty when
    /// the second solid covers the first.
    ///
    /// # Errors
    ///
    /// Returns an error if the prepared solids cannot be read back.
    pub fn difference(&self) -> Result<TriangleMesh> {
        self.result(BooleanOp::Difference)
    }

    fn result(&self, op: BooleanOp) -> Result<TriangleMesh> {
        let mesh = compose(&self.a, &self.b, op)?;
        info!(%op, triangles = mesh.triangle_count(), "boolean result assembled");
        Ok(mesh)
    }
}
