use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;

use crate::error::OperationError;

/// Pipeline stage reported through the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Faces of one solid are being subdivided along the other solid's faces.
    Split,
    /// Faces are being labeled relative to the other solid.
    Classify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Split => write!(f, "split"),
            Stage::Classify => write!(f, "classify"),
        }
    }
}

/// Cooperative cancellation flag shared between a boolean operation and its
/// caller.
///
/// Clones share the underlying flag, and once set it stays set. Operations
/// observe the flag between faces and abort with
/// [`OperationError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of the operation holding this token.
    pub fn cancel(&self) {
        self.0.store(true, Relaxed);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Relaxed)
    }
}

/// Progress callback, invoked with the running stage and its completed
/// fraction in `[0, 1]`. Called synchronously from the operation's thread,
/// so it must not block.
pub type ProgressFn = dyn Fn(Stage, f64) + Send;

/// Progress and cancellation hooks for one boolean operation.
pub(crate) struct OpControl {
    pub(crate) progress: Option<Box<ProgressFn>>,
    pub(crate) cancel: Option<CancelToken>,
}

impl OpControl {
    /// Carves out the part of `stage`'s progress range covered by one phase
    /// of the pipeline.
    pub(crate) fn window(&self, stage: Stage, base: f64, span: f64) -> StageWindow<'_> {
        StageWindow {
            control: self,
            stage,
            base,
            span,
        }
    }
}

/// One phase's slice of a stage's progress range.
///
/// Splitting and classification each run twice (once per solid); the two
/// runs report through adjacent windows that together cover the stage
/// range from 0 to 1.
pub(crate) struct StageWindow<'a> {
    control: &'a OpControl,
    stage: Stage,
    base: f64,
    span: f64,
}

impl StageWindow<'_> {
    /// Reports this phase's completed fraction, scaled into the stage range.
    pub(crate) fn report(&self, fraction: f64) {
        if let Some(progress) = &self.control.progress {
            progress(self.stage, self.span.mul_add(fraction.clamp(0.0, 1.0), self.base));
        }
    }

    /// Checks the cancellation flag between units of work.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Cancelled`] once the caller has cancelled.
    pub(crate) fn check_cancelled(&self) -> Result<(), OperationError> {
        match &self.control.cancel {
            Some(token) if token.is_cancelled() => Err(OperationError::Cancelled),
            _ => Ok(()),
        }
    }
}
