//! The external segmentation capability and its cancellation handle.
//!
//! The model itself lives outside this crate. Callers implement
//! [`SegmentationCapability`] (or pass a closure); the session hands it the
//! inference input together with a [`CancellationToken`] and interprets the
//! result as one of three outcomes: completed, cancelled or failed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::mask::RawOutput;
use crate::raster::RasterBuffer;
use crate::ComputeBackend;

/// Errors reported by a segmentation capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// The run was aborted through its cancellation token.
    #[error("Segmentation cancelled")]
    Cancelled,

    /// The model could not be loaded or the backend is missing.
    #[error("Segmentation capability unavailable: {0}")]
    Unavailable(String),

    /// The model ran but failed.
    #[error("Segmentation failed: {0}")]
    Failed(String),
}

/// Shared flag used to abort an in-flight segmentation.
///
/// Clones share the same flag. Cancellation is cooperative: the capability
/// checks the token, and the session discards any result that arrives after
/// the token was cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancel_flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
        info!("Segmentation cancellation requested");
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::SeqCst)
    }
}

/// Everything handed to the capability for one run.
#[derive(Debug, Clone)]
pub struct SegmentRequest<'a> {
    pub image: &'a RasterBuffer,
    pub backend: ComputeBackend,
    pub cancel: CancellationToken,
}

impl SegmentRequest<'_> {
    /// Opaque device string for the runtime, `None` for automatic selection.
    pub fn device_hint(&self) -> Option<&'static str> {
        self.backend.device_hint()
    }
}

/// A segmentation model: image in, mask-like output out.
pub trait SegmentationCapability {
    fn segment(&mut self, request: &SegmentRequest<'_>) -> Result<RawOutput, SegmentError>;
}

impl<F> SegmentationCapability for F
where
    F: FnMut(&SegmentRequest<'_>) -> Result<RawOutput, SegmentError>,
{
    fn segment(&mut self, request: &SegmentRequest<'_>) -> Result<RawOutput, SegmentError> {
        self(request)
    }
}

/// Result of a cancellable operation: a third outcome beside success and failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentationOutcome<T, E> {
    Completed(T),
    Cancelled,
    Failed(E),
}

impl<T> SegmentationOutcome<T, SegmentError> {
    /// Classify a capability result, honoring the token.
    ///
    /// A cancelled token wins over whatever the capability returned.
    pub fn from_result(result: Result<T, SegmentError>, token: &CancellationToken) -> Self {
        if token.is_cancelled() {
            return SegmentationOutcome::Cancelled;
        }
        match result {
            Ok(value) => SegmentationOutcome::Completed(value),
            Err(SegmentError::Cancelled) => SegmentationOutcome::Cancelled,
            Err(err) => SegmentationOutcome::Failed(err),
        }
    }
}

impl<T, E> SegmentationOutcome<T, E> {
    pub fn is_completed(&self) -> bool {
        matches!(self, SegmentationOutcome::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SegmentationOutcome::Cancelled)
    }

    /// Short status label: `"completed"`, `"cancelled"` or `"failed"`.
    pub fn status(&self) -> &'static str {
        match self {
            SegmentationOutcome::Completed(_) => "completed",
            SegmentationOutcome::Cancelled => "cancelled",
            SegmentationOutcome::Failed(_) => "failed",
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SegmentationOutcome<U, E> {
        match self {
            SegmentationOutcome::Completed(value) => SegmentationOutcome::Completed(f(value)),
            SegmentationOutcome::Cancelled => SegmentationOutcome::Cancelled,
            SegmentationOutcome::Failed(err) => SegmentationOutcome::Failed(err),
        }
    }

    pub fn map_err<F2>(self, f: impl FnOnce(E) -> F2) -> SegmentationOutcome<T, F2> {
        match self {
            SegmentationOutcome::Completed(value) => SegmentationOutcome::Completed(value),
            SegmentationOutcome::Cancelled => SegmentationOutcome::Cancelled,
            SegmentationOutcome::Failed(err) => SegmentationOutcome::Failed(f(err)),
        }
    }
}
