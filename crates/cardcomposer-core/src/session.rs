//! The composing session: the single owner of all mutable state.
//!
//! A session holds the character photo, its prepared (preprocessed) variant,
//! the current cutout, the frame and the placement transform. Every operation
//! that is not ready yet (no photo, no cutout) is a silent no-op reported
//! through `Option`/`bool`, never an error.
//!
//! Segmentation is split into [`Session::begin_cutout`] and
//! [`Session::finish_cutout`] so that hosts with an asynchronous model can run
//! it between the two calls; [`Session::run_cutout`] does both in one go for
//! synchronous capabilities.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::compose::{demo_frame, render};
use crate::cutout::{build_cutout, prepare_inference_input, CutoutError};
use crate::encode::{encode_png, EncodeError};
use crate::geometry::{AffineState, GestureEngine, GesturePhase, Point, PointerId};
use crate::mask::{normalize_mask, MaskError, RawOutput};
use crate::preprocess::preprocess;
use crate::raster::{RasterBuffer, RasterError};
use crate::segment::{
    CancellationToken, SegmentError, SegmentRequest, SegmentationCapability, SegmentationOutcome,
};
use crate::{CanvasSize, ComputeBackend, InferenceSize, PipelineConfig, SessionConfig};

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The segmentation output matched none of the known shapes, or its
    /// mask had unusable dimensions or sample count.
    #[error(transparent)]
    Mask(#[from] MaskError),

    /// The mask and the inference input disagree in size.
    #[error(transparent)]
    DimensionMismatch(#[from] CutoutError),

    #[error("Segmentation capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Segmentation failed: {0}")]
    SegmentationFailed(String),

    /// A cutout was requested while another one is still in flight.
    #[error("A cutout is already running")]
    Busy,

    /// A segmentation result arrived but no cutout was started.
    #[error("No cutout is in flight")]
    NoCutoutInFlight,

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl From<SegmentError> for SessionError {
    fn from(err: SegmentError) -> Self {
        match err {
            SegmentError::Unavailable(message) => SessionError::CapabilityUnavailable(message),
            SegmentError::Failed(message) => SessionError::SegmentationFailed(message),
            SegmentError::Cancelled => SessionError::SegmentationFailed(err.to_string()),
        }
    }
}

/// Work handed out by [`Session::begin_cutout`].
#[derive(Debug, Clone)]
pub struct CutoutJob {
    /// The prepared photo resized to the inference size.
    pub input: RasterBuffer,
    pub token: CancellationToken,
    pub backend: ComputeBackend,
}

impl CutoutJob {
    pub fn request(&self) -> SegmentRequest<'_> {
        SegmentRequest {
            image: &self.input,
            backend: self.backend,
            cancel: self.token.clone(),
        }
    }
}

#[derive(Debug)]
struct InFlight {
    input: RasterBuffer,
    token: CancellationToken,
}

/// One composing session.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    source: Option<RasterBuffer>,
    prepared: Option<RasterBuffer>,
    frame: Option<RasterBuffer>,
    cutout: Option<RasterBuffer>,
    transform: AffineState,
    gestures: GestureEngine,
    in_flight: Option<InFlight>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            source: None,
            prepared: None,
            frame: None,
            cutout: None,
            transform: AffineState::centered(config.canvas),
            gestures: GestureEngine::new(),
            in_flight: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn canvas(&self) -> CanvasSize {
        self.config.canvas
    }

    pub fn set_inference_size(&mut self, size: InferenceSize) {
        self.config.inference_size = size;
    }

    pub fn set_backend(&mut self, backend: ComputeBackend) {
        self.config.backend = backend;
    }

    // --- Inputs ---

    /// Replace the frame. The cutout and its placement are kept.
    pub fn set_frame(&mut self, frame: RasterBuffer) {
        debug!(width = frame.width(), height = frame.height(), "frame set");
        self.frame = Some(frame);
    }

    pub fn clear_frame(&mut self) {
        self.frame = None;
    }

    /// Use the built-in placeholder frame.
    pub fn use_demo_frame(&mut self) -> Result<(), SessionError> {
        self.frame = Some(demo_frame()?);
        Ok(())
    }

    /// Replace the character photo.
    ///
    /// Invalidates the prepared photo and the cutout. A cutout still in
    /// flight is cancelled since its result would belong to the old photo.
    pub fn set_source(&mut self, source: RasterBuffer) {
        info!(
            width = source.width(),
            height = source.height(),
            "character photo set"
        );
        self.source = Some(source);
        self.prepared = None;
        self.cutout = None;
        self.gestures.reset();
        if let Some(job) = &self.in_flight {
            job.token.cancel();
        }
    }

    pub fn source(&self) -> Option<&RasterBuffer> {
        self.source.as_ref()
    }

    pub fn prepared(&self) -> Option<&RasterBuffer> {
        self.prepared.as_ref()
    }

    pub fn frame(&self) -> Option<&RasterBuffer> {
        self.frame.as_ref()
    }

    pub fn cutout(&self) -> Option<&RasterBuffer> {
        self.cutout.as_ref()
    }

    pub fn transform(&self) -> &AffineState {
        &self.transform
    }

    pub fn gesture_phase(&self) -> GesturePhase {
        self.gestures.phase()
    }

    // --- Preprocessing ---

    /// Run the preprocessing pipeline on the character photo.
    ///
    /// Returns `Ok(None)` when no photo has been set yet.
    pub fn preprocess(
        &mut self,
        config: &PipelineConfig,
    ) -> Result<Option<&RasterBuffer>, SessionError> {
        let Some(source) = &self.source else {
            debug!("preprocess skipped: no character photo");
            return Ok(None);
        };

        let prepared = preprocess(source, config)?;
        info!(
            width = prepared.width(),
            height = prepared.height(),
            "preprocessing done"
        );
        self.prepared = Some(prepared);
        Ok(self.prepared.as_ref())
    }

    // --- Segmentation ---

    /// Start a cutout run.
    ///
    /// Returns `Ok(None)` when there is no prepared photo, and
    /// `Err(SessionError::Busy)` while another run is in flight.
    pub fn begin_cutout(&mut self) -> Result<Option<CutoutJob>, SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::Busy);
        }
        let Some(prepared) = &self.prepared else {
            debug!("cutout skipped: photo not prepared");
            return Ok(None);
        };

        let input = prepare_inference_input(prepared, self.config.inference_size.side())?;
        let token = CancellationToken::new();
        info!(
            width = input.width(),
            height = input.height(),
            "segmentation started"
        );

        self.in_flight = Some(InFlight {
            input: input.clone(),
            token: token.clone(),
        });
        Ok(Some(CutoutJob {
            input,
            token,
            backend: self.config.backend,
        }))
    }

    /// Complete the run started by [`Session::begin_cutout`] with the capability's result.
    ///
    /// On success the cutout is replaced and the placement is reset to
    /// centered, unscaled, unrotated and unflipped.
    pub fn finish_cutout(
        &mut self,
        result: Result<RawOutput, SegmentError>,
    ) -> SegmentationOutcome<(), SessionError> {
        let Some(job) = self.in_flight.take() else {
            return SegmentationOutcome::Failed(SessionError::NoCutoutInFlight);
        };

        match SegmentationOutcome::from_result(result, &job.token) {
            SegmentationOutcome::Completed(raw) => match self.install_cutout(&job.input, &raw) {
                Ok(()) => SegmentationOutcome::Completed(()),
                Err(err) => {
                    warn!(%err, "cutout failed");
                    SegmentationOutcome::Failed(err)
                }
            },
            SegmentationOutcome::Cancelled => {
                info!("segmentation cancelled");
                SegmentationOutcome::Cancelled
            }
            SegmentationOutcome::Failed(err) => {
                warn!(%err, "segmentation failed");
                SegmentationOutcome::Failed(err.into())
            }
        }
    }

    /// Run a full cutout with a synchronous capability.
    ///
    /// Returns `None` when there is no prepared photo.
    pub fn run_cutout<C>(&mut self, capability: &mut C) -> Option<SegmentationOutcome<(), SessionError>>
    where
        C: SegmentationCapability + ?Sized,
    {
        let job = match self.begin_cutout() {
            Ok(Some(job)) => job,
            Ok(None) => return None,
            Err(err) => return Some(SegmentationOutcome::Failed(err)),
        };

        let result = capability.segment(&job.request());
        Some(self.finish_cutout(result))
    }

    /// Request cancellation of the run in flight.
    ///
    /// The run resolves as cancelled when its result is handed to
    /// [`Session::finish_cutout`]. Returns `false` if nothing is running.
    pub fn cancel_cutout(&mut self) -> bool {
        match &self.in_flight {
            Some(job) => {
                job.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_cutout_running(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Token of the run in flight, if any.
    pub fn in_flight_token(&self) -> Option<&CancellationToken> {
        self.in_flight.as_ref().map(|job| &job.token)
    }

    fn install_cutout(&mut self, input: &RasterBuffer, raw: &RawOutput) -> Result<(), SessionError> {
        let mask = normalize_mask(raw, input.width(), input.height())?;
        let cutout = build_cutout(input, &mask)?;
        info!(
            width = cutout.width(),
            height = cutout.height(),
            "cutout ready"
        );

        self.cutout = Some(cutout);
        self.transform = AffineState::centered(self.config.canvas);
        self.gestures.reset();
        Ok(())
    }

    // --- Placement ---

    /// Returns `true` if the pointer is now tracked.
    pub fn pointer_down(&mut self, id: PointerId, position: Point) -> bool {
        if self.cutout.is_none() {
            return false;
        }
        self.gestures.pointer_down(id, position, &self.transform)
    }

    /// Returns `true` if the placement changed and the canvas needs a redraw.
    pub fn pointer_move(&mut self, id: PointerId, position: Point) -> bool {
        if self.cutout.is_none() {
            return false;
        }
        self.gestures
            .pointer_move(id, position, &mut self.transform)
    }

    pub fn pointer_up(&mut self, id: PointerId) {
        self.gestures.pointer_up(id, &self.transform);
    }

    pub fn pointer_cancel(&mut self, id: PointerId) {
        self.gestures.pointer_cancel(id, &self.transform);
    }

    /// Scale the cutout into the frame. Returns `false` without a cutout.
    pub fn fit_to_frame(&mut self) -> bool {
        let Some(cutout) = &self.cutout else {
            return false;
        };
        self.transform
            .fit_to_frame(cutout.width(), cutout.height(), self.config.canvas);
        self.rebaseline();
        true
    }

    /// Move the cutout to the canvas midpoint. Returns `false` without a cutout.
    pub fn center(&mut self) -> bool {
        if self.cutout.is_none() {
            return false;
        }
        self.transform.center(self.config.canvas);
        self.rebaseline();
        true
    }

    /// Mirror the cutout horizontally. Returns `false` without a cutout.
    pub fn flip(&mut self) -> bool {
        if self.cutout.is_none() {
            return false;
        }
        self.transform.toggle_flip();
        self.rebaseline();
        true
    }

    /// End any gesture; its baseline predates the command.
    fn rebaseline(&mut self) {
        self.gestures.reset();
    }

    // --- Output ---

    /// Render the composite with the placement current at call time.
    pub fn render(&self) -> Result<RasterBuffer, SessionError> {
        Ok(render(
            self.frame.as_ref(),
            self.cutout.as_ref(),
            &self.transform,
            self.config.canvas,
        )?)
    }

    /// Render and encode the composite as PNG.
    pub fn export_png(&self) -> Result<Vec<u8>, SessionError> {
        let composite = self.render()?;
        let png = encode_png(composite.pixels(), composite.width(), composite.height())?;
        info!(bytes = png.len(), "composite exported");
        Ok(png)
    }
}
