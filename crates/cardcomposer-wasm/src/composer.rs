//! The JS-facing composing session.
//!
//! `Composer` wraps the core `Session` and keeps a user-facing log. The host
//! page owns the segmentation model: it asks for the inference input with
//! `begin_cutout`, runs the model, then hands the result back with
//! `finish_cutout` (or `fail_cutout` when the model threw).
//!
//! # Example
//!
//! ```typescript
//! const composer = new Composer({ canvas: { width: 900, height: 1200 },
//!                                 inference_size: 'Px1024', backend: 'Auto' });
//! composer.set_source_bytes(new Uint8Array(await file.arrayBuffer()));
//! composer.preprocess_controls({ brightness: 0, contrast: 20, gamma_percent: 110,
//!                                sharpen_percent: 35, normalize_background: true,
//!                                auto_crop: true });
//!
//! const input = composer.begin_cutout();
//! try {
//!   const result = await segmenter(toImageData(input), {
//!     device: composer.device_hint(),
//!     signal: composer.abort_signal(),
//!   });
//!   const status = composer.finish_cutout(result); // "completed" | "cancelled"
//! } catch (e) {
//!   composer.fail_cutout(String(e?.message ?? e), e?.name === 'AbortError');
//! }
//! ```

use cardcomposer_core::compose::{demo_frame, render_contain};
use cardcomposer_core::decode::decode_image;
use cardcomposer_core::geometry::Point;
use cardcomposer_core::mask::RawOutput;
use cardcomposer_core::segment::{SegmentError, SegmentationOutcome};
use cardcomposer_core::{
    ComputeBackend, InferenceSize, PipelineConfig, Session, SessionConfig, SessionError,
};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use web_sys::{AbortController, AbortSignal};

use crate::convert::raw_output_from_js;
use crate::log::SessionLog;
use crate::types::JsRaster;

fn to_js(err: impl ToString) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Slider positions as the page's controls report them.
///
/// Gamma and sharpen are in percent (110 = 1.10).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ControlsJs {
    pub brightness: i32,
    pub contrast: i32,
    pub gamma_percent: i32,
    pub sharpen_percent: i32,
    pub normalize_background: bool,
    pub auto_crop: bool,
}

impl From<ControlsJs> for PipelineConfig {
    fn from(controls: ControlsJs) -> Self {
        PipelineConfig::from_controls(
            controls.brightness,
            controls.contrast,
            controls.gamma_percent,
            controls.sharpen_percent,
            controls.normalize_background,
            controls.auto_crop,
        )
    }
}

/// Which of the session's images a preview shows.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Source = 0,
    Prepared = 1,
    Cutout = 2,
}

#[wasm_bindgen]
pub struct Composer {
    session: Session,
    log: SessionLog,
    /// Aborts the page's segmentation call; present while a run is in flight.
    abort: Option<AbortController>,
}

#[wasm_bindgen]
impl Composer {
    /// Create a session. `config` may be `undefined` for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<Composer, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            SessionConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(to_js)?
        };
        Ok(Self::with_config(config))
    }

    // --- Inputs ---

    /// Decode a JPEG/PNG character photo and make it the source.
    pub fn set_source_bytes(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        let image = decode_image(bytes).map_err(|e| self.fail(e))?;
        self.release_model();
        self.session.set_source(image);
        self.log.push("Character photo loaded");
        Ok(())
    }

    /// Use an already decoded RGBA raster (e.g. a camera snapshot) as the source.
    pub fn set_source(&mut self, image: &JsRaster) -> Result<(), JsValue> {
        let raster = image.to_raster().map_err(|e| self.fail(e))?;
        self.release_model();
        self.session.set_source(raster);
        self.log.push("Character photo loaded");
        Ok(())
    }

    /// Decode a JPEG/PNG frame.
    pub fn set_frame_bytes(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        let image = decode_image(bytes).map_err(|e| self.fail(e))?;
        self.session.set_frame(image);
        self.log.push("Frame loaded");
        Ok(())
    }

    pub fn set_frame(&mut self, image: &JsRaster) -> Result<(), JsValue> {
        let raster = image.to_raster().map_err(|e| self.fail(e))?;
        self.session.set_frame(raster);
        Ok(())
    }

    pub fn use_demo_frame(&mut self) -> Result<(), JsValue> {
        self.load_demo_frame().map_err(to_js)
    }

    pub fn clear_frame(&mut self) {
        self.session.clear_frame();
    }

    /// Set the inference side (512, 768 or 1024).
    pub fn set_inference_size(&mut self, side: u32) -> Result<(), JsValue> {
        let size = InferenceSize::from_side(side)
            .ok_or_else(|| to_js(format!("Unsupported inference size: {side}")))?;
        self.session.set_inference_size(size);
        Ok(())
    }

    /// Set the device hint: `"auto"`, `"wasm"` or `"webgpu"`.
    pub fn set_backend(&mut self, hint: &str) {
        self.session.set_backend(ComputeBackend::from_hint(hint));
    }

    /// Device string to pass to the segmentation runtime; `undefined` for automatic.
    pub fn device_hint(&self) -> Option<String> {
        self.session.config().backend.device_hint().map(str::to_string)
    }

    // --- Preprocessing ---

    /// Preprocess the source; `undefined` when no source is loaded yet.
    pub fn preprocess(&mut self, config: JsValue) -> Result<Option<JsRaster>, JsValue> {
        let config: PipelineConfig = serde_wasm_bindgen::from_value(config).map_err(to_js)?;
        self.preprocess_with(&config).map_err(to_js)
    }

    /// Preprocess from slider positions (see `ControlsJs`).
    pub fn preprocess_controls(&mut self, controls: JsValue) -> Result<Option<JsRaster>, JsValue> {
        let controls: ControlsJs = serde_wasm_bindgen::from_value(controls)
            .map_err(|e| to_js(format!("Invalid controls: {e}")))?;
        self.preprocess_with(&controls.into()).map_err(to_js)
    }

    /// Preprocess with the reset values of the controls.
    pub fn preprocess_reset(&mut self) -> Result<Option<JsRaster>, JsValue> {
        self.preprocess_with(&PipelineConfig::reset()).map_err(to_js)
    }

    // --- Segmentation ---

    /// Start a cutout; returns the inference input, or `undefined` when the
    /// photo has not been preprocessed.
    pub fn begin_cutout(&mut self) -> Result<Option<JsRaster>, JsValue> {
        let input = self.begin().map_err(to_js)?;
        if input.is_some() {
            self.abort = Some(AbortController::new()?);
        }
        Ok(input)
    }

    /// Signal to pass to the segmentation call; `undefined` when nothing is running.
    pub fn abort_signal(&self) -> Option<AbortSignal> {
        self.abort.as_ref().map(AbortController::signal)
    }

    /// Hand over the segmentation result.
    ///
    /// Resolves to `"completed"` or `"cancelled"`; failures are thrown.
    pub fn finish_cutout(&mut self, result: JsValue) -> Result<String, JsValue> {
        let raw = raw_output_from_js(&result);
        self.finish(Ok(raw)).map_err(to_js)
    }

    /// Report that the segmentation call threw.
    ///
    /// `aborted` marks an abort triggered by `cancel_cutout`, which resolves
    /// to `"cancelled"` rather than an error.
    pub fn fail_cutout(&mut self, message: String, aborted: bool) -> Result<String, JsValue> {
        let err = if aborted {
            SegmentError::Cancelled
        } else {
            SegmentError::Failed(message)
        };
        self.finish(Err(err)).map_err(to_js)
    }

    /// Cancel the run in flight and abort the page's segmentation call.
    pub fn cancel_cutout(&mut self) -> bool {
        self.abort_model();
        self.session.cancel_cutout()
    }

    /// Whether `cancel_cutout` was requested for the run in flight.
    pub fn is_cancel_requested(&self) -> bool {
        self.session
            .in_flight_token()
            .is_some_and(|token| token.is_cancelled())
    }

    pub fn is_cutout_running(&self) -> bool {
        self.session.is_cutout_running()
    }

    pub fn has_cutout(&self) -> bool {
        self.session.cutout().is_some()
    }

    // --- Placement ---

    /// Returns `true` if the pointer is tracked.
    pub fn pointer_down(&mut self, id: i32, x: f64, y: f64) -> bool {
        self.session.pointer_down(id, Point::new(x, y))
    }

    /// Returns `true` if the canvas needs a redraw.
    pub fn pointer_move(&mut self, id: i32, x: f64, y: f64) -> bool {
        self.session.pointer_move(id, Point::new(x, y))
    }

    pub fn pointer_up(&mut self, id: i32) {
        self.session.pointer_up(id);
    }

    pub fn pointer_cancel(&mut self, id: i32) {
        self.session.pointer_cancel(id);
    }

    pub fn fit_to_frame(&mut self) -> bool {
        self.session.fit_to_frame()
    }

    pub fn center(&mut self) -> bool {
        self.session.center()
    }

    pub fn flip(&mut self) -> bool {
        self.session.flip()
    }

    /// Current placement as `{ tx, ty, scale, rotation, flip_x }`.
    pub fn transform(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.session.transform()).map_err(to_js)
    }

    // --- Output ---

    /// Render the composite at canvas size.
    pub fn render(&self) -> Result<JsRaster, JsValue> {
        self.session.render().map(JsRaster::from_raster).map_err(to_js)
    }

    /// Render a letterboxed thumbnail of one of the session images.
    pub fn preview(
        &self,
        kind: PreviewKind,
        width: u32,
        height: u32,
    ) -> Result<Option<JsRaster>, JsValue> {
        self.preview_raster(kind, width, height).map_err(to_js)
    }

    pub fn export_png(&mut self) -> Result<Vec<u8>, JsValue> {
        let png = self.session.export_png().map_err(|e| self.fail(e))?;
        self.log.push("Exported PNG");
        Ok(png)
    }

    /// Accumulated log lines, oldest first.
    pub fn log_lines(&self) -> js_sys::Array {
        self.log
            .lines()
            .iter()
            .map(|line| JsValue::from_str(line))
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }
}

impl Composer {
    pub(crate) fn with_config(config: SessionConfig) -> Self {
        Self {
            session: Session::new(config),
            log: SessionLog::new(),
            abort: None,
        }
    }

    fn abort_model(&self) {
        if let Some(controller) = &self.abort {
            controller.abort();
        }
    }

    /// Abort and forget the controller of a run the session has dropped.
    fn release_model(&mut self) {
        if let Some(controller) = self.abort.take() {
            controller.abort();
        }
    }

    fn fail(&mut self, err: impl ToString) -> JsValue {
        let message = err.to_string();
        self.log.push(format!("Error: {message}"));
        JsValue::from_str(&message)
    }

    fn load_demo_frame(&mut self) -> Result<(), SessionError> {
        self.session.set_frame(demo_frame()?);
        self.log.push("Demo frame loaded");
        Ok(())
    }

    fn preprocess_with(&mut self, config: &PipelineConfig) -> Result<Option<JsRaster>, SessionError> {
        let prepared = self.session.preprocess(config)?.cloned();
        if let Some(image) = &prepared {
            self.log.push(format!(
                "Preprocessed ({}x{})",
                image.width(),
                image.height()
            ));
        }
        Ok(prepared.map(JsRaster::from_raster))
    }

    fn begin(&mut self) -> Result<Option<JsRaster>, SessionError> {
        let Some(job) = self.session.begin_cutout()? else {
            return Ok(None);
        };
        self.log.push(format!(
            "Segmentation started ({}x{})",
            job.input.width(),
            job.input.height()
        ));
        Ok(Some(JsRaster::from_raster(job.input)))
    }

    /// Resolve the run in flight into a status string.
    pub(crate) fn finish(
        &mut self,
        result: Result<RawOutput, SegmentError>,
    ) -> Result<String, SessionError> {
        let outcome = self.session.finish_cutout(result);
        self.abort = None;
        let status = outcome.status().to_string();

        match outcome {
            SegmentationOutcome::Completed(()) => {
                self.log.push("Cutout complete");
                Ok(status)
            }
            SegmentationOutcome::Cancelled => {
                self.log.push("Cancelled");
                Ok(status)
            }
            SegmentationOutcome::Failed(err) => {
                self.log.push(format!("Error: {err}"));
                Err(err)
            }
        }
    }

    fn preview_raster(
        &self,
        kind: PreviewKind,
        width: u32,
        height: u32,
    ) -> Result<Option<JsRaster>, SessionError> {
        let image = match kind {
            PreviewKind::Source => self.session.source(),
            PreviewKind::Prepared => self.session.prepared(),
            PreviewKind::Cutout => self.session.cutout(),
        };
        let Some(image) = image else {
            return Ok(None);
        };
        Ok(Some(JsRaster::from_raster(render_contain(
            image, width, height,
        )?)))
    }
}
