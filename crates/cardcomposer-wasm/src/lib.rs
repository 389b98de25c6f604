//! Card Composer WASM - WebAssembly bindings for the cutout and compositing engine
//!
//! This crate exposes cardcomposer-core to the browser page. The segmentation
//! model stays in JavaScript; everything around it (preprocessing, mask
//! normalization, cutout, gestures, compositing, export) runs here.
//!
//! # Module Structure
//!
//! - `composer` - `Composer`, the JS-facing session
//! - `convert` - structural conversion of JS segmentation results
//! - `log` - user-facing session log mirrored to the console
//! - `types` - WASM-compatible wrapper types for image data
//!
//! # Usage
//!
//! ```typescript
//! import init, { Composer, decode_image } from '@cardcomposer/wasm';
//!
//! await init();
//!
//! const composer = new Composer(undefined);
//! composer.use_demo_frame();
//! composer.set_source_bytes(new Uint8Array(await file.arrayBuffer()));
//! ```

use cardcomposer_core::{compose, decode, encode};
use wasm_bindgen::prelude::*;

mod composer;
mod convert;
mod log;
mod types;

// Re-export public types
pub use composer::{Composer, ControlsJs, PreviewKind};
pub use convert::raw_output_from_js;
pub use types::JsRaster;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Decode JPEG or PNG bytes into an upright RGBA raster.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsRaster, JsValue> {
    decode::decode_image(bytes)
        .map(JsRaster::from_raster)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Encode an RGBA raster as PNG bytes.
#[wasm_bindgen]
pub fn encode_png(image: &JsRaster) -> Result<Vec<u8>, JsValue> {
    encode::encode_png(&image.pixels(), image.width(), image.height())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// The built-in 900x1200 placeholder frame.
#[wasm_bindgen]
pub fn demo_frame() -> Result<JsRaster, JsValue> {
    compose::demo_frame()
        .map(JsRaster::from_raster)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_encode_then_decode_demo_frame() {
        let frame = demo_frame().unwrap();
        let png = encode_png(&frame).unwrap();
        let decoded = decode_image(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (900, 1200));
        assert_eq!(decoded.pixels(), frame.pixels());
    }
}
