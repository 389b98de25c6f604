//! Conversion of JavaScript segmentation results into [`RawOutput`].
//!
//! Segmentation runtimes in the browser return loosely typed objects: arrays
//! of segment records, a single record with a `mask`, or image-like objects
//! with `data`/`width`/`height`. The shape is probed structurally with
//! `Reflect`, mirroring what the normalizer expects on the Rust side.

use cardcomposer_core::mask::{MaskValues, RawImage, RawOutput, RawRecord};
use js_sys::{Array, ArrayBuffer, Float32Array, Float64Array, Reflect, Uint8Array, Uint8ClampedArray};
use wasm_bindgen::{JsCast, JsValue};

/// Classify a segmentation result.
///
/// Values that are neither arrays nor objects become
/// [`RawOutput::Unsupported`] carrying their JS type name.
pub fn raw_output_from_js(value: &JsValue) -> RawOutput {
    if Array::is_array(value) {
        let records = Array::from(value)
            .iter()
            .map(|item| record_from_js(&item))
            .collect();
        return RawOutput::Segments(records);
    }

    if !value.is_object() {
        return RawOutput::Unsupported(type_name(value));
    }

    let record = record_from_js(value);
    if record.mask.is_some() || record.segmentation.is_some() || record.data.is_some() {
        RawOutput::Record(record)
    } else {
        RawOutput::Unsupported("object without mask, segmentation or data".to_string())
    }
}

fn record_from_js(value: &JsValue) -> RawRecord {
    if !value.is_object() {
        return RawRecord::default();
    }

    RawRecord {
        mask: get(value, "mask").and_then(|v| image_from_js(&v)),
        segmentation: get(value, "segmentation").and_then(|v| image_from_js(&v)),
        data: get(value, "data").and_then(|v| values_from_js(&v)),
        width: get_u32(value, "width"),
        height: get_u32(value, "height"),
        channels: get_u32(value, "channels"),
        label: get(value, "label").and_then(|v| v.as_string()),
        score: get(value, "score")
            .and_then(|v| v.as_f64())
            .map(|v| v as f32),
    }
}

/// An image-like object: `data` plus `width` and `height`.
fn image_from_js(value: &JsValue) -> Option<RawImage> {
    if !value.is_object() {
        return None;
    }

    let data = get(value, "data").and_then(|v| values_from_js(&v))?;
    let width = get_u32(value, "width")?;
    let height = get_u32(value, "height")?;

    let image = RawImage::new(data, width, height);
    Some(match get_u32(value, "channels") {
        Some(channels) => image.with_channels(channels),
        None => image,
    })
}

/// Read a numeric buffer, keeping bytes as bytes.
fn values_from_js(value: &JsValue) -> Option<MaskValues> {
    if let Some(bytes) = value.dyn_ref::<Uint8ClampedArray>() {
        return Some(MaskValues::Bytes(bytes.to_vec()));
    }
    if let Some(bytes) = value.dyn_ref::<Uint8Array>() {
        return Some(MaskValues::Bytes(bytes.to_vec()));
    }
    if let Some(floats) = value.dyn_ref::<Float32Array>() {
        return Some(MaskValues::Numbers(floats.to_vec()));
    }
    if Array::is_array(value) || ArrayBuffer::is_view(value) {
        // Float64Array's constructor converts any array-like, non-numbers become NaN
        let numbers = Float64Array::new(value)
            .to_vec()
            .into_iter()
            .map(|v| v as f32)
            .collect();
        return Some(MaskValues::Numbers(numbers));
    }
    None
}

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn get_u32(target: &JsValue, key: &str) -> Option<u32> {
    get(target, key)
        .and_then(|v| v.as_f64())
        .filter(|v| v.is_finite() && *v >= 0.0 && *v <= u32::MAX as f64)
        .map(|v| v as u32)
}

fn type_name(value: &JsValue) -> String {
    value
        .js_typeof()
        .as_string()
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use js_sys::Object;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn set(target: &Object, key: &str, value: &JsValue) {
        Reflect::set(target, &JsValue::from_str(key), value).unwrap();
    }

    fn image_object(data: &JsValue, width: u32, height: u32) -> Object {
        let obj = Object::new();
        set(&obj, "data", data);
        set(&obj, "width", &JsValue::from(width));
        set(&obj, "height", &JsValue::from(height));
        obj
    }

    #[wasm_bindgen_test]
    fn test_segment_array_with_mask() {
        let mask = image_object(&Uint8Array::from(&[0u8, 255, 255, 0][..]).into(), 2, 2);
        let segment = Object::new();
        set(&segment, "mask", &mask);
        set(&segment, "label", &JsValue::from_str("person"));
        set(&segment, "score", &JsValue::from(0.9));

        let output = raw_output_from_js(&Array::of1(&segment).into());
        let RawOutput::Segments(records) = output else {
            panic!("expected segments");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label.as_deref(), Some("person"));
        let mask = records[0].mask.as_ref().unwrap();
        assert_eq!(mask.data, MaskValues::Bytes(vec![0, 255, 255, 0]));
        assert_eq!((mask.width, mask.height), (2, 2));
    }

    #[wasm_bindgen_test]
    fn test_record_with_float_data() {
        let data = Float32Array::from(&[0.0f32, 1.0, 1.0, 0.0][..]);
        let record = Object::new();
        set(&record, "data", &data);

        let output = raw_output_from_js(&record.into());
        let RawOutput::Record(record) = output else {
            panic!("expected record");
        };
        assert_eq!(record.data, Some(MaskValues::Numbers(vec![0.0, 1.0, 1.0, 0.0])));
        assert_eq!(record.width, None);
    }

    #[wasm_bindgen_test]
    fn test_image_like_object_is_sized_record() {
        let data = Uint8ClampedArray::from(&[7u8; 16][..]);
        let output = raw_output_from_js(&image_object(&data.into(), 2, 2).into());
        let RawOutput::Record(record) = output else {
            panic!("expected record");
        };
        assert_eq!(record.width, Some(2));
        assert_eq!(record.height, Some(2));
    }

    #[wasm_bindgen_test]
    fn test_plain_number_array_data() {
        let data = Array::of3(&JsValue::from(0.0), &JsValue::from(0.5), &JsValue::from(1.0));
        assert_eq!(
            values_from_js(&data.into()),
            Some(MaskValues::Numbers(vec![0.0, 0.5, 1.0]))
        );
    }

    #[wasm_bindgen_test]
    fn test_primitives_are_unsupported() {
        assert_eq!(
            raw_output_from_js(&JsValue::from(42)),
            RawOutput::Unsupported("number".to_string())
        );
        assert!(matches!(
            raw_output_from_js(&Object::new().into()),
            RawOutput::Unsupported(_)
        ));
    }
}
