//! Image encoding for export.
//!
//! The flattened composite is exported as PNG so the alpha channel survives
//! when the canvas itself is not fully opaque.

mod png;

pub use png::{encode_png, EncodeError, PNG_SIGNATURE};
