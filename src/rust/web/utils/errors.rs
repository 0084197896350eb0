//! Error handling utilities for WASM

use wasm_bindgen::JsValue;

/// Convert a Rust error to JsValue
pub fn to_js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Serialize a value for JS, or report why it could not be
pub fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(to_js_error)
}
