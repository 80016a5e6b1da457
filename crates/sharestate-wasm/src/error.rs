//! Error conversion across the JS boundary.

use serde::Serialize;
use sharestate::StorageError;
use wasm_bindgen::{JsCast, JsValue};

/// Convert any error with Display into a JsValue error.
pub fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Serialize a Rust value to a plain JS object (not a `Map`).
pub fn to_js_value(value: &impl Serialize) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    value.serialize(&serializer).map_err(to_js_error)
}

/// Classify an exception thrown by a Web Storage or History call.
pub fn storage_error(e: JsValue) -> StorageError {
    if let Some(ex) = e.dyn_ref::<web_sys::DomException>() {
        return match ex.name().as_str() {
            "QuotaExceededError" | "NS_ERROR_DOM_QUOTA_REACHED" => StorageError::QuotaExceeded,
            "SecurityError" | "NotAllowedError" => StorageError::AccessDenied(ex.message()),
            _ => StorageError::Backend(format!("{}: {}", ex.name(), ex.message())),
        };
    }
    let msg = if let Some(s) = e.as_string() {
        s
    } else if let Some(err) = e.dyn_ref::<js_sys::Error>() {
        String::from(err.message())
    } else {
        format!("{e:?}")
    };
    StorageError::Backend(msg)
}

pub fn no_window() -> StorageError {
    StorageError::Unavailable("no window".into())
}
