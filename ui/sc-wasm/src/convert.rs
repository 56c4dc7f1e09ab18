//! JSON ⇄ `JsValue` conversions.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Plain JS objects, never `Map`s, so results read like JSON on the page.
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(JsValue::from)
}

/// Best-effort JSON view of a JS value. `Error` objects become their message.
pub fn from_js(value: &JsValue) -> Value {
    if value.is_undefined() {
        return Value::Null;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return Value::String(String::from(error.message()));
    }
    serde_wasm_bindgen::from_value(value.clone())
        .unwrap_or_else(|_| Value::String(format!("{value:?}")))
}

pub fn parse_js<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(JsValue::from)
}
