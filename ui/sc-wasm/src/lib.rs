//! SteemConnect SDK for the browser.
//!
//! Exposes the `SteemConnect` class to page scripts. Signing bridges are the
//! objects the SteemConnect extension and Steem Keychain inject into `window`.

mod bridges;
mod convert;
mod env;
mod facade;

pub use bridges::{JsExtensionBridge, JsKeychainBridge};
pub use env::BrowserEnvironment;
pub use facade::SteemConnect;

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Deprecated `sign(name, params, redirectUri)`: the hosted signing URL, or
/// an `invalid_request` object for malformed input.
#[wasm_bindgen]
#[allow(deprecated)]
pub fn sign(name: JsValue, params: JsValue, redirect_uri: Option<String>) -> Result<JsValue, JsValue> {
    gloo_console::warn!("sign is deprecated");
    let name = name.as_string().unwrap_or_default();
    let params = convert::from_js(&params);
    convert::to_js(&sc_client::sign(&name, &params, redirect_uri.as_deref()))
}

/// Deprecated `Initialize(config)`.
#[wasm_bindgen(js_name = Initialize)]
pub fn initialize(config: JsValue) -> Result<SteemConnect, JsValue> {
    gloo_console::warn!("Initialize is deprecated, use new SteemConnect(config)");
    SteemConnect::new(config)
}
