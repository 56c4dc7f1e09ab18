//! The page as an [`Environment`].

use js_sys::Reflect;
use sc_bridge::{Environment, ExtensionBridge, KeychainBridge, PopupHandle};
use std::rc::Rc;
use tracing::debug;
use wasm_bindgen::JsValue;

use crate::bridges::{JsExtensionBridge, JsKeychainBridge};

const EXTENSION_GLOBAL: &str = "_steemconnect";
const KEYCHAIN_GLOBAL: &str = "steem_keychain";

/// Looks the bridges up on `window` at every call, so extensions injected
/// after the SDK loaded are still picked up.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserEnvironment;

fn global(name: &str) -> Option<JsValue> {
    let window = web_sys::window()?;
    let value = Reflect::get(&window, &JsValue::from_str(name)).ok()?;
    (!value.is_undefined() && !value.is_null()).then_some(value)
}

impl Environment for BrowserEnvironment {
    fn is_browser(&self) -> bool {
        web_sys::window().is_some()
    }

    fn extension_bridge(&self) -> Option<Rc<dyn ExtensionBridge>> {
        global(EXTENSION_GLOBAL)
            .map(|target| Rc::new(JsExtensionBridge::new(target)) as Rc<dyn ExtensionBridge>)
    }

    fn keychain_bridge(&self) -> Option<Rc<dyn KeychainBridge>> {
        global(KEYCHAIN_GLOBAL)
            .map(|target| Rc::new(JsKeychainBridge::new(target)) as Rc<dyn KeychainBridge>)
    }

    fn open_popup(&self, url: &str) -> PopupHandle {
        match web_sys::window().map(|window| window.open_with_url_and_target(url, "_blank")) {
            Some(Ok(Some(popup))) => {
                let _ = popup.focus();
            }
            _ => debug!("signing popup was blocked"),
        }
        PopupHandle {
            url: url.to_owned(),
        }
    }

    fn navigate(&self, url: &str) {
        if let Some(window) = web_sys::window() {
            if window.location().set_href(url).is_err() {
                debug!("navigation to login page failed");
            }
        }
    }

    fn unix_time(&self) -> u64 {
        (js_sys::Date::now() / 1000.0) as u64
    }
}
