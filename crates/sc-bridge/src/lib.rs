//! Signing bridges and backend resolution.
//!
//! The SDK never touches ambient globals. Whatever hosts it (a browser page,
//! a webview shell, a server process) hands in an [`Environment`] that
//! reports which bridges exist right now, and every dispatch resolves its
//! [`SigningBackend`] from that probe at call time.

use async_trait::async_trait;
use sc_api_types::{ExtensionLoginParams, KeyType, KeychainPost, KeychainResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Error value reported by a bridge, passed through untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("bridge error: {0}")]
pub struct BridgeError(pub Value);

/// Browser extension that signs `steem://` URIs itself.
#[async_trait(?Send)]
pub trait ExtensionBridge {
    async fn sign(&self, uri: &str) -> Result<Value, BridgeError>;
    async fn login(&self, params: &ExtensionLoginParams) -> Result<Value, BridgeError>;
}

/// Keychain extension. Every request answers with a [`KeychainResponse`];
/// failures are carried in its `error` field.
#[async_trait(?Send)]
pub trait KeychainBridge {
    async fn request_vote(
        &self,
        account: &str,
        permlink: &str,
        author: &str,
        weight: i32,
    ) -> KeychainResponse;

    async fn request_post(&self, post: &KeychainPost) -> KeychainResponse;

    async fn request_custom_json(
        &self,
        account: &str,
        id: &str,
        key_type: KeyType,
        json: &str,
        display_msg: &str,
    ) -> KeychainResponse;

    async fn request_sign_buffer(
        &self,
        account: &str,
        message: &str,
        key_type: KeyType,
    ) -> KeychainResponse;
}

/// A browsing context opened for an interactive signing flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupHandle {
    pub url: String,
}

/// Capabilities of the execution context hosting the SDK.
pub trait Environment {
    fn is_browser(&self) -> bool;
    fn extension_bridge(&self) -> Option<Rc<dyn ExtensionBridge>>;
    fn keychain_bridge(&self) -> Option<Rc<dyn KeychainBridge>>;
    /// Opens `url` in a new browsing context and focuses it. Blocked popups
    /// are not reported.
    fn open_popup(&self, url: &str) -> PopupHandle;
    /// Top-level navigation of the current browsing context.
    fn navigate(&self, url: &str);

    /// Seconds since the unix epoch, as seen by the host.
    fn unix_time(&self) -> u64 {
        system_unix_time()
    }
}

pub fn system_unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningBackend {
    None,
    Extension,
    Keychain,
}

/// Which bridge wins when both are installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendPolicy {
    /// Keychain asks for consent on every call, so it is primary by default.
    #[default]
    KeychainFirst,
    ExtensionFirst,
}

/// A resolved backend together with the bridge that serves it.
#[derive(Clone)]
pub enum ResolvedBackend {
    None,
    Extension(Rc<dyn ExtensionBridge>),
    Keychain(Rc<dyn KeychainBridge>),
}

impl ResolvedBackend {
    pub fn resolve(env: &dyn Environment, policy: BackendPolicy) -> Self {
        if !env.is_browser() {
            return ResolvedBackend::None;
        }

        let extension = env.extension_bridge();
        let keychain = env.keychain_bridge();
        let resolved = match (policy, extension, keychain) {
            (BackendPolicy::KeychainFirst, _, Some(keychain)) => ResolvedBackend::Keychain(keychain),
            (BackendPolicy::KeychainFirst, Some(extension), None) => {
                ResolvedBackend::Extension(extension)
            }
            (BackendPolicy::ExtensionFirst, Some(extension), _) => {
                ResolvedBackend::Extension(extension)
            }
            (BackendPolicy::ExtensionFirst, None, Some(keychain)) => {
                ResolvedBackend::Keychain(keychain)
            }
            (_, None, None) => ResolvedBackend::None,
        };

        debug!(backend = ?resolved.kind(), ?policy, "resolved signing backend");
        resolved
    }

    pub fn kind(&self) -> SigningBackend {
        match self {
            ResolvedBackend::None => SigningBackend::None,
            ResolvedBackend::Extension(_) => SigningBackend::Extension,
            ResolvedBackend::Keychain(_) => SigningBackend::Keychain,
        }
    }
}

impl SigningBackend {
    pub fn resolve(env: &dyn Environment, policy: BackendPolicy) -> Self {
        ResolvedBackend::resolve(env, policy).kind()
    }
}

/// The extension bridge is present and wins under `policy`.
pub fn has_extension_bridge(env: &dyn Environment, policy: BackendPolicy) -> bool {
    SigningBackend::resolve(env, policy) == SigningBackend::Extension
}

pub fn has_keychain_bridge(env: &dyn Environment) -> bool {
    env.is_browser() && env.keychain_bridge().is_some()
}

/// Keychain-specific requests should be used. Equal to
/// [`has_keychain_bridge`] under the default policy.
pub fn prefer_keychain(env: &dyn Environment, policy: BackendPolicy) -> bool {
    SigningBackend::resolve(env, policy) == SigningBackend::Keychain
}

/// Server-side or test context: no browser, no bridges.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessEnvironment;

impl Environment for HeadlessEnvironment {
    fn is_browser(&self) -> bool {
        false
    }

    fn extension_bridge(&self) -> Option<Rc<dyn ExtensionBridge>> {
        None
    }

    fn keychain_bridge(&self) -> Option<Rc<dyn KeychainBridge>> {
        None
    }

    fn open_popup(&self, url: &str) -> PopupHandle {
        debug!("headless environment cannot open popups");
        PopupHandle {
            url: url.to_owned(),
        }
    }

    fn navigate(&self, _url: &str) {
        debug!("headless environment cannot navigate");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowRequest {
    Popup(String),
    Navigate(String),
}

/// Environment with a fixed set of capabilities, for hosts such as webview
/// shells that own their windows. Popup and navigation requests are queued
/// until the host drains them.
#[derive(Default)]
pub struct StaticEnvironment {
    browser: bool,
    extension: Option<Rc<dyn ExtensionBridge>>,
    keychain: Option<Rc<dyn KeychainBridge>>,
    unix_time: Option<u64>,
    window_requests: RefCell<Vec<WindowRequest>>,
}

impl StaticEnvironment {
    pub fn browser() -> Self {
        Self {
            browser: true,
            ..Self::default()
        }
    }

    pub fn headless() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, bridge: Rc<dyn ExtensionBridge>) -> Self {
        self.extension = Some(bridge);
        self
    }

    pub fn with_keychain(mut self, bridge: Rc<dyn KeychainBridge>) -> Self {
        self.keychain = Some(bridge);
        self
    }

    /// Pins the clock, e.g. for reproducible login messages.
    pub fn with_unix_time(mut self, unix_time: u64) -> Self {
        self.unix_time = Some(unix_time);
        self
    }

    pub fn drain_window_requests(&self) -> Vec<WindowRequest> {
        self.window_requests.borrow_mut().drain(..).collect()
    }
}

impl Environment for StaticEnvironment {
    fn is_browser(&self) -> bool {
        self.browser
    }

    fn extension_bridge(&self) -> Option<Rc<dyn ExtensionBridge>> {
        self.extension.clone()
    }

    fn keychain_bridge(&self) -> Option<Rc<dyn KeychainBridge>> {
        self.keychain.clone()
    }

    fn open_popup(&self, url: &str) -> PopupHandle {
        self.window_requests
            .borrow_mut()
            .push(WindowRequest::Popup(url.to_owned()));
        PopupHandle {
            url: url.to_owned(),
        }
    }

    fn navigate(&self, url: &str) {
        self.window_requests
            .borrow_mut()
            .push(WindowRequest::Navigate(url.to_owned()));
    }

    fn unix_time(&self) -> u64 {
        self.unix_time.unwrap_or_else(system_unix_time)
    }
}
