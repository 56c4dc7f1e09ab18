//! Adapters from the page-injected extension objects to the SDK bridge traits.
//!
//! Both extensions answer through callbacks. Each call wraps its callback in
//! a `Promise` and awaits it, so a bridge call is one future that settles
//! once.

use async_trait::async_trait;
use js_sys::{Array, Function, Promise, Reflect};
use sc_bridge::{BridgeError, ExtensionBridge, KeychainBridge};
use sc_client::types::{ExtensionLoginParams, KeyType, KeychainPost, KeychainResponse};
use serde_json::{Value, json};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::convert::{from_js, to_js};

/// How the target reports its result.
#[derive(Clone, Copy)]
enum CallbackStyle {
    /// `(err, result)`
    Node,
    /// `(response)`
    Response,
}

fn node_callback(resolve: Function, reject: Function) -> JsValue {
    Closure::once_into_js(move |err: JsValue, result: JsValue| {
        let _ = if err.is_null() || err.is_undefined() {
            resolve.call1(&JsValue::NULL, &result)
        } else {
            reject.call1(&JsValue::NULL, &err)
        };
    })
}

fn response_callback(resolve: Function) -> JsValue {
    Closure::once_into_js(move |response: JsValue| {
        let _ = resolve.call1(&JsValue::NULL, &response);
    })
}

/// A synchronous throw from the target fails the call before any callback.
async fn invoke(
    target: &JsValue,
    method: &str,
    args: &[JsValue],
    style: CallbackStyle,
) -> Result<JsValue, JsValue> {
    let function: Function = Reflect::get(target, &JsValue::from_str(method))?.dyn_into()?;

    let mut thrown = None;
    let promise = Promise::new(&mut |resolve: Function, reject: Function| {
        let callback = match style {
            CallbackStyle::Node => node_callback(resolve, reject),
            CallbackStyle::Response => response_callback(resolve),
        };

        let call_args: Array = args.iter().collect();
        call_args.push(&callback);
        if let Err(err) = Reflect::apply(&function, target, &call_args) {
            thrown = Some(err);
        }
    });

    if let Some(err) = thrown {
        return Err(err);
    }
    JsFuture::from(promise).await
}

/// Keychain answers as a response object; a failed call becomes a
/// `success: false` response carrying the error.
fn keychain_response(outcome: Result<Value, Value>) -> KeychainResponse {
    let response = match outcome {
        Ok(response) => response,
        Err(err) => json!({ "success": false, "error": err }),
    };
    serde_json::from_value(response).unwrap_or_else(|err| KeychainResponse {
        success: Some(false),
        error: Some(Value::String(err.to_string())),
        ..KeychainResponse::default()
    })
}

/// `window._steemconnect`
pub struct JsExtensionBridge {
    target: JsValue,
}

impl JsExtensionBridge {
    pub fn new(target: JsValue) -> Self {
        Self { target }
    }
}

#[async_trait(?Send)]
impl ExtensionBridge for JsExtensionBridge {
    async fn sign(&self, uri: &str) -> Result<Value, BridgeError> {
        invoke(&self.target, "sign", &[JsValue::from_str(uri)], CallbackStyle::Node)
            .await
            .map(|result| from_js(&result))
            .map_err(|err| BridgeError(from_js(&err)))
    }

    async fn login(&self, params: &ExtensionLoginParams) -> Result<Value, BridgeError> {
        let params = to_js(params).map_err(|err| BridgeError(from_js(&err)))?;
        invoke(&self.target, "login", &[params], CallbackStyle::Node)
            .await
            .map(|result| from_js(&result))
            .map_err(|err| BridgeError(from_js(&err)))
    }
}

/// `window.steem_keychain`
pub struct JsKeychainBridge {
    target: JsValue,
}

impl JsKeychainBridge {
    pub fn new(target: JsValue) -> Self {
        Self { target }
    }

    async fn request(&self, method: &str, args: &[JsValue]) -> KeychainResponse {
        let outcome = invoke(&self.target, method, args, CallbackStyle::Response).await;
        keychain_response(
            outcome
                .map(|response| from_js(&response))
                .map_err(|err| from_js(&err)),
        )
    }
}

#[async_trait(?Send)]
impl KeychainBridge for JsKeychainBridge {
    async fn request_vote(
        &self,
        account: &str,
        permlink: &str,
        author: &str,
        weight: i32,
    ) -> KeychainResponse {
        let args: [JsValue; 4] = [account.into(), permlink.into(), author.into(), weight.into()];
        self.request("requestVote", &args).await
    }

    async fn request_post(&self, post: &KeychainPost) -> KeychainResponse {
        let args: [JsValue; 8] = [
            post.account.as_str().into(),
            post.title.as_str().into(),
            post.body.as_str().into(),
            post.parent_permlink.as_str().into(),
            post.parent_author.as_str().into(),
            post.json_metadata.as_str().into(),
            post.permlink.as_str().into(),
            post.comment_options.as_str().into(),
        ];
        self.request("requestPost", &args).await
    }

    async fn request_custom_json(
        &self,
        account: &str,
        id: &str,
        key_type: KeyType,
        json: &str,
        display_msg: &str,
    ) -> KeychainResponse {
        let args: [JsValue; 5] = [
            account.into(),
            id.into(),
            key_type.as_str().into(),
            json.into(),
            display_msg.into(),
        ];
        self.request("requestCustomJson", &args).await
    }

    async fn request_sign_buffer(
        &self,
        account: &str,
        message: &str,
        key_type: KeyType,
    ) -> KeychainResponse {
        let args: [JsValue; 3] = [account.into(), message.into(), key_type.as_str().into()];
        self.request("requestSignBuffer", &args).await
    }
}
