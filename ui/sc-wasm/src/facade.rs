//! `SteemConnect` class exported to JavaScript.

use js_sys::{Function, Promise};
use sc_client::callback::split;
use sc_client::types::{
    Comment, LoginOptions, Operation, SignParams, SigningIntent, Transaction,
};
use sc_client::{
    BackendPolicy, Client, ClientConfig, ClientError, DEFAULT_API_URL, DispatchOutcome,
    LoginOutcome, Method,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use crate::convert::{from_js, parse_js, to_js};
use crate::env::BrowserEnvironment;

/// Configuration object as page scripts write it.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct JsConfig {
    #[serde(alias = "apiURL")]
    api_url: Option<String>,
    app: String,
    #[serde(alias = "callbackURL")]
    callback_url: String,
    access_token: Option<String>,
    scope: Vec<String>,
    response_type: Option<String>,
    backend_policy: Option<BackendPolicy>,
}

impl JsConfig {
    pub(crate) fn into_config(self) -> Result<ClientConfig, String> {
        Ok(ClientConfig {
            api_url: self.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
            app: self.app,
            callback_url: self.callback_url,
            access_token: self.access_token.filter(|token| !token.is_empty()),
            scope: self.scope,
            response_type: self.response_type.as_deref().map(str::parse).transpose()?,
            backend_policy: self.backend_policy.unwrap_or_default(),
        })
    }
}

pub(crate) fn outcome_value(outcome: DispatchOutcome) -> Value {
    match outcome {
        DispatchOutcome::Signed(result) => result,
        DispatchOutcome::Popup(handle) => json!({ "popup": handle.url }),
        DispatchOutcome::Url(url) => Value::String(url),
    }
}

fn promise(fut: impl Future<Output = Result<Value, ClientError>> + 'static) -> Promise {
    future_to_promise(async move {
        match fut.await {
            Ok(value) => to_js(&value),
            Err(err) => Err(to_js(&err.payload())?),
        }
    })
}

/// `(err, result)` for a node-style callback; the empty slot is `null`.
pub(crate) fn node_args(result: Result<Value, ClientError>) -> (Value, Value) {
    let (err, value) = split(result.map_err(|err| err.payload()));
    (err.unwrap_or(Value::Null), value.unwrap_or(Value::Null))
}

fn call_node_style(cb: &Function, result: Result<Value, ClientError>) {
    let (err, value) = node_args(result);
    let _ = cb.call2(
        &JsValue::NULL,
        &to_js(&err).unwrap_or(JsValue::NULL),
        &to_js(&value).unwrap_or(JsValue::NULL),
    );
}

/// Settles `fut` through `cb` when the page passed one, and returns
/// `undefined`. Without `cb` the caller gets a `Promise`.
fn respond(
    cb: Option<Function>,
    fut: impl Future<Output = Result<Value, ClientError>> + 'static,
) -> JsValue {
    match cb {
        Some(cb) => {
            spawn_local(async move { call_node_style(&cb, fut.await) });
            JsValue::UNDEFINED
        }
        None => promise(fut).into(),
    }
}

fn js_err(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

#[wasm_bindgen]
pub struct SteemConnect {
    client: Rc<RefCell<Client>>,
}

impl SteemConnect {
    fn from_config(config: ClientConfig) -> Self {
        Self {
            client: Rc::new(RefCell::new(Client::with_environment(
                config,
                Rc::new(BrowserEnvironment),
            ))),
        }
    }

    /// Snapshot of the session; in-flight calls keep the token they started with.
    fn snapshot(&self) -> Client {
        self.client.borrow().clone()
    }

    fn sign_params(params: JsValue) -> Result<SignParams, JsValue> {
        if params.is_undefined() || params.is_null() {
            return Ok(SignParams::default());
        }
        parse_js(params)
    }

    /// With `cb`, a page nothing can sign in gets the hosted signing popup
    /// and `{ popup: url }` back at once; `cb` is left alone, the result
    /// comes back through the app's callback URL.
    fn dispatch(&self, intent: SigningIntent, cb: Option<Function>) -> Result<JsValue, JsValue> {
        let client = self.snapshot();
        let Some(cb) = cb else {
            return Ok(respond(None, async move {
                client.dispatcher().dispatch(intent, false).await.map(outcome_value)
            }));
        };
        match client.dispatcher().open_signing_popup(&intent) {
            Ok(Some(handle)) => to_js(&outcome_value(DispatchOutcome::Popup(handle))),
            Ok(None) => Ok(respond(Some(cb), async move {
                client.dispatcher().dispatch(intent, false).await.map(outcome_value)
            })),
            Err(err) => Ok(respond(Some(cb), async move { Err(err) })),
        }
    }
}

#[wasm_bindgen]
impl SteemConnect {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<SteemConnect, JsValue> {
        let config: JsConfig = if config.is_undefined() || config.is_null() {
            JsConfig::default()
        } else {
            parse_js(config)?
        };
        Ok(Self::from_config(config.into_config().map_err(js_err)?))
    }

    #[wasm_bindgen(js_name = setApiURL)]
    pub fn set_api_url(&self, url: String) {
        self.client.borrow_mut().set_api_url(url);
    }

    #[wasm_bindgen(js_name = setApp)]
    pub fn set_app(&self, app: String) {
        self.client.borrow_mut().set_app(app);
    }

    #[wasm_bindgen(js_name = setCallbackURL)]
    pub fn set_callback_url(&self, url: String) {
        self.client.borrow_mut().set_callback_url(url);
    }

    #[wasm_bindgen(js_name = setAccessToken)]
    pub fn set_access_token(&self, token: String) {
        self.client.borrow_mut().set_access_token(token);
    }

    #[wasm_bindgen(js_name = removeAccessToken)]
    pub fn remove_access_token(&self) {
        self.client.borrow_mut().remove_access_token();
    }

    #[wasm_bindgen(js_name = setScope)]
    pub fn set_scope(&self, scope: Vec<String>) {
        self.client.borrow_mut().set_scope(scope);
    }

    #[wasm_bindgen(js_name = setResponseType)]
    pub fn set_response_type(&self, response_type: String) -> Result<(), JsValue> {
        let response_type = response_type.parse().map_err(js_err)?;
        self.client.borrow_mut().set_response_type(response_type);
        Ok(())
    }

    /// `"keychain_first"` or `"extension_first"`.
    #[wasm_bindgen(js_name = setBackendPolicy)]
    pub fn set_backend_policy(&self, policy: JsValue) -> Result<(), JsValue> {
        let policy: BackendPolicy = parse_js(policy)?;
        self.client.borrow_mut().set_backend_policy(policy);
        Ok(())
    }

    #[wasm_bindgen(js_name = setBaseURL)]
    #[allow(deprecated)]
    pub fn set_base_url(&self) {
        gloo_console::warn!("setBaseURL is deprecated; the base URL is fixed, use setApiURL");
        self.client.borrow_mut().set_base_url();
    }

    #[wasm_bindgen(js_name = getLoginURL)]
    pub fn get_login_url(&self, state: Option<String>) -> String {
        self.client.borrow().get_login_url(state.as_deref())
    }

    /// Settles with `{ extension }`, `{ token }`, `{ navigated }` or `{ url }`.
    pub fn login(&self, options: JsValue, cb: Option<Function>) -> Result<JsValue, JsValue> {
        let options: LoginOptions = if options.is_undefined() || options.is_null() {
            LoginOptions::default()
        } else {
            parse_js(options)?
        };
        let client = self.snapshot();
        Ok(respond(cb, async move {
            let outcome = client.login(&options).await?;
            Ok(match outcome {
                LoginOutcome::Extension(result) => json!({ "extension": result }),
                LoginOutcome::Token(token) => json!({ "token": token }),
                LoginOutcome::Navigated(url) => json!({ "navigated": url }),
                LoginOutcome::LoginUrl(url) => json!({ "url": url }),
            })
        }))
    }

    pub fn send(
        &self,
        route: String,
        method: String,
        body: JsValue,
        cb: Option<Function>,
    ) -> Result<JsValue, JsValue> {
        let method = Method::from_bytes(method.to_uppercase().as_bytes()).map_err(js_err)?;
        let body = from_js(&body);
        let client = self.snapshot();
        Ok(respond(cb, async move { client.send(&route, method, &body).await }))
    }

    pub fn me(&self, cb: Option<Function>) -> JsValue {
        let client = self.snapshot();
        respond(cb, async move { client.me().await })
    }

    /// `operations` is an array of `[name, params]` pairs.
    pub fn broadcast(&self, operations: JsValue, cb: Option<Function>) -> Result<JsValue, JsValue> {
        let operations: Vec<Operation> = parse_js(operations)?;
        let client = self.snapshot();
        Ok(respond(cb, async move { client.broadcast(&operations).await }))
    }

    pub fn vote(
        &self,
        voter: String,
        author: String,
        permlink: String,
        weight: i32,
        cb: Option<Function>,
    ) -> JsValue {
        let client = self.snapshot();
        respond(cb, async move { client.vote(&voter, &author, &permlink, weight).await })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn comment(
        &self,
        parent_author: String,
        parent_permlink: String,
        author: String,
        permlink: String,
        title: String,
        body: String,
        json_metadata: JsValue,
        cb: Option<Function>,
    ) -> JsValue {
        let comment = Comment {
            parent_author,
            parent_permlink,
            author,
            permlink,
            title,
            body,
            json_metadata: from_js(&json_metadata),
        };
        let client = self.snapshot();
        respond(cb, async move { client.comment(&comment).await })
    }

    #[wasm_bindgen(js_name = deleteComment)]
    pub fn delete_comment(&self, author: String, permlink: String, cb: Option<Function>) -> JsValue {
        let client = self.snapshot();
        respond(cb, async move { client.delete_comment(&author, &permlink).await })
    }

    #[wasm_bindgen(js_name = customJson)]
    pub fn custom_json(
        &self,
        required_auths: Vec<String>,
        required_posting_auths: Vec<String>,
        id: String,
        json: String,
        cb: Option<Function>,
    ) -> JsValue {
        let client = self.snapshot();
        respond(cb, async move {
            client
                .custom_json(&required_auths, &required_posting_auths, &id, &json)
                .await
        })
    }

    pub fn reblog(
        &self,
        account: String,
        author: String,
        permlink: String,
        cb: Option<Function>,
    ) -> JsValue {
        let client = self.snapshot();
        respond(cb, async move { client.reblog(&account, &author, &permlink).await })
    }

    pub fn follow(&self, follower: String, following: String, cb: Option<Function>) -> JsValue {
        let client = self.snapshot();
        respond(cb, async move { client.follow(&follower, &following).await })
    }

    pub fn unfollow(&self, unfollower: String, unfollowing: String, cb: Option<Function>) -> JsValue {
        let client = self.snapshot();
        respond(cb, async move { client.unfollow(&unfollower, &unfollowing).await })
    }

    pub fn ignore(&self, follower: String, following: String, cb: Option<Function>) -> JsValue {
        let client = self.snapshot();
        respond(cb, async move { client.ignore(&follower, &following).await })
    }

    #[wasm_bindgen(js_name = claimRewardBalance)]
    pub fn claim_reward_balance(
        &self,
        account: String,
        reward_steem: String,
        reward_sbd: String,
        reward_vests: String,
        cb: Option<Function>,
    ) -> JsValue {
        let client = self.snapshot();
        respond(cb, async move {
            client
                .claim_reward_balance(&account, &reward_steem, &reward_sbd, &reward_vests)
                .await
        })
    }

    /// The token is dropped from the session as soon as the call settles,
    /// whether or not the server accepted the revocation.
    #[wasm_bindgen(js_name = revokeToken)]
    pub fn revoke_token(&self, cb: Option<Function>) -> JsValue {
        let shared = self.client.clone();
        let mut client = self.snapshot();
        respond(cb, async move {
            let result = client.revoke_token().await;
            shared.borrow_mut().remove_access_token();
            result
        })
    }

    #[wasm_bindgen(js_name = updateUserMetadata)]
    #[allow(deprecated)]
    pub fn update_user_metadata(&self, metadata: JsValue, cb: Option<Function>) -> JsValue {
        gloo_console::warn!("updateUserMetadata is deprecated");
        let metadata = from_js(&metadata);
        let client = self.snapshot();
        respond(cb, async move { client.update_user_metadata(&metadata).await })
    }

    /// Without `cb` the promise resolves with the extension's result or the
    /// hosted signing URL.
    #[wasm_bindgen(js_name = sendTransaction)]
    pub fn send_transaction(
        &self,
        tx: JsValue,
        params: JsValue,
        cb: Option<Function>,
    ) -> Result<JsValue, JsValue> {
        let tx: Transaction = parse_js(tx)?;
        let params = Self::sign_params(params)?;
        self.dispatch(SigningIntent::Transaction { tx, params }, cb)
    }

    #[wasm_bindgen(js_name = sendOperations)]
    pub fn send_operations(
        &self,
        ops: JsValue,
        params: JsValue,
        cb: Option<Function>,
    ) -> Result<JsValue, JsValue> {
        let ops: Vec<Operation> = parse_js(ops)?;
        let params = Self::sign_params(params)?;
        self.dispatch(SigningIntent::OperationList { ops, params }, cb)
    }

    #[wasm_bindgen(js_name = sendOperation)]
    pub fn send_operation(
        &self,
        op: JsValue,
        params: JsValue,
        cb: Option<Function>,
    ) -> Result<JsValue, JsValue> {
        let op: Operation = parse_js(op)?;
        let params = Self::sign_params(params)?;
        self.dispatch(SigningIntent::SingleOperation { op, params }, cb)
    }
}
