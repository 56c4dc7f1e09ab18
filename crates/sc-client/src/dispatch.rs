use sc_api_types::{Operation, SignParams, SigningIntent, Transaction};
use sc_bridge::{
    BackendPolicy, Environment, PopupHandle, ResolvedBackend, SigningBackend,
    has_keychain_bridge,
};
use sc_uri::{SteemUriEncoder, UriEncoder, web_fallback_url};
use serde_json::Value;
use std::rc::Rc;
use tracing::debug;

use crate::{BETA_URL, ClientError};

/// What happened to a signing request. Exactly one per dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The extension bridge signed it; this is the bridge's result.
    Signed(Value),
    /// A popup on the hosted signing page drives the rest of the flow and
    /// returns to the app's callback URL.
    Popup(PopupHandle),
    /// Hosted signing page for the caller to send the user to.
    Url(String),
}

/// Routes signing intents to whichever backend the environment offers.
#[derive(Clone)]
pub struct Dispatcher {
    env: Rc<dyn Environment>,
    encoder: Rc<dyn UriEncoder>,
    policy: BackendPolicy,
    signing_origin: String,
}

impl Dispatcher {
    pub fn new(env: Rc<dyn Environment>) -> Self {
        Self {
            env,
            encoder: Rc::new(SteemUriEncoder),
            policy: BackendPolicy::default(),
            signing_origin: BETA_URL.to_owned(),
        }
    }

    pub fn with_encoder(mut self, encoder: Rc<dyn UriEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_policy(mut self, policy: BackendPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_signing_origin(mut self, origin: impl Into<String>) -> Self {
        self.signing_origin = origin.into();
        self
    }

    pub fn environment(&self) -> &dyn Environment {
        self.env.as_ref()
    }

    pub fn encoder(&self) -> &dyn UriEncoder {
        self.encoder.as_ref()
    }

    pub fn policy(&self) -> BackendPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: BackendPolicy) {
        self.policy = policy;
    }

    /// Resolves the backend against the environment as it is right now.
    pub fn backend(&self) -> ResolvedBackend {
        ResolvedBackend::resolve(self.env.as_ref(), self.policy)
    }

    pub fn has_extension_bridge(&self) -> bool {
        self.backend().kind() == SigningBackend::Extension
    }

    pub fn has_keychain_bridge(&self) -> bool {
        has_keychain_bridge(self.env.as_ref())
    }

    pub fn prefer_keychain(&self) -> bool {
        self.backend().kind() == SigningBackend::Keychain
    }

    pub async fn send_transaction(
        &self,
        tx: Transaction,
        params: SignParams,
    ) -> Result<DispatchOutcome, ClientError> {
        self.dispatch(SigningIntent::Transaction { tx, params }, false)
            .await
    }

    pub async fn send_operations(
        &self,
        ops: Vec<Operation>,
        params: SignParams,
    ) -> Result<DispatchOutcome, ClientError> {
        self.dispatch(SigningIntent::OperationList { ops, params }, false)
            .await
    }

    pub async fn send_operation(
        &self,
        op: Operation,
        params: SignParams,
    ) -> Result<DispatchOutcome, ClientError> {
        self.dispatch(SigningIntent::SingleOperation { op, params }, false)
            .await
    }

    /// Like [`send_transaction`](Self::send_transaction), for callers that
    /// take the outcome through a completion handler. In a browser without
    /// an extension this opens the hosted signing page in a popup instead of
    /// returning its URL.
    pub async fn send_transaction_with(
        &self,
        tx: Transaction,
        params: SignParams,
        handler: impl FnOnce(Result<DispatchOutcome, ClientError>),
    ) {
        handler(
            self.dispatch(SigningIntent::Transaction { tx, params }, true)
                .await,
        )
    }

    pub async fn send_operations_with(
        &self,
        ops: Vec<Operation>,
        params: SignParams,
        handler: impl FnOnce(Result<DispatchOutcome, ClientError>),
    ) {
        handler(
            self.dispatch(SigningIntent::OperationList { ops, params }, true)
                .await,
        )
    }

    pub async fn send_operation_with(
        &self,
        op: Operation,
        params: SignParams,
        handler: impl FnOnce(Result<DispatchOutcome, ClientError>),
    ) {
        handler(
            self.dispatch(SigningIntent::SingleOperation { op, params }, true)
                .await,
        )
    }

    /// `interactive` is set when the caller waits on a completion handler,
    /// which allows the popup fallback.
    pub async fn dispatch(
        &self,
        intent: SigningIntent,
        interactive: bool,
    ) -> Result<DispatchOutcome, ClientError> {
        let uri = self.encoder.encode_intent(&intent)?;
        let web_url = web_fallback_url(&uri, &self.signing_origin);

        if let ResolvedBackend::Extension(extension) = self.backend() {
            debug!(intent = intent.kind(), "signing through extension bridge");
            let signed = extension.sign(&uri).await?;
            return Ok(DispatchOutcome::Signed(signed));
        }

        if interactive && self.env.is_browser() {
            return Ok(DispatchOutcome::Popup(self.popup(&intent, &web_url)));
        }

        debug!(intent = intent.kind(), "returning hosted signing url");
        Ok(DispatchOutcome::Url(web_url))
    }

    /// Opens the hosted signing popup right away when no extension will sign
    /// the intent and there is a window to open it from. `None` otherwise;
    /// the caller then goes through [`dispatch`](Self::dispatch).
    pub fn open_signing_popup(
        &self,
        intent: &SigningIntent,
    ) -> Result<Option<PopupHandle>, ClientError> {
        if !self.env.is_browser() || self.backend().kind() == SigningBackend::Extension {
            return Ok(None);
        }
        let uri = self.encoder.encode_intent(intent)?;
        let web_url = web_fallback_url(&uri, &self.signing_origin);
        Ok(Some(self.popup(intent, &web_url)))
    }

    fn popup(&self, intent: &SigningIntent, web_url: &str) -> PopupHandle {
        debug!(intent = intent.kind(), "opening hosted signing popup");
        self.env.open_popup(web_url)
    }
}
