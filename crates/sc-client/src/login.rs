use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sc_api_types::{
    ExtensionLoginParams, KeyType, LoginMessage, LoginOptions, ResponseType, SignedMessage,
};
use sc_bridge::{BridgeError, ResolvedBackend};
use serde_json::Value;
use tracing::debug;

use crate::callback::deliver;
use crate::{BASE_URL, Client, ClientError};

/// How a login request was completed.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// Result reported by the extension bridge.
    Extension(Value),
    /// Base64 login token built from a keychain-signed challenge.
    Token(String),
    /// The browsing context was sent to this authorize URL.
    Navigated(String),
    /// No browser to navigate; redirect the user here.
    LoginUrl(String),
}

impl Client {
    /// OAuth authorize URL for this session.
    pub fn get_login_url(&self, state: Option<&str>) -> String {
        let mut url = format!(
            "{BASE_URL}/oauth2/authorize?client_id={}&redirect_uri={}",
            self.app,
            urlencoding::encode(&self.callback_url)
        );
        if self.response_type == Some(ResponseType::Code) {
            url.push_str("&response_type=code");
        }
        if !self.scope.is_empty() {
            url.push_str("&scope=");
            url.push_str(&self.scope.join(","));
        }
        if let Some(state) = state.filter(|state| !state.is_empty()) {
            url.push_str("&state=");
            url.push_str(&urlencoding::encode(state));
        }
        url
    }

    pub async fn login(&self, options: &LoginOptions) -> Result<LoginOutcome, ClientError> {
        match self.dispatcher.backend() {
            ResolvedBackend::Extension(extension) => {
                let params = ExtensionLoginParams {
                    app: non_empty(&self.app),
                    authority: options.authority.clone(),
                };
                debug!("login through extension bridge");
                return Ok(LoginOutcome::Extension(extension.login(&params).await?));
            }
            ResolvedBackend::Keychain(keychain) => {
                if let Some(username) = options.username.as_deref().filter(|name| !name.is_empty()) {
                    let mut message = LoginMessage {
                        signed_message: SignedMessage {
                            kind: "login".to_owned(),
                            app: non_empty(&self.app),
                        },
                        authors: vec![username.to_owned()],
                        timestamp: self.dispatcher.environment().unix_time(),
                        signatures: None,
                    };
                    let challenge = serde_json::to_string(&message)?;
                    debug!("login through keychain signature");

                    let response = keychain
                        .request_sign_buffer(username, &challenge, KeyType::Posting)
                        .await
                        .into_result()
                        .map_err(BridgeError)?;
                    message.signatures = Some(vec![response.result.unwrap_or(Value::Null)]);

                    let token = STANDARD.encode(serde_json::to_string(&message)?);
                    return Ok(LoginOutcome::Token(token));
                }
            }
            ResolvedBackend::None => {}
        }

        let url = self.get_login_url(options.state.as_deref());
        let env = self.dispatcher.environment();
        if env.is_browser() {
            env.navigate(&url);
            return Ok(LoginOutcome::Navigated(url));
        }
        Ok(LoginOutcome::LoginUrl(url))
    }

    pub async fn login_with(
        &self,
        options: &LoginOptions,
        handler: impl FnOnce(Result<LoginOutcome, ClientError>),
    ) {
        deliver(self.login(options), handler).await
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}
