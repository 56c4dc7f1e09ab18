//! Deprecated entry points kept for existing integrations.

use sc_api_types::InvalidRequest;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::{BASE_URL, Client, ClientConfig, ClientError, Method};

#[deprecated(note = "use `Client::new`")]
pub fn initialize(config: ClientConfig) -> Client {
    warn!("`initialize` is deprecated, use `Client::new` instead");
    Client::new(config)
}

/// Result of the legacy [`sign`] helper: a URL, or an OAuth-style error
/// value for malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacySignUrl {
    Url(String),
    Invalid(InvalidRequest),
}

/// Hosted signing URL for a named request, e.g. `sign("vote", {...}, None)`.
/// `params` must be a JSON object.
#[deprecated(note = "use `Client::send_operation`")]
pub fn sign(name: &str, params: &Value, redirect_uri: Option<&str>) -> LegacySignUrl {
    warn!("`sign` is deprecated");

    let Some(params) = params.as_object().filter(|_| !name.is_empty()) else {
        return LegacySignUrl::Invalid(InvalidRequest {
            error: "invalid_request".to_owned(),
            error_description: "Request has an invalid format".to_owned(),
        });
    };

    let query = params
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => urlencoding::encode(s).into_owned(),
                other => urlencoding::encode(&other.to_string()).into_owned(),
            };
            format!("{key}={value}")
        })
        .collect::<Vec<_>>()
        .join("&");

    let mut url = format!("{BASE_URL}/sign/{name}?{query}");
    if let Some(redirect_uri) = redirect_uri.filter(|uri| !uri.is_empty()) {
        url.push_str("&redirect_uri=");
        url.push_str(&urlencoding::encode(redirect_uri));
    }
    LegacySignUrl::Url(url)
}

impl Client {
    /// The OAuth base URL is fixed; only the API URL can be changed.
    #[deprecated(note = "the base URL is fixed, use `set_api_url`")]
    pub fn set_base_url(&mut self) -> &mut Self {
        warn!("`set_base_url` is deprecated, the base URL is always {BASE_URL}; use `set_api_url`");
        self
    }

    #[deprecated]
    pub async fn update_user_metadata(&self, metadata: &Value) -> Result<Value, ClientError> {
        warn!("`update_user_metadata` is deprecated");
        self.send("me", Method::PUT, &json!({ "user_metadata": metadata }))
            .await
    }
}
