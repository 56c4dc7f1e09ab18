use sc_api_types::ResponseType;
use sc_bridge::BackendPolicy;
use sc_transport::DEFAULT_API_URL;
use serde::{Deserialize, Serialize};

use crate::ClientError;

/// Session configuration a [`Client`](crate::Client) starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_url: String,
    pub app: String,
    pub callback_url: String,
    pub access_token: Option<String>,
    pub scope: Vec<String>,
    pub response_type: Option<ResponseType>,
    pub backend_policy: BackendPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            app: String::new(),
            callback_url: String::new(),
            access_token: None,
            scope: Vec::new(),
            response_type: None,
            backend_policy: BackendPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(app: impl Into<String>, callback_url: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            callback_url: callback_url.into(),
            ..Self::default()
        }
    }

    /// Reads `STEEMCONNECT_*` variables; unset or blank ones keep defaults.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(api_url) = var("STEEMCONNECT_API_URL") {
            config.api_url = api_url;
        }
        if let Some(app) = var("STEEMCONNECT_APP") {
            config.app = app;
        }
        if let Some(callback_url) = var("STEEMCONNECT_CALLBACK_URL") {
            config.callback_url = callback_url;
        }
        config.access_token = var("STEEMCONNECT_ACCESS_TOKEN");
        if let Some(scope) = var("STEEMCONNECT_SCOPE") {
            config.scope = parse_scope(&scope);
        }
        if let Some(response_type) = var("STEEMCONNECT_RESPONSE_TYPE") {
            config.response_type = Some(response_type.parse().map_err(ClientError::Config)?);
        }
        if let Some(policy) = var("STEEMCONNECT_BACKEND_POLICY") {
            config.backend_policy = match policy.as_str() {
                "keychain_first" => BackendPolicy::KeychainFirst,
                "extension_first" => BackendPolicy::ExtensionFirst,
                other => return Err(ClientError::Config(format!("unknown backend policy: {other}"))),
            };
        }

        Ok(config)
    }
}

/// Splits a comma-separated scope list, dropping empty entries.
pub fn parse_scope(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_hosted_api() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.api_url, "https://api.steemconnect.com");
        assert!(config.scope.is_empty());
        assert_eq!(config.backend_policy, BackendPolicy::KeychainFirst);
    }

    #[test]
    fn reads_every_variable() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("STEEMCONNECT_API_URL", "http://localhost:4000"),
            ("STEEMCONNECT_APP", "myapp"),
            ("STEEMCONNECT_CALLBACK_URL", "https://x.io/cb"),
            ("STEEMCONNECT_ACCESS_TOKEN", " tok "),
            ("STEEMCONNECT_SCOPE", "vote, comment,,custom_json"),
            ("STEEMCONNECT_RESPONSE_TYPE", "code"),
            ("STEEMCONNECT_BACKEND_POLICY", "extension_first"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "http://localhost:4000");
        assert_eq!(config.app, "myapp");
        assert_eq!(config.callback_url, "https://x.io/cb");
        assert_eq!(config.access_token.as_deref(), Some("tok"));
        assert_eq!(config.scope, vec!["vote", "comment", "custom_json"]);
        assert_eq!(config.response_type, Some(ResponseType::Code));
        assert_eq!(config.backend_policy, BackendPolicy::ExtensionFirst);
    }

    #[test]
    fn blank_token_is_unset() {
        let config =
            ClientConfig::from_lookup(lookup(&[("STEEMCONNECT_ACCESS_TOKEN", "   ")])).unwrap();
        assert!(config.access_token.is_none());
    }

    #[test]
    fn rejects_unknown_enums() {
        let err = ClientConfig::from_lookup(lookup(&[("STEEMCONNECT_RESPONSE_TYPE", "implicit")]))
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));

        let err = ClientConfig::from_lookup(lookup(&[("STEEMCONNECT_BACKEND_POLICY", "random")]))
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn deserializes_partial_json() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"app":"myapp","scope":["vote"],"response_type":"code"}"#)
                .unwrap();
        assert_eq!(config.app, "myapp");
        assert_eq!(config.api_url, "https://api.steemconnect.com");
        assert_eq!(config.response_type, Some(ResponseType::Code));
    }
}
