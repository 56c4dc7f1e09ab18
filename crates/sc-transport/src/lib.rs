use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use sc_api_types::is_truthy;
use serde_json::Value;
use tracing::debug;

pub use reqwest::Method;

pub const DEFAULT_API_URL: &str = "https://api.steemconnect.com";

const ACCEPT_VALUE: &str = "application/json, text/plain, */*";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Non-200 status or a body-level `error`; `body` is the parsed response.
    #[error("api error (HTTP {status}): {body}")]
    Api { status: u16, body: Value },
    #[error("api response is not JSON (HTTP {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    #[error("api transport: {0}")]
    Network(#[from] reqwest::Error),
}

impl TransportError {
    pub fn body(&self) -> Option<&Value> {
        match self {
            TransportError::Api { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Api { status, .. } | TransportError::Decode { status, .. } => {
                Some(*status)
            }
            TransportError::Network(err) => err.status().map(|s| s.as_u16()),
        }
    }
}

/// JSON transport for the hosted SteemConnect API.
#[derive(Debug, Clone)]
pub struct Transport {
    api_url: String,
    http: reqwest::Client,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl Transport {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(api_url, reqwest::Client::new())
    }

    pub fn with_client(api_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_owned(),
            http,
        }
    }

    /// Same HTTP client, different API base.
    pub fn with_api_url(&self, api_url: impl Into<String>) -> Self {
        Self::with_client(api_url, self.http.clone())
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn route_url(&self, route: &str) -> String {
        format!("{}/api/{}", self.api_url, route.trim_start_matches('/'))
    }

    /// Calls `{api_url}/api/{route}` with a JSON body.
    ///
    /// `access_token` goes out verbatim as the `Authorization` header; the
    /// hosted API expects the raw token, not a `Bearer` credential.
    pub async fn send(
        &self,
        route: &str,
        method: Method,
        body: &Value,
        access_token: Option<&str>,
    ) -> Result<Value, TransportError> {
        let url = self.route_url(route);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(ACCEPT, ACCEPT_VALUE)
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(token) = access_token {
            request = request.header(AUTHORIZATION, token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        debug!(route, %method, status, "api response");

        normalize_response(status, &bytes)
    }
}

/// Collapses the two failure signals of the hosted API into one shape.
pub fn normalize_response(status: u16, body: &[u8]) -> Result<Value, TransportError> {
    let parsed: Value =
        serde_json::from_slice(body).map_err(|source| TransportError::Decode { status, source })?;

    if status != 200 || parsed.get("error").is_some_and(is_truthy) {
        return Err(TransportError::Api {
            status,
            body: parsed,
        });
    }

    Ok(parsed)
}
