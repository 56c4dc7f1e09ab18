use sc_bridge::BridgeError;
use sc_transport::TransportError;
use sc_uri::UriError;
use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Uri(#[from] UriError),
    #[error("failed to encode request: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// The error as the caller should see it. API bodies and bridge errors
    /// come back verbatim; errors raised by the SDK itself are shaped like
    /// an OAuth error body.
    pub fn payload(&self) -> Value {
        match self {
            ClientError::Transport(err) => match err.body() {
                Some(body) => body.clone(),
                None => json!({ "error": "transport_error", "error_description": err.to_string() }),
            },
            ClientError::Bridge(BridgeError(value)) => value.clone(),
            ClientError::InvalidRequest(message) => {
                json!({ "error": "invalid_request", "error_description": message })
            }
            other => json!({ "error": "client_error", "error_description": other.to_string() }),
        }
    }
}
