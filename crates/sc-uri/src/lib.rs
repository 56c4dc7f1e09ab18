//! `steem://` signing URIs.
//!
//! A signing URI carries a transaction, an operation list or a single
//! operation as base64u-encoded JSON:
//!
//! ```text
//! steem://sign/{tx|ops|op}/<b64u(JSON)>[?nb&s=<signer>&cb=<b64u(callback)>]
//! ```
//!
//! base64u is standard base64 with `+` → `-`, `/` → `_` and `=` → `.`.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use sc_api_types::{Operation, SignParams, SigningIntent, Transaction};

pub const STEEM_SCHEME: &str = "steem://";

#[derive(Debug, thiserror::Error)]
pub enum UriError {
    #[error("failed to serialize signing payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid base64u payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Produces canonical signing URIs for pending requests.
pub trait UriEncoder {
    fn encode_tx(&self, tx: &Transaction, params: &SignParams) -> Result<String, UriError>;
    fn encode_ops(&self, ops: &[Operation], params: &SignParams) -> Result<String, UriError>;
    fn encode_op(&self, op: &Operation, params: &SignParams) -> Result<String, UriError>;

    fn encode_intent(&self, intent: &SigningIntent) -> Result<String, UriError> {
        match intent {
            SigningIntent::Transaction { tx, params } => self.encode_tx(tx, params),
            SigningIntent::OperationList { ops, params } => self.encode_ops(ops, params),
            SigningIntent::SingleOperation { op, params } => self.encode_op(op, params),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SteemUriEncoder;

impl SteemUriEncoder {
    fn encode(&self, kind: &str, payload: &impl serde::Serialize, params: &SignParams) -> Result<String, UriError> {
        let json = serde_json::to_string(payload)?;
        Ok(format!(
            "{STEEM_SCHEME}sign/{kind}/{}{}",
            b64u_encode(json.as_bytes()),
            encode_params(params)
        ))
    }
}

impl UriEncoder for SteemUriEncoder {
    fn encode_tx(&self, tx: &Transaction, params: &SignParams) -> Result<String, UriError> {
        self.encode("tx", tx, params)
    }

    fn encode_ops(&self, ops: &[Operation], params: &SignParams) -> Result<String, UriError> {
        self.encode("ops", &ops, params)
    }

    fn encode_op(&self, op: &Operation, params: &SignParams) -> Result<String, UriError> {
        self.encode("op", op, params)
    }
}

fn encode_params(params: &SignParams) -> String {
    let mut out = Vec::new();
    if params.no_broadcast {
        out.push("nb".to_owned());
    }
    if let Some(signer) = params.signer.as_deref().filter(|s| !s.is_empty()) {
        out.push(format!("s={}", urlencoding::encode(signer)));
    }
    if let Some(callback) = params.callback.as_deref().filter(|c| !c.is_empty()) {
        out.push(format!("cb={}", b64u_encode(callback.as_bytes())));
    }

    if out.is_empty() {
        String::new()
    } else {
        format!("?{}", out.join("&"))
    }
}

pub fn b64u_encode(input: &[u8]) -> String {
    STANDARD
        .encode(input)
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            '=' => '.',
            other => other,
        })
        .collect()
}

pub fn b64u_decode(input: &str) -> Result<Vec<u8>, UriError> {
    let standard: String = input
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            '.' => '=',
            other => other,
        })
        .collect();
    Ok(STANDARD.decode(standard)?)
}

/// Rewrites a `steem://` URI onto a hosted signing origin.
pub fn web_fallback_url(uri: &str, origin: &str) -> String {
    match uri.strip_prefix(STEEM_SCHEME) {
        Some(rest) => format!("{}/{}", origin.trim_end_matches('/'), rest),
        None => uri.to_owned(),
    }
}
