use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A chain operation in its `[name, params]` wire form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operation(pub String, pub Value);

impl Operation {
    pub fn new(name: impl Into<String>, params: Value) -> Self {
        Self(name.into(), params)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn params(&self) -> &Value {
        &self.1
    }

    pub fn vote(voter: &str, author: &str, permlink: &str, weight: i32) -> Self {
        Self::new(
            "vote",
            json!({
                "voter": voter,
                "author": author,
                "permlink": permlink,
                "weight": weight,
            }),
        )
    }

    pub fn comment(comment: &Comment) -> Self {
        Self::new(
            "comment",
            json!({
                "parent_author": comment.parent_author,
                "parent_permlink": comment.parent_permlink,
                "author": comment.author,
                "permlink": comment.permlink,
                "title": comment.title,
                "body": comment.body,
                "json_metadata": comment.json_metadata.to_string(),
            }),
        )
    }

    pub fn delete_comment(author: &str, permlink: &str) -> Self {
        Self::new(
            "delete_comment",
            json!({
                "author": author,
                "permlink": permlink,
            }),
        )
    }

    pub fn custom_json(
        required_auths: &[String],
        required_posting_auths: &[String],
        id: &str,
        json: &str,
    ) -> Self {
        Self::new(
            "custom_json",
            json!({
                "required_auths": required_auths,
                "required_posting_auths": required_posting_auths,
                "id": id,
                "json": json,
            }),
        )
    }

    pub fn claim_reward_balance(
        account: &str,
        reward_steem: &str,
        reward_sbd: &str,
        reward_vests: &str,
    ) -> Self {
        Self::new(
            "claim_reward_balance",
            json!({
                "account": account,
                "reward_steem": reward_steem,
                "reward_sbd": reward_sbd,
                "reward_vests": reward_vests,
            }),
        )
    }
}

/// Parameters of a `comment` operation. `json_metadata` goes on the wire as
/// a JSON string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub parent_author: String,
    pub parent_permlink: String,
    pub author: String,
    pub permlink: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub json_metadata: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    #[serde(default)]
    pub ref_block_num: u16,
    #[serde(default)]
    pub ref_block_prefix: u32,
    #[serde(default)]
    pub expiration: String,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub extensions: Vec<Value>,
}

/// Per-request parameters carried in a signing URI query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignParams {
    /// Where the signer redirects once the request is completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
    #[serde(default)]
    pub no_broadcast: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
}

impl SignParams {
    pub fn with_callback(callback: impl Into<String>) -> Self {
        Self {
            callback: Some(callback.into()),
            ..Self::default()
        }
    }
}

/// Something waiting to be authorized by the account holder.
#[derive(Debug, Clone, PartialEq)]
pub enum SigningIntent {
    Transaction {
        tx: Transaction,
        params: SignParams,
    },
    OperationList {
        ops: Vec<Operation>,
        params: SignParams,
    },
    SingleOperation {
        op: Operation,
        params: SignParams,
    },
}

impl SigningIntent {
    pub fn kind(&self) -> &'static str {
        match self {
            SigningIntent::Transaction { .. } => "transaction",
            SigningIntent::OperationList { .. } => "operations",
            SigningIntent::SingleOperation { .. } => "operation",
        }
    }

    pub fn params(&self) -> &SignParams {
        match self {
            SigningIntent::Transaction { params, .. }
            | SigningIntent::OperationList { params, .. }
            | SigningIntent::SingleOperation { params, .. } => params,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Code,
    Token,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Code => "code",
            ResponseType::Token => "token",
        }
    }
}

impl std::str::FromStr for ResponseType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "code" => Ok(ResponseType::Code),
            "token" => Ok(ResponseType::Token),
            other => Err(format!("unknown response type: {other}")),
        }
    }
}

/// Authority a keychain request is signed with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum KeyType {
    Posting,
    Active,
    Memo,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Posting => "Posting",
            KeyType::Active => "Active",
            KeyType::Memo => "Memo",
        }
    }
}

/// Response handed to every keychain callback.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KeychainResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KeychainResponse {
    /// Splits the response on its `error` field; the whole response is the
    /// success value, the bare error value is the failure.
    pub fn into_result(self) -> Result<KeychainResponse, Value> {
        match &self.error {
            Some(error) if is_truthy(error) => Err(error.clone()),
            _ => Ok(self),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Arguments of the keychain `requestPost` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeychainPost {
    pub account: String,
    pub title: String,
    pub body: String,
    pub parent_permlink: String,
    pub parent_author: String,
    pub json_metadata: String,
    pub permlink: String,
    pub comment_options: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtensionLoginParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginOptions {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
}

/// Login challenge signed by the keychain; base64 of its JSON is the token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginMessage {
    pub signed_message: SignedMessage,
    pub authors: Vec<String>,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvalidRequest {
    pub error: String,
    pub error_description: String,
}

/// Truthiness of a JSON value as the hosted API and the bridges treat it.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
