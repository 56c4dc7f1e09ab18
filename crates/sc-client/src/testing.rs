//! In-memory bridges that record every call.

use async_trait::async_trait;
use sc_api_types::{ExtensionLoginParams, KeyType, KeychainPost, KeychainResponse};
use sc_bridge::{BridgeError, ExtensionBridge, KeychainBridge};
use serde_json::{Value, json};
use std::cell::RefCell;

pub(crate) struct FakeExtension {
    pub(crate) signed: RefCell<Vec<String>>,
    pub(crate) logins: RefCell<Vec<ExtensionLoginParams>>,
    reply: Result<Value, Value>,
}

impl FakeExtension {
    pub(crate) fn approving() -> Self {
        Self::replying(Ok(json!({ "id": "txid-1", "block_num": 42 })))
    }

    pub(crate) fn replying(reply: Result<Value, Value>) -> Self {
        Self {
            signed: RefCell::new(Vec::new()),
            logins: RefCell::new(Vec::new()),
            reply,
        }
    }
}

#[async_trait(?Send)]
impl ExtensionBridge for FakeExtension {
    async fn sign(&self, uri: &str) -> Result<Value, BridgeError> {
        self.signed.borrow_mut().push(uri.to_owned());
        self.reply.clone().map_err(BridgeError)
    }

    async fn login(&self, params: &ExtensionLoginParams) -> Result<Value, BridgeError> {
        self.logins.borrow_mut().push(params.clone());
        self.reply.clone().map_err(BridgeError)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum KeychainCall {
    Vote {
        account: String,
        permlink: String,
        author: String,
        weight: i32,
    },
    Post(KeychainPost),
    CustomJson {
        account: String,
        id: String,
        key_type: KeyType,
        json: String,
        display_msg: String,
    },
    SignBuffer {
        account: String,
        message: String,
        key_type: KeyType,
    },
}

pub(crate) struct FakeKeychain {
    pub(crate) calls: RefCell<Vec<KeychainCall>>,
    reply: KeychainResponse,
}

impl FakeKeychain {
    pub(crate) fn approving() -> Self {
        Self::replying(json!({ "success": true, "result": "sig-1", "message": "ok" }))
    }

    pub(crate) fn replying(reply: Value) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            reply: serde_json::from_value(reply).unwrap(),
        }
    }

    fn record(&self, call: KeychainCall) -> KeychainResponse {
        self.calls.borrow_mut().push(call);
        self.reply.clone()
    }
}

#[async_trait(?Send)]
impl KeychainBridge for FakeKeychain {
    async fn request_vote(
        &self,
        account: &str,
        permlink: &str,
        author: &str,
        weight: i32,
    ) -> KeychainResponse {
        self.record(KeychainCall::Vote {
            account: account.to_owned(),
            permlink: permlink.to_owned(),
            author: author.to_owned(),
            weight,
        })
    }

    async fn request_post(&self, post: &KeychainPost) -> KeychainResponse {
        self.record(KeychainCall::Post(post.clone()))
    }

    async fn request_custom_json(
        &self,
        account: &str,
        id: &str,
        key_type: KeyType,
        json: &str,
        display_msg: &str,
    ) -> KeychainResponse {
        self.record(KeychainCall::CustomJson {
            account: account.to_owned(),
            id: id.to_owned(),
            key_type,
            json: json.to_owned(),
            display_msg: display_msg.to_owned(),
        })
    }

    async fn request_sign_buffer(
        &self,
        account: &str,
        message: &str,
        key_type: KeyType,
    ) -> KeychainResponse {
        self.record(KeychainCall::SignBuffer {
            account: account.to_owned(),
            message: message.to_owned(),
            key_type,
        })
    }
}
