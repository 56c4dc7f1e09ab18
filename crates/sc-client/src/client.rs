use sc_api_types::{
    Comment, KeyType, KeychainPost, KeychainResponse, Operation, ResponseType, SignParams,
    Transaction,
};
use sc_bridge::{
    BackendPolicy, BridgeError, Environment, HeadlessEnvironment, ResolvedBackend, SigningBackend,
};
use sc_transport::{Method, Transport};
use serde_json::{Value, json};
use std::rc::Rc;
use tracing::debug;

use crate::callback::deliver;
use crate::{ClientConfig, ClientError, DispatchOutcome, Dispatcher};

/// A SteemConnect session.
///
/// Cloning is cheap and yields an independent session that shares the
/// environment and HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    pub(crate) transport: Transport,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) app: String,
    pub(crate) callback_url: String,
    pub(crate) access_token: Option<String>,
    pub(crate) scope: Vec<String>,
    pub(crate) response_type: Option<ResponseType>,
}

impl Client {
    /// Client with no signing bridges; every signing request falls back to
    /// the hosted signing page.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_environment(config, Rc::new(HeadlessEnvironment))
    }

    pub fn with_environment(config: ClientConfig, env: Rc<dyn Environment>) -> Self {
        Self {
            transport: Transport::new(config.api_url),
            dispatcher: Dispatcher::new(env).with_policy(config.backend_policy),
            app: config.app,
            callback_url: config.callback_url,
            access_token: config.access_token,
            scope: config.scope,
            response_type: config.response_type,
        }
    }

    pub fn set_api_url(&mut self, api_url: impl Into<String>) -> &mut Self {
        self.transport = self.transport.with_api_url(api_url);
        self
    }

    pub fn set_app(&mut self, app: impl Into<String>) -> &mut Self {
        self.app = app.into();
        self
    }

    pub fn set_callback_url(&mut self, callback_url: impl Into<String>) -> &mut Self {
        self.callback_url = callback_url.into();
        self
    }

    pub fn set_access_token(&mut self, access_token: impl Into<String>) -> &mut Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn remove_access_token(&mut self) -> &mut Self {
        self.access_token = None;
        self
    }

    pub fn set_scope(&mut self, scope: Vec<String>) -> &mut Self {
        self.scope = scope;
        self
    }

    pub fn set_response_type(&mut self, response_type: ResponseType) -> &mut Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn set_backend_policy(&mut self, policy: BackendPolicy) -> &mut Self {
        self.dispatcher.set_policy(policy);
        self
    }

    pub fn api_url(&self) -> &str {
        self.transport.api_url()
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn response_type(&self) -> Option<ResponseType> {
        self.response_type
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn backend(&self) -> SigningBackend {
        self.dispatcher.backend().kind()
    }

    /// Calls an API route with the current access token.
    pub async fn send(&self, route: &str, method: Method, body: &Value) -> Result<Value, ClientError> {
        let token = self.access_token.as_deref();
        Ok(self.transport.send(route, method, body, token).await?)
    }

    pub async fn send_with(
        &self,
        route: &str,
        method: Method,
        body: &Value,
        handler: impl FnOnce(Result<Value, ClientError>),
    ) {
        deliver(self.send(route, method, body), handler).await
    }

    pub async fn me(&self) -> Result<Value, ClientError> {
        self.send("me", Method::POST, &json!({})).await
    }

    /// Broadcasts operations under the current token, or has the extension
    /// sign them when it is the active backend.
    pub async fn broadcast(&self, operations: &[Operation]) -> Result<Value, ClientError> {
        if let ResolvedBackend::Extension(extension) = self.dispatcher.backend() {
            let uri = self
                .dispatcher
                .encoder()
                .encode_ops(operations, &SignParams::default())?;
            return Ok(extension.sign(&uri).await?);
        }

        self.send("broadcast", Method::POST, &json!({ "operations": operations }))
            .await
    }

    pub async fn vote(
        &self,
        voter: &str,
        author: &str,
        permlink: &str,
        weight: i32,
    ) -> Result<Value, ClientError> {
        if let ResolvedBackend::Keychain(keychain) = self.dispatcher.backend() {
            debug!("voting through keychain");
            return keychain_result(keychain.request_vote(voter, permlink, author, weight).await);
        }

        self.broadcast(&[Operation::vote(voter, author, permlink, weight)])
            .await
    }

    pub async fn comment(&self, comment: &Comment) -> Result<Value, ClientError> {
        if let ResolvedBackend::Keychain(keychain) = self.dispatcher.backend() {
            debug!("posting through keychain");
            let post = KeychainPost {
                account: comment.author.clone(),
                title: comment.title.clone(),
                body: comment.body.clone(),
                parent_permlink: comment.parent_permlink.clone(),
                parent_author: comment.parent_author.clone(),
                json_metadata: comment.json_metadata.to_string(),
                permlink: comment.permlink.clone(),
                comment_options: String::new(),
            };
            return keychain_result(keychain.request_post(&post).await);
        }

        self.broadcast(&[Operation::comment(comment)]).await
    }

    pub async fn delete_comment(&self, author: &str, permlink: &str) -> Result<Value, ClientError> {
        self.broadcast(&[Operation::delete_comment(author, permlink)])
            .await
    }

    /// Under keychain the request is signed by the first posting authority,
    /// or by the first active one when no posting authority is given.
    pub async fn custom_json(
        &self,
        required_auths: &[String],
        required_posting_auths: &[String],
        id: &str,
        json: &str,
    ) -> Result<Value, ClientError> {
        if let ResolvedBackend::Keychain(keychain) = self.dispatcher.backend() {
            let (account, key_type) = match (required_posting_auths.first(), required_auths.first()) {
                (Some(account), _) => (account, KeyType::Posting),
                (None, Some(account)) => (account, KeyType::Active),
                (None, None) => {
                    return Err(ClientError::InvalidRequest(
                        "custom_json requires at least one authority".to_owned(),
                    ));
                }
            };
            debug!(id, key = key_type.as_str(), "custom json through keychain");
            return keychain_result(
                keychain
                    .request_custom_json(account, id, key_type, json, "")
                    .await,
            );
        }

        self.broadcast(&[Operation::custom_json(
            required_auths,
            required_posting_auths,
            id,
            json,
        )])
        .await
    }

    pub async fn reblog(&self, account: &str, author: &str, permlink: &str) -> Result<Value, ClientError> {
        let payload = json!([
            "reblog",
            { "account": account, "author": author, "permlink": permlink }
        ]);
        self.follow_op(account, &payload).await
    }

    pub async fn follow(&self, follower: &str, following: &str) -> Result<Value, ClientError> {
        self.follow_op(follower, &follow_payload(follower, following, &["blog"]))
            .await
    }

    pub async fn unfollow(&self, unfollower: &str, unfollowing: &str) -> Result<Value, ClientError> {
        self.follow_op(unfollower, &follow_payload(unfollower, unfollowing, &[]))
            .await
    }

    pub async fn ignore(&self, follower: &str, following: &str) -> Result<Value, ClientError> {
        self.follow_op(follower, &follow_payload(follower, following, &["ignore"]))
            .await
    }

    async fn follow_op(&self, account: &str, payload: &Value) -> Result<Value, ClientError> {
        self.custom_json(&[], &[account.to_owned()], "follow", &payload.to_string())
            .await
    }

    pub async fn claim_reward_balance(
        &self,
        account: &str,
        reward_steem: &str,
        reward_sbd: &str,
        reward_vests: &str,
    ) -> Result<Value, ClientError> {
        self.broadcast(&[Operation::claim_reward_balance(
            account,
            reward_steem,
            reward_sbd,
            reward_vests,
        )])
        .await
    }

    /// Revokes the current token. The token is dropped from the session
    /// whatever the server answers.
    pub async fn revoke_token(&mut self) -> Result<Value, ClientError> {
        let body = json!({ "token": self.access_token });
        let result = self.send("oauth2/token/revoke", Method::POST, &body).await;
        self.remove_access_token();
        result
    }

    pub async fn send_transaction(
        &self,
        tx: Transaction,
        params: SignParams,
    ) -> Result<DispatchOutcome, ClientError> {
        self.dispatcher.send_transaction(tx, params).await
    }

    pub async fn send_operations(
        &self,
        ops: Vec<Operation>,
        params: SignParams,
    ) -> Result<DispatchOutcome, ClientError> {
        self.dispatcher.send_operations(ops, params).await
    }

    pub async fn send_operation(
        &self,
        op: Operation,
        params: SignParams,
    ) -> Result<DispatchOutcome, ClientError> {
        self.dispatcher.send_operation(op, params).await
    }
}

fn follow_payload(follower: &str, following: &str, what: &[&str]) -> Value {
    json!([
        "follow",
        { "follower": follower, "following": following, "what": what }
    ])
}

pub(crate) fn keychain_result(response: KeychainResponse) -> Result<Value, ClientError> {
    response
        .into_result()
        .map(|response| response.to_value())
        .map_err(|error| ClientError::Bridge(BridgeError(error)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeExtension, FakeKeychain, KeychainCall};
    use sc_bridge::StaticEnvironment;
    use wiremock::matchers::{any, body_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn client_for(server: &MockServer) -> Client {
        let mut config = ClientConfig::new("myapp", "https://x.io/cb");
        config.api_url = server.uri();
        Client::new(config)
    }

    fn client_with_env(server: &MockServer, env: StaticEnvironment) -> Client {
        let mut config = ClientConfig::new("myapp", "https://x.io/cb");
        config.api_url = server.uri();
        Client::with_environment(config, Rc::new(env))
    }

    async fn forbid_http(server: &MockServer) {
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn vote_without_bridges_broadcasts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/broadcast"))
            .and(body_json(json!({
                "operations": [["vote", {
                    "voter": "alice",
                    "author": "bob",
                    "permlink": "permlink-1",
                    "weight": 10000
                }]]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": { "id": "tx" } })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.vote("alice", "bob", "permlink-1", 10000).await.unwrap();
        assert_eq!(result, json!({ "result": { "id": "tx" } }));
    }

    #[tokio::test]
    async fn wire_body_keeps_field_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/broadcast"))
            .and(|req: &Request| {
                String::from_utf8_lossy(&req.body)
                    == r#"{"operations":[["vote",{"voter":"alice","author":"bob","permlink":"permlink-1","weight":10000}]]}"#
            })
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .vote("alice", "bob", "permlink-1", 10000)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn token_goes_out_raw() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/me"))
            .and(header("authorization", "tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": "alice" })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        client.set_access_token("tok-123");
        assert_eq!(client.me().await.unwrap(), json!({ "user": "alice" }));
    }

    #[tokio::test]
    async fn no_token_means_no_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/me"))
            .and(|req: &Request| !req.headers.contains_key("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).me().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_token_reaches_handler_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid_token" })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut calls = Vec::new();
        client
            .send_with("me", Method::POST, &json!({}), |result| {
                calls.push(result.map_err(|err| err.payload()));
            })
            .await;

        assert_eq!(calls, vec![Err(json!({ "error": "invalid_token" }))]);
    }

    #[tokio::test]
    async fn error_field_on_200_rejects() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/broadcast"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "error": "rpc_error", "error_description": "missing auth" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .delete_comment("alice", "post-1")
            .await
            .unwrap_err();
        assert_eq!(
            err.payload(),
            json!({ "error": "rpc_error", "error_description": "missing auth" })
        );
    }

    #[tokio::test]
    async fn revoke_clears_token_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/oauth2/token/revoke"))
            .and(body_json(json!({ "token": "tok-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        client.set_access_token("tok-1");
        assert_eq!(client.revoke_token().await.unwrap(), json!({ "success": true }));
        assert_eq!(client.access_token(), None);
    }

    #[tokio::test]
    async fn revoke_clears_token_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/oauth2/token/revoke"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "server_error" })))
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        client.set_access_token("tok-1");
        let err = client.revoke_token().await.unwrap_err();
        assert_eq!(err.payload(), json!({ "error": "server_error" }));
        assert_eq!(client.access_token(), None);
    }

    #[tokio::test]
    async fn follow_family_payloads() {
        let server = MockServer::start().await;
        let expectations = [
            r#"["follow",{"follower":"alice","following":"bob","what":["blog"]}]"#,
            r#"["follow",{"follower":"alice","following":"bob","what":[]}]"#,
            r#"["follow",{"follower":"alice","following":"bob","what":["ignore"]}]"#,
            r#"["reblog",{"account":"alice","author":"bob","permlink":"post-1"}]"#,
        ];
        for payload in expectations {
            Mock::given(method("POST"))
                .and(path("/api/broadcast"))
                .and(body_json(json!({
                    "operations": [["custom_json", {
                        "required_auths": [],
                        "required_posting_auths": ["alice"],
                        "id": "follow",
                        "json": payload
                    }]]
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client_for(&server);
        client.follow("alice", "bob").await.unwrap();
        client.unfollow("alice", "bob").await.unwrap();
        client.ignore("alice", "bob").await.unwrap();
        client.reblog("alice", "bob", "post-1").await.unwrap();
    }

    #[tokio::test]
    async fn comment_broadcast_stringifies_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/broadcast"))
            .and(body_json(json!({
                "operations": [["comment", {
                    "parent_author": "",
                    "parent_permlink": "steem",
                    "author": "alice",
                    "permlink": "hello",
                    "title": "Hello",
                    "body": "world",
                    "json_metadata": r#"{"tags":["steem"]}"#
                }]]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let comment = Comment {
            parent_permlink: "steem".to_owned(),
            author: "alice".to_owned(),
            permlink: "hello".to_owned(),
            title: "Hello".to_owned(),
            body: "world".to_owned(),
            json_metadata: json!({ "tags": ["steem"] }),
            ..Comment::default()
        };
        client_for(&server).comment(&comment).await.unwrap();
    }

    #[tokio::test]
    async fn claim_reward_balance_broadcasts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/broadcast"))
            .and(body_json(json!({
                "operations": [["claim_reward_balance", {
                    "account": "alice",
                    "reward_steem": "0.000 STEEM",
                    "reward_sbd": "1.000 SBD",
                    "reward_vests": "10.000000 VESTS"
                }]]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .claim_reward_balance("alice", "0.000 STEEM", "1.000 SBD", "10.000000 VESTS")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn broadcast_with_extension_never_hits_http() {
        let server = MockServer::start().await;
        forbid_http(&server).await;

        let extension = Rc::new(FakeExtension::approving());
        let client = client_with_env(
            &server,
            StaticEnvironment::browser().with_extension(extension.clone()),
        );

        let result = client.vote("alice", "bob", "permlink-1", 10000).await.unwrap();
        assert_eq!(result, json!({ "id": "txid-1", "block_num": 42 }));
        let signed = extension.signed.borrow();
        assert_eq!(signed.len(), 1);
        assert!(signed[0].starts_with("steem://sign/ops/"));
    }

    #[tokio::test]
    async fn custom_json_with_keychain_never_hits_http() {
        let server = MockServer::start().await;
        forbid_http(&server).await;

        let keychain = Rc::new(FakeKeychain::approving());
        let client = client_with_env(
            &server,
            StaticEnvironment::browser().with_keychain(keychain.clone()),
        );

        let result = client
            .custom_json(&[], &["alice".to_owned()], "app-id", r#"{"a":1}"#)
            .await
            .unwrap();
        assert_eq!(result["result"], json!("sig-1"));
        assert_eq!(
            keychain.calls.borrow().as_slice(),
            &[KeychainCall::CustomJson {
                account: "alice".to_owned(),
                id: "app-id".to_owned(),
                key_type: KeyType::Posting,
                json: r#"{"a":1}"#.to_owned(),
                display_msg: String::new(),
            }]
        );
    }

    #[tokio::test]
    async fn keychain_custom_json_falls_back_to_active_authority() {
        let server = MockServer::start().await;
        forbid_http(&server).await;

        let keychain = Rc::new(FakeKeychain::approving());
        let client = client_with_env(
            &server,
            StaticEnvironment::browser().with_keychain(keychain.clone()),
        );

        client
            .custom_json(&["bob".to_owned()], &[], "app-id", "{}")
            .await
            .unwrap();
        assert!(matches!(
            &keychain.calls.borrow()[0],
            KeychainCall::CustomJson { account, key_type: KeyType::Active, .. } if account == "bob"
        ));

        let err = client.custom_json(&[], &[], "app-id", "{}").await.unwrap_err();
        assert_eq!(err.payload()["error"], json!("invalid_request"));
    }

    #[tokio::test]
    async fn keychain_vote_and_post_are_positional() {
        let server = MockServer::start().await;
        forbid_http(&server).await;

        let keychain = Rc::new(FakeKeychain::approving());
        let client = client_with_env(
            &server,
            StaticEnvironment::browser().with_keychain(keychain.clone()),
        );

        client.vote("alice", "bob", "permlink-1", 5000).await.unwrap();
        client
            .comment(&Comment {
                parent_author: "carol".to_owned(),
                parent_permlink: "root".to_owned(),
                author: "alice".to_owned(),
                permlink: "re-root".to_owned(),
                title: String::new(),
                body: "nice".to_owned(),
                json_metadata: json!({}),
            })
            .await
            .unwrap();

        assert_eq!(
            keychain.calls.borrow().as_slice(),
            &[
                KeychainCall::Vote {
                    account: "alice".to_owned(),
                    permlink: "permlink-1".to_owned(),
                    author: "bob".to_owned(),
                    weight: 5000,
                },
                KeychainCall::Post(KeychainPost {
                    account: "alice".to_owned(),
                    title: String::new(),
                    body: "nice".to_owned(),
                    parent_permlink: "root".to_owned(),
                    parent_author: "carol".to_owned(),
                    json_metadata: "{}".to_owned(),
                    permlink: "re-root".to_owned(),
                    comment_options: String::new(),
                }),
            ]
        );
    }

    #[tokio::test]
    async fn keychain_error_is_returned_verbatim() {
        let server = MockServer::start().await;
        forbid_http(&server).await;

        let keychain = Rc::new(FakeKeychain::replying(json!({
            "success": false,
            "error": "user_cancel",
            "message": "Request was canceled by the user."
        })));
        let client = client_with_env(&server, StaticEnvironment::browser().with_keychain(keychain));

        let err = client.vote("alice", "bob", "p", 100).await.unwrap_err();
        assert_eq!(err.payload(), json!("user_cancel"));
    }

    #[tokio::test]
    async fn set_api_url_redirects_requests() {
        let first = MockServer::start().await;
        let second = MockServer::start().await;
        Mock::given(path("/api/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "server": 2 })))
            .expect(1)
            .mount(&second)
            .await;
        forbid_http(&first).await;

        let mut client = client_for(&first);
        client.set_api_url(second.uri());
        assert_eq!(client.api_url(), second.uri());
        assert_eq!(client.me().await.unwrap(), json!({ "server": 2 }));
    }

    #[test]
    fn setters_update_session() {
        let mut client = Client::new(ClientConfig::default());
        client
            .set_app("myapp")
            .set_callback_url("https://x.io/cb")
            .set_scope(vec!["vote".to_owned()])
            .set_response_type(ResponseType::Code)
            .set_access_token("tok")
            .set_backend_policy(BackendPolicy::ExtensionFirst);

        assert_eq!(client.app(), "myapp");
        assert_eq!(client.callback_url(), "https://x.io/cb");
        assert_eq!(client.scope(), ["vote".to_owned()]);
        assert_eq!(client.response_type(), Some(ResponseType::Code));
        assert_eq!(client.access_token(), Some("tok"));
        assert_eq!(client.dispatcher().policy(), BackendPolicy::ExtensionFirst);
        assert_eq!(client.backend(), SigningBackend::None);

        client.remove_access_token();
        assert_eq!(client.access_token(), None);
    }
}
