use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use sc_client::types::{Comment, Operation, ResponseType, SignParams, Transaction};
use sc_client::{Client, ClientConfig, ClientError, DispatchOutcome, parse_scope};
use serde_json::{Value, json};
use tracing::info;

#[derive(Parser)]
#[command(name = "steemconnect")]
#[command(about = "Command-line client for the SteemConnect API", long_about = None)]
struct Cli {
    #[arg(long, env = "STEEMCONNECT_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "STEEMCONNECT_APP")]
    app: Option<String>,

    #[arg(long, env = "STEEMCONNECT_CALLBACK_URL")]
    callback_url: Option<String>,

    #[arg(long, env = "STEEMCONNECT_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Comma-separated scope list
    #[arg(long, env = "STEEMCONNECT_SCOPE")]
    scope: Option<String>,

    /// Request an authorization code instead of a token
    #[arg(long)]
    code: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the OAuth authorize URL
    LoginUrl {
        /// Opaque state echoed back to the callback; random when omitted
        #[arg(long)]
        state: Option<String>,
    },
    /// Show the authenticated user
    Me,
    /// Broadcast a JSON array of `[name, params]` operations
    Broadcast { operations: String },
    /// Upvote, or downvote with a negative weight
    Vote {
        voter: String,
        author: String,
        permlink: String,
        #[arg(allow_negative_numbers = true)]
        weight: i32,
    },
    /// Publish a post or reply
    Comment {
        #[arg(long)]
        author: String,
        #[arg(long)]
        permlink: String,
        #[arg(long, default_value = "")]
        parent_author: String,
        #[arg(long)]
        parent_permlink: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long, default_value = "{}")]
        json_metadata: String,
    },
    DeleteComment {
        author: String,
        permlink: String,
    },
    CustomJson {
        #[arg(long)]
        id: String,
        #[arg(long)]
        json: String,
        /// Active authorities
        #[arg(long = "auth")]
        required_auths: Vec<String>,
        /// Posting authorities
        #[arg(long = "posting-auth")]
        required_posting_auths: Vec<String>,
    },
    Follow {
        follower: String,
        following: String,
    },
    Unfollow {
        follower: String,
        following: String,
    },
    Ignore {
        follower: String,
        following: String,
    },
    Reblog {
        account: String,
        author: String,
        permlink: String,
    },
    ClaimRewardBalance {
        account: String,
        reward_steem: String,
        reward_sbd: String,
        reward_vests: String,
    },
    /// Revoke the access token
    Revoke,
    /// Print the hosted signing URL for a transaction or operations
    SignUrl {
        #[arg(value_enum)]
        kind: SignKind,
        /// JSON transaction, operation list or single operation
        payload: String,
        #[arg(long)]
        callback: Option<String>,
        #[arg(long)]
        no_broadcast: bool,
        #[arg(long)]
        signer: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SignKind {
    Tx,
    Ops,
    Op,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut client = Client::new(config_from(&cli)?);

    match run(&mut client, cli.command).await {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", serde_json::to_string_pretty(&err.payload())?);
            Err(err.into())
        }
    }
}

fn config_from(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("reading STEEMCONNECT_* environment")?;
    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(app) = &cli.app {
        config.app = app.clone();
    }
    if let Some(callback_url) = &cli.callback_url {
        config.callback_url = callback_url.clone();
    }
    if let Some(token) = &cli.access_token {
        config.access_token = Some(token.clone());
    }
    if let Some(scope) = &cli.scope {
        config.scope = parse_scope(scope);
    }
    if cli.code {
        config.response_type = Some(ResponseType::Code);
    }
    Ok(config)
}

async fn run(client: &mut Client, command: Commands) -> Result<Value, ClientError> {
    match command {
        Commands::LoginUrl { state } => {
            let state = state.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let url = client.get_login_url(Some(&state));
            Ok(json!({ "url": url, "state": state }))
        }
        Commands::Me => client.me().await,
        Commands::Broadcast { operations } => {
            let operations: Vec<Operation> = serde_json::from_str(&operations)?;
            client.broadcast(&operations).await
        }
        Commands::Vote {
            voter,
            author,
            permlink,
            weight,
        } => client.vote(&voter, &author, &permlink, weight).await,
        Commands::Comment {
            author,
            permlink,
            parent_author,
            parent_permlink,
            title,
            body,
            json_metadata,
        } => {
            let comment = Comment {
                parent_author,
                parent_permlink,
                author,
                permlink,
                title,
                body,
                json_metadata: serde_json::from_str(&json_metadata)?,
            };
            client.comment(&comment).await
        }
        Commands::DeleteComment { author, permlink } => {
            client.delete_comment(&author, &permlink).await
        }
        Commands::CustomJson {
            id,
            json,
            required_auths,
            required_posting_auths,
        } => {
            client
                .custom_json(&required_auths, &required_posting_auths, &id, &json)
                .await
        }
        Commands::Follow {
            follower,
            following,
        } => client.follow(&follower, &following).await,
        Commands::Unfollow {
            follower,
            following,
        } => client.unfollow(&follower, &following).await,
        Commands::Ignore {
            follower,
            following,
        } => client.ignore(&follower, &following).await,
        Commands::Reblog {
            account,
            author,
            permlink,
        } => client.reblog(&account, &author, &permlink).await,
        Commands::ClaimRewardBalance {
            account,
            reward_steem,
            reward_sbd,
            reward_vests,
        } => {
            client
                .claim_reward_balance(&account, &reward_steem, &reward_sbd, &reward_vests)
                .await
        }
        Commands::Revoke => {
            let result = client.revoke_token().await;
            info!("access token dropped from session");
            result
        }
        Commands::SignUrl {
            kind,
            payload,
            callback,
            no_broadcast,
            signer,
        } => {
            let params = SignParams {
                callback,
                no_broadcast,
                signer,
            };
            let outcome = match kind {
                SignKind::Tx => {
                    let tx: Transaction = serde_json::from_str(&payload)?;
                    client.send_transaction(tx, params).await?
                }
                SignKind::Ops => {
                    let ops: Vec<Operation> = serde_json::from_str(&payload)?;
                    client.send_operations(ops, params).await?
                }
                SignKind::Op => {
                    let op: Operation = serde_json::from_str(&payload)?;
                    client.send_operation(op, params).await?
                }
            };
            Ok(match outcome {
                DispatchOutcome::Url(url) => json!({ "url": url }),
                DispatchOutcome::Popup(handle) => json!({ "url": handle.url }),
                DispatchOutcome::Signed(result) => result,
            })
        }
    }
}
