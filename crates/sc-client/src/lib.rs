//! SteemConnect client SDK.
//!
//! [`Client`] holds the session (app id, callback URL, access token, scope)
//! and exposes the verb surface. Every verb ends up in one of two places:
//! the [`Dispatcher`], which picks a signing backend for the current
//! [`Environment`](sc_bridge::Environment), or the HTTP transport.
//!
//! Calls are futures. [`callback::deliver`] adapts any of them to a
//! completion handler that is invoked exactly once.

pub mod callback;
mod client;
mod config;
mod dispatch;
mod error;
mod legacy;
mod login;

#[cfg(test)]
mod testing;

pub use client::Client;
pub use config::{ClientConfig, parse_scope};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::ClientError;
#[allow(deprecated)]
pub use legacy::{LegacySignUrl, initialize, sign};
pub use login::LoginOutcome;

pub use sc_api_types as types;
pub use sc_bridge::{BackendPolicy, SigningBackend};
pub use sc_transport::{DEFAULT_API_URL, Method};

/// Hosted OAuth origin.
pub const BASE_URL: &str = "https://steemconnect.com";

/// Hosted interactive signing origin used when no bridge can sign.
pub const BETA_URL: &str = "https://beta.steemconnect.com";
