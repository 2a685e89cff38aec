//! Pluggable request authentication for HTTP clients.
//!
//! A [`NetworkClient`] owns typed [`Configs`] and an ordered [`Pipeline`] of
//! request modifiers that run before each request reaches the transport.
//! Authentication is one such modifier, switched by a config flag:
//!
//! ```ignore
//! use clasp::prelude::*;
//!
//! let client = NetworkClient::new()
//!     .header("User-Agent", "clasp")
//!     .auth(AuthModifier::api_key("k1"));
//!
//! let response = client.get("https://api.example.com/me").await?;
//!
//! // Same pipeline, no credentials.
//! let anonymous = client.disable_auth();
//! ```
//!
//! Strategies: [`AuthModifier::header`], [`AuthModifier::basic`],
//! [`AuthModifier::bearer`], [`AuthModifier::api_key`], or your own via
//! [`AuthModifier::try_new`].

mod auth;
mod client;
pub mod middleware;
mod network;
pub mod prelude;

pub use auth::{AUTHORIZATION, AuthConfigs, AuthEnabled, AuthModifier, DEFAULT_API_KEY_FIELD};
pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use network::NetworkClient;

// Re-export tower for middleware composition
pub use tower;

pub use clasp_core::{
    ConfigKey, Configs, Error, HttpClient, HttpClientExt, Method, Pipeline, Request,
    RequestBuilder, RequestModifier, Response, Result, header,
};
pub use url;
