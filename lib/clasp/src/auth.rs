//! Authentication strategies and the client combinators that install them.
//!
//! An [`AuthModifier`] wraps one function that writes credentials into a
//! request. [`NetworkClient::auth`] registers it as a request modifier that
//! only fires while the [`AuthEnabled`] config flag is on, so auth can be
//! switched off and on again without registering it twice:
//!
//! ```ignore
//! use clasp::{AuthModifier, NetworkClient};
//!
//! let client = NetworkClient::new().auth(AuthModifier::api_key("k1"));
//! let public = client.disable_auth(); // modifier stays registered, does nothing
//! let private = public.enable_auth(true); // sends X-API-Key again
//! ```
//!
//! # Encoding
//!
//! [`AuthModifier::basic`] and [`AuthModifier::bearer`] base64-encode their
//! single argument. `basic` does not build `username:password` (RFC 7617) and
//! `bearer` does not send the token raw (RFC 6750). Existing servers depend on
//! exactly these header values, so they are kept as-is.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;

use crate::{ConfigKey, Configs, NetworkClient, Request, RequestModifier, Result};

/// Header written by [`AuthModifier::header`], `basic` and `bearer`.
pub const AUTHORIZATION: &str = "Authorization";

/// Header written by [`AuthModifier::api_key`].
pub const DEFAULT_API_KEY_FIELD: &str = "X-API-Key";

/// Config key: whether the registered auth modifier applies. Defaults to `false`.
#[derive(Debug, Clone, Copy)]
pub struct AuthEnabled;

impl ConfigKey for AuthEnabled {
    type Value = bool;

    fn default_value() -> bool {
        false
    }
}

/// Typed auth accessors on [`Configs`].
pub trait AuthConfigs {
    /// Whether auth modifiers apply; `false` when never set.
    fn is_auth_enabled(&self) -> bool;

    /// Turn auth modifiers on or off.
    fn set_auth_enabled(&mut self, enabled: bool);
}

impl AuthConfigs for Configs {
    fn is_auth_enabled(&self) -> bool {
        self.get::<AuthEnabled>()
    }

    fn set_auth_enabled(&mut self, enabled: bool) {
        self.set::<AuthEnabled>(enabled);
    }
}

type AuthFn = dyn Fn(&mut Request<Bytes>) -> Result<()> + Send + Sync;

/// A single auth scheme: one function that mutates the outgoing request.
///
/// The `Debug` output names the scheme and never the credential.
#[derive(Clone)]
pub struct AuthModifier {
    scheme: &'static str,
    modify: Arc<AuthFn>,
}

impl fmt::Debug for AuthModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthModifier")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

impl AuthModifier {
    /// Custom strategy that cannot fail.
    pub fn new<F>(modify: F) -> Self
    where
        F: Fn(&mut Request<Bytes>) + Send + Sync + 'static,
    {
        Self::try_new(move |request| {
            modify(request);
            Ok(())
        })
    }

    /// Custom strategy that may reject the request; the error aborts the dispatch.
    pub fn try_new<F>(modify: F) -> Self
    where
        F: Fn(&mut Request<Bytes>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            scheme: "custom",
            modify: Arc::new(modify),
        }
    }

    fn set_header(scheme: &'static str, name: String, value: String) -> Self {
        Self {
            scheme,
            modify: Arc::new(move |request| {
                request.set_header(name.as_str(), value.as_str());
                Ok(())
            }),
        }
    }

    /// `Authorization: <value>`, verbatim.
    pub fn header(value: impl Into<String>) -> Self {
        Self::set_header("header", AUTHORIZATION.to_string(), value.into())
    }

    /// `Authorization: Basic <base64(password)>`.
    ///
    /// Only `password` is encoded; see the [module docs](self#encoding).
    pub fn basic(password: impl AsRef<str>) -> Self {
        Self::basic_bytes(password.as_ref())
    }

    /// [`basic`](Self::basic) from raw bytes. Bytes that are not UTF-8 produce
    /// an empty credential (`Basic `) rather than an error.
    pub fn basic_bytes(password: impl AsRef<[u8]>) -> Self {
        let credential = encode_credential(password.as_ref());
        Self::set_header("basic", AUTHORIZATION.to_string(), format!("Basic {credential}"))
    }

    /// `Authorization: Bearer <base64(token)>`.
    ///
    /// The token is base64-encoded; see the [module docs](self#encoding).
    pub fn bearer(token: impl AsRef<str>) -> Self {
        Self::bearer_bytes(token.as_ref())
    }

    /// [`bearer`](Self::bearer) from raw bytes. Bytes that are not UTF-8
    /// produce an empty credential (`Bearer `) rather than an error.
    pub fn bearer_bytes(token: impl AsRef<[u8]>) -> Self {
        let credential = encode_credential(token.as_ref());
        Self::set_header("bearer", AUTHORIZATION.to_string(), format!("Bearer {credential}"))
    }

    /// `X-API-Key: <key>`, unencoded.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::api_key_field(key, DEFAULT_API_KEY_FIELD)
    }

    /// `<field>: <key>`, unencoded.
    pub fn api_key_field(key: impl Into<String>, field: impl Into<String>) -> Self {
        Self::set_header("api-key", field.into(), key.into())
    }

    /// Scheme name used in logs (`basic`, `bearer`, `api-key`, `header`, `custom`).
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        self.scheme
    }

    /// Apply the strategy to `request`, regardless of any config flag.
    ///
    /// # Errors
    ///
    /// Returns the strategy's error; the built-in schemes never fail.
    pub fn apply(&self, request: &mut Request<Bytes>) -> Result<()> {
        (self.modify)(request)
    }
}

fn encode_credential(raw: &[u8]) -> String {
    match std::str::from_utf8(raw) {
        Ok(text) => STANDARD.encode(text),
        Err(_) => {
            tracing::warn!("credential is not valid UTF-8, sending empty credential");
            String::new()
        }
    }
}

impl<C: Clone> NetworkClient<C> {
    /// New client with auth enabled and `strategy` appended to the pipeline.
    ///
    /// The strategy runs only while [`AuthEnabled`] is on; toggle it with
    /// [`enable_auth`](Self::enable_auth) / [`disable_auth`](Self::disable_auth).
    #[must_use]
    pub fn auth(&self, strategy: AuthModifier) -> Self {
        let name = format!("auth:{}", strategy.scheme());
        self.enable_auth(true)
            .modifier(RequestModifier::named(name, move |request, configs| {
                if configs.is_auth_enabled() {
                    tracing::trace!(scheme = strategy.scheme(), "applying auth");
                    strategy.apply(request)
                } else {
                    tracing::trace!(scheme = strategy.scheme(), "auth disabled, skipping");
                    Ok(())
                }
            }))
    }

    /// New client with the auth flag set to `enabled`.
    #[must_use]
    pub fn enable_auth(&self, enabled: bool) -> Self {
        self.config::<AuthEnabled>(enabled)
    }

    /// Same as `enable_auth(false)`.
    #[must_use]
    pub fn disable_auth(&self) -> Self {
        self.enable_auth(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Method};

    fn request() -> Request<Bytes> {
        let url = url::Url::parse("https://api.example.com/me").expect("valid URL");
        Request::builder(Method::Get, url)
            .header("Accept", "application/json")
            .build()
    }

    fn applied(strategy: &AuthModifier) -> Request<Bytes> {
        let mut req = request();
        strategy.apply(&mut req).expect("apply");
        req
    }

    #[test]
    fn header_is_verbatim() {
        let req = applied(&AuthModifier::header("X"));
        assert_eq!(req.header(AUTHORIZATION), Some("X"));
    }

    #[test]
    fn basic_encodes_password_only() {
        let req = applied(&AuthModifier::basic("secret"));
        assert_eq!(req.header("Authorization"), Some("Basic c2VjcmV0"));
    }

    #[test]
    fn bearer_encodes_token() {
        let req = applied(&AuthModifier::bearer("tok"));
        assert_eq!(req.header("Authorization"), Some("Bearer dG9r"));
    }

    #[test]
    fn invalid_utf8_degrades_to_empty_credential() {
        let req = applied(&AuthModifier::basic_bytes([0xff_u8, 0xfe]));
        assert_eq!(req.header("Authorization"), Some("Basic "));

        let req = applied(&AuthModifier::bearer_bytes(b"\xc3\x28"));
        assert_eq!(req.header("Authorization"), Some("Bearer "));
    }

    #[test]
    fn api_key_default_and_custom_field() {
        let req = applied(&AuthModifier::api_key("k1"));
        assert_eq!(req.header("X-API-Key"), Some("k1"));

        let req = applied(&AuthModifier::api_key_field("k1", "X-Token"));
        assert_eq!(req.header("X-Token"), Some("k1"));
        assert_eq!(req.header("X-API-Key"), None);
    }

    #[test]
    fn strategies_set_exactly_one_header() {
        for strategy in strategies() {
            let req = applied(&strategy);
            assert_eq!(req.headers().len(), 2, "scheme {}", strategy.scheme());
            assert_eq!(req.header("Accept"), Some("application/json"));
        }
    }

    #[test]
    fn custom_strategies() {
        let req = applied(&AuthModifier::new(|request| {
            request.set_header("X-Signature", "sig");
        }));
        assert_eq!(req.header("X-Signature"), Some("sig"));

        let failing = AuthModifier::try_new(|_| Err(Error::modifier("token expired")));
        let err = failing.apply(&mut request()).expect_err("fails");
        assert!(err.is_modifier());
    }

    #[test]
    fn debug_hides_credentials() {
        let debug = format!("{:?}", AuthModifier::bearer("super-secret"));
        assert!(debug.contains("bearer"));
        assert!(!debug.contains("super-secret"));
    }

    fn strategies() -> [AuthModifier; 4] {
        [
            AuthModifier::header("X"),
            AuthModifier::basic("secret"),
            AuthModifier::bearer("tok"),
            AuthModifier::api_key("k1"),
        ]
    }

    fn prepared(client: &NetworkClient<()>) -> std::collections::HashMap<String, String> {
        client.prepare(request()).expect("prepare").headers().clone()
    }

    #[test]
    fn disabled_strategies_leave_headers_alone() {
        for strategy in strategies() {
            let scheme = strategy.scheme();
            let client = NetworkClient::with_transport(()).auth(strategy);

            let disabled = prepared(&client.disable_auth());
            let switched_off = prepared(&client.enable_auth(false));

            assert_eq!(disabled, switched_off, "scheme {scheme}");
            assert_eq!(disabled.len(), 1, "scheme {scheme}");
            assert_eq!(disabled.get("Accept").map(String::as_str), Some("application/json"));
        }
    }

    #[test]
    fn reenabled_strategies_write_their_header_again() {
        for strategy in strategies() {
            let expected = applied(&strategy).headers().clone();
            let client = NetworkClient::with_transport(()).auth(strategy);

            assert_eq!(prepared(&client), expected);
            assert_eq!(prepared(&client.disable_auth().enable_auth(true)), expected);
        }
    }

    #[test]
    fn auth_enables_the_flag_and_toggles_keep_one_modifier() {
        let client = NetworkClient::with_transport(()).auth(AuthModifier::basic("secret"));
        assert!(client.configs().is_auth_enabled());
        assert_eq!(client.pipeline().len(), 1);

        let off = client.disable_auth();
        assert!(!off.configs().is_auth_enabled());
        assert!(client.configs().is_auth_enabled());
        assert_eq!(off.pipeline().len(), 1);
        assert_eq!(
            off.pipeline().iter().map(RequestModifier::name).collect::<Vec<_>>(),
            ["auth:basic"]
        );
    }

    #[test]
    fn auth_flag_defaults_to_false() {
        let mut configs = Configs::new();
        assert!(!configs.is_auth_enabled());

        configs.set_auth_enabled(true);
        assert!(configs.is_auth_enabled());
        assert!(configs.get::<AuthEnabled>());
    }
}
