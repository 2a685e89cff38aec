//! Prelude module for convenient imports.
//!
//! ```ignore
//! use clasp::prelude::*;
//! ```

pub use crate::{
    AuthConfigs, AuthEnabled, AuthModifier, ConfigKey, Configs, Error, HttpClient,
    HttpClientExt, HyperClient, Method, NetworkClient, Request, RequestBuilder, RequestModifier,
    Response, Result,
};
