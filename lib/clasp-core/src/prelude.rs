//! Prelude module for convenient imports.
//!
//! ```ignore
//! use clasp_core::prelude::*;
//! ```

pub use crate::{
    ConfigKey, Configs, Error, HttpClient, HttpClientExt, Method, Pipeline, Request,
    RequestBuilder, RequestModifier, Response, Result,
};
