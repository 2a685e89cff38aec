//! Core types for the clasp request-authentication layer.
//!
//! - [`Request`] and [`RequestBuilder`] - outgoing requests that modifiers mutate
//! - [`Response`] - what the transport hands back
//! - [`Configs`] and [`ConfigKey`] - typed per-client configuration
//! - [`RequestModifier`] and [`Pipeline`] - ordered request mutation before dispatch
//! - [`HttpClient`] - the transport seam
//! - [`Error`] and [`Result`] - error handling

mod client;
mod config;
mod error;
mod method;
mod modifier;
pub mod prelude;
mod request;
mod response;

pub use client::{HttpClient, HttpClientExt};
pub use config::{ConfigKey, Configs};
pub use error::{Error, Result};
pub use method::Method;
pub use modifier::{Pipeline, RequestModifier};
pub use request::{Request, RequestBuilder};
pub use response::Response;

pub use http::header;
