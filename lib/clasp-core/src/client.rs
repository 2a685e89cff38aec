//! Transport trait.
//!
//! [`HttpClient`] is the only thing clasp needs from a transport: take a
//! finished request, send it, hand back the response. Modifiers have already
//! run by the time `execute` is called.

use std::future::Future;

use bytes::Bytes;

use crate::{Method, Request, Response, Result};

/// Core HTTP client trait.
pub trait HttpClient: Send + Sync {
    /// Send a request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - A request modifier rejects it
    /// - Network or TLS errors
    /// - Timeouts
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

/// Extension trait for [`HttpClient`] with convenience methods.
pub trait HttpClientExt: HttpClient {
    /// Send a body-less request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the request fails.
    fn send(
        &self,
        method: Method,
        url: &str,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        async move {
            let url = url::Url::parse(url)?;
            self.execute(Request::builder(method, url).build()).await
        }
    }

    /// Execute a GET request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the request fails.
    fn get(&self, url: &str) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        self.send(Method::Get, url)
    }
}

impl<T: HttpClient> HttpClientExt for T {}
