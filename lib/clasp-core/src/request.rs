//! Outgoing HTTP requests.
//!
//! A [`Request`] is what request modifiers operate on: method, URL, headers and an
//! optional body. Build one with [`Request::builder`].
//!
//! ```
//! use clasp_core::{Method, Request};
//! use bytes::Bytes;
//!
//! let request = Request::<Bytes>::builder(Method::Get, "https://api.example.com".parse().unwrap())
//!     .header("Accept", "application/json")
//!     .build();
//! assert_eq!(request.header("accept"), Some("application/json"));
//! ```

use std::collections::HashMap;

use bytes::Bytes;

use crate::Method;

/// An HTTP request with method, URL, headers, and optional body.
///
/// Header names are matched case-insensitively; the spelling of the last
/// [`set_header`](Self::set_header) call wins.
#[derive(Debug, Clone)]
pub struct Request<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: HashMap<String, String>,
    body: Option<B>,
}

impl<B> Request<B> {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: url::Url) -> RequestBuilder<B> {
        RequestBuilder::new(method, url)
    }

    /// Reassemble a request from its parts.
    #[must_use]
    pub fn from_parts(
        method: Method,
        url: url::Url,
        headers: HashMap<String, String>,
        body: Option<B>,
    ) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }

    /// Single header value by name, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    /// Set a header, replacing any existing value under the same name (any case).
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    /// Remove a header (any case), returning its previous value.
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let key = self
            .headers
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned()?;
        self.headers.remove(&key)
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, url::Url, HashMap<String, String>, Option<B>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder<B = Bytes> {
    request: Request<B>,
}

impl<B> RequestBuilder<B> {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self {
            request: Request::from_parts(method, url, HashMap::new(), None),
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.set_header(name, value);
        self
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        for (name, value) in headers {
            self.request.set_header(name, value);
        }
        self
    }

    /// Appends a query parameter to the URL.
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.request.url.query_pairs_mut().append_pair(name, value);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: B) -> Self {
        self.request.body = Some(body);
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request<B> {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> url::Url {
        url::Url::parse("https://api.example.com/users").expect("valid URL")
    }

    #[test]
    fn request_builder_basic() {
        let request = Request::<Bytes>::builder(Method::Get, url())
            .header("Accept", "application/json")
            .query("page", "1")
            .build();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url().as_str(), "https://api.example.com/users?page=1");
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert!(request.body().is_none());
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut request = Request::<Bytes>::builder(Method::Get, url())
            .header("authorization", "old")
            .build();

        request.set_header("Authorization", "new");

        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.header("AUTHORIZATION"), Some("new"));
        assert!(request.headers().contains_key("Authorization"));
    }

    #[test]
    fn remove_header_any_case() {
        let mut request = Request::<Bytes>::builder(Method::Get, url())
            .header("X-Trace", "abc")
            .build();

        assert_eq!(request.remove_header("x-trace"), Some("abc".to_string()));
        assert_eq!(request.remove_header("x-trace"), None);
        assert!(request.headers().is_empty());
    }

    #[test]
    fn parts_round_trip() {
        let body = Bytes::from_static(b"{}");
        let request = Request::builder(Method::Post, url())
            .header("Content-Type", "application/json")
            .body(body.clone())
            .build();

        let (method, url, headers, body_part) = request.into_parts();
        let rebuilt = Request::from_parts(method, url, headers, body_part);

        assert_eq!(rebuilt.method(), Method::Post);
        assert_eq!(rebuilt.body(), Some(&body));
        assert_eq!(rebuilt.header("content-type"), Some("application/json"));
    }
}
