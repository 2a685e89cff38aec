//! What the transport hands back.
//!
//! Responses pass through untouched; clasp only reads the status, for logging
//! and retry decisions.

use bytes::Bytes;
use http::HeaderMap;

/// Buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response<B = Bytes> {
    status: u16,
    headers: HeaderMap,
    body: B,
}

impl<B> Response<B> {
    /// Response with no headers.
    #[must_use]
    pub fn new(status: u16, body: B) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value by case-insensitive name; `None` if absent or not visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Borrow the body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Take the body.
    #[must_use]
    pub fn into_body(self) -> B {
        self.body
    }

    /// 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, 200..=299)
    }

    /// 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self.status, 500..=599)
    }
}

impl<B> From<http::Response<B>> for Response<B> {
    fn from(response: http::Response<B>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status.as_u16(),
            headers: parts.headers,
            body,
        }
    }
}
