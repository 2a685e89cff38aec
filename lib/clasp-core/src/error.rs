//! Error types for clasp.

use derive_more::{Display, Error, From};

/// Main error type for clasp operations.
///
/// A non-2xx status is not an error: the transport returns it as `Ok(Response)`.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// A header name or value the transport refuses to send.
    #[display("invalid header '{name}': {message}")]
    #[from(skip)]
    InvalidHeader {
        /// Header name as given.
        name: String,
        /// Why it was rejected.
        message: String,
    },

    /// A request modifier failed; the request was not dispatched.
    #[display("request modifier failed: {_0}")]
    #[from(skip)]
    Modifier(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an invalid header error.
    #[must_use]
    pub fn invalid_header(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a modifier failure.
    #[must_use]
    pub fn modifier(message: impl Into<String>) -> Self {
        Self::Modifier(message.into())
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if a request modifier aborted the dispatch.
    #[must_use]
    pub const fn is_modifier(&self) -> bool {
        matches!(self, Self::Modifier(_))
    }
}
