//! HTTP methods.

use derive_more::Display;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// GET
    #[display("GET")]
    Get,
    /// POST
    #[display("POST")]
    Post,
    /// PUT
    #[display("PUT")]
    Put,
    /// DELETE
    #[display("DELETE")]
    Delete,
    /// PATCH
    #[display("PATCH")]
    Patch,
    /// HEAD
    #[display("HEAD")]
    Head,
    /// OPTIONS
    #[display("OPTIONS")]
    Options,
}

impl Method {
    /// Returns `true` if repeating the request has the same effect as sending it once.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        !matches!(self, Self::Post | Self::Patch)
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
            Method::Patch => Self::PATCH,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
        }
    }
}

impl TryFrom<http::Method> for Method {
    type Error = crate::Error;

    fn try_from(method: http::Method) -> Result<Self, Self::Error> {
        Ok(match method {
            http::Method::GET => Self::Get,
            http::Method::POST => Self::Post,
            http::Method::PUT => Self::Put,
            http::Method::DELETE => Self::Delete,
            http::Method::PATCH => Self::Patch,
            http::Method::HEAD => Self::Head,
            http::Method::OPTIONS => Self::Options,
            other => {
                return Err(crate::Error::invalid_request(format!(
                    "unsupported HTTP method: {other}"
                )));
            }
        })
    }
}
