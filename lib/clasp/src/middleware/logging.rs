//! Request/response logging middleware.
//!
//! Logs with `tracing`. At debug level the request headers are included, with
//! credential-bearing headers replaced by `<redacted>`.

use std::collections::BTreeMap;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{Error, Request, Response, Result, ServiceFuture};

/// Header names whose values never reach the logs.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "x-api-key",
    "cookie",
];

/// Layer that adds request/response logging.
///
/// ```ignore
/// use clasp::middleware::LoggingLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(LoggingLayer::new())
///     .service(client);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// How much the logging middleware records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Method, URL, redacted headers.
    Debug,
    /// Method, URL, status and timing.
    #[default]
    Info,
}

impl LoggingLayer {
    /// Create a new logging layer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging layer that logs at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service that logs requests and responses.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

/// Copy of `headers` with sensitive values masked, sorted for stable output.
#[must_use]
pub fn redacted_headers<'a>(
    headers: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> BTreeMap<&'a str, &'a str> {
    headers
        .into_iter()
        .map(|(name, value)| {
            let sensitive = SENSITIVE_HEADERS
                .iter()
                .any(|candidate| name.eq_ignore_ascii_case(candidate));
            (
                name.as_str(),
                if sensitive { "<redacted>" } else { value.as_str() },
            )
        })
        .collect()
}

impl<S> Service<Request<Bytes>> for Logging<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let method = request.method();
        let url = request.url().to_string();

        if self.level == LogLevel::Debug {
            debug!(
                %method,
                %url,
                headers = ?redacted_headers(request.headers()),
                "sending request"
            );
        } else {
            info!(%method, %url, "sending request");
        }

        let span = span!(Level::INFO, "http_request", %method, %url);
        let mut inner = self.inner.clone();

        Box::pin(
            async move {
                let start = Instant::now();
                let result = inner.call(request).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) if response.is_success() => {
                        info!(status = response.status(), elapsed_ms, "request completed");
                    }
                    Ok(response) => {
                        warn!(status = response.status(), elapsed_ms, "request failed with HTTP error");
                    }
                    Err(err) => warn!(error = %err, elapsed_ms, "request failed"),
                }

                result
            }
            .instrument(span),
        )
    }
}
