//! Retry policy for tower's `RetryLayer`.
//!
//! Wrapped around a [`NetworkClient`](crate::NetworkClient), every attempt
//! starts from the caller's original request, so the modifier pipeline runs
//! again for each retry.

use std::future;

use bytes::Bytes;
use tower::retry::Policy;

use crate::{Error, Request, Response};

/// Retries connection errors, timeouts, 5xx and 429, up to a fixed budget.
///
/// Modifier failures are never retried: the same modifiers would reject the
/// same request again.
///
/// ```ignore
/// use clasp::middleware::RetryPolicy;
/// use tower::{ServiceBuilder, retry::RetryLayer};
///
/// let service = ServiceBuilder::new()
///     .layer(RetryLayer::new(RetryPolicy::new(3)))
///     .service(network_client);
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    remaining: u32,
}

impl RetryPolicy {
    /// Create a policy allowing `max_retries` attempts after the first one.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            remaining: max_retries,
        }
    }

    fn should_retry_response(response: &Response<Bytes>) -> bool {
        response.is_server_error() || response.status() == 429
    }

    fn should_retry_error(error: &Error) -> bool {
        error.is_connection() || error.is_timeout()
    }
}

impl Policy<Request<Bytes>, Response<Bytes>, Error> for RetryPolicy {
    type Future = future::Ready<()>;

    fn retry(
        &mut self,
        _req: &mut Request<Bytes>,
        result: &mut Result<Response<Bytes>, Error>,
    ) -> Option<Self::Future> {
        if self.remaining == 0 {
            return None;
        }

        let should_retry = match result {
            Ok(response) => Self::should_retry_response(response),
            Err(error) => Self::should_retry_error(error),
        };

        if should_retry {
            self.remaining -= 1;
            tracing::debug!(remaining = self.remaining, "retrying request");
            Some(future::ready(()))
        } else {
            None
        }
    }

    fn clone_request(&mut self, req: &Request<Bytes>) -> Option<Request<Bytes>> {
        Some(req.clone())
    }
}
