//! Tower middleware for clasp clients.
//!
//! - [`LoggingLayer`] - logs requests/responses with `tracing`, credentials redacted
//! - [`RetryPolicy`] - policy for tower's [`RetryLayer`]
//!
//! Where a layer sits decides what it sees. Layers added through
//! [`HyperClientBuilder::layer`](crate::HyperClientBuilder::layer) run after the
//! modifier pipeline; layers stacked on a [`NetworkClient`](crate::NetworkClient)
//! run before it:
//!
//! ```text
//! RetryLayer -> NetworkClient (modifiers) -> LoggingLayer -> hyper
//! ```

mod logging;
mod retry;

pub use logging::{LogLevel, Logging, LoggingLayer, SENSITIVE_HEADERS, redacted_headers};
pub use retry::RetryPolicy;

pub use tower::retry::RetryLayer;
pub use tower::{Layer, ServiceBuilder};
