//! Default transport: hyper-util over rustls, with optional tower layers.
//!
//! [`HyperClient`] only sends what it is given. Request modifiers run in
//! [`NetworkClient`](crate::NetworkClient) before the request gets here.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::Layer;
use tower::util::BoxCloneSyncService;
use tower_service::Service;

use crate::{Error, Request, Response, Result};

#[cfg(feature = "middleware-logging")]
use crate::middleware::LoggingLayer;
#[cfg(feature = "middleware-retry")]
use crate::middleware::RetryPolicy;
#[cfg(feature = "middleware-retry")]
use tower::retry::RetryLayer;

/// Type-erased transport service that layers are stacked on.
pub type BoxedService = BoxCloneSyncService<Request<Bytes>, Response<Bytes>, Error>;

/// Future returned by the tower [`Service`] implementations in this crate.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type Pool = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

fn pool(connect_timeout: Duration) -> Pool {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));

    let https = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new()).build(https)
}

/// Lowers a prepared request to hyper's type. Header names and values are
/// validated here, so a modifier that wrote a CR/LF is caught before the wire.
fn outgoing(request: Request<Bytes>) -> Result<http::Request<Full<Bytes>>> {
    let (method, url, headers, body) = request.into_parts();

    let mut header_map = http::HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let reject = |e: &dyn std::fmt::Display| Error::invalid_header(&name, e.to_string());
        let header_name = http::HeaderName::try_from(name.as_str()).map_err(|e| reject(&e))?;
        let header_value = http::HeaderValue::try_from(value.as_str()).map_err(|e| reject(&e))?;
        header_map.insert(header_name, header_value);
    }

    let uri = url
        .as_str()
        .parse::<http::Uri>()
        .map_err(|e| Error::invalid_request(e.to_string()))?;

    let mut lowered = http::Request::new(Full::new(body.unwrap_or_default()));
    *lowered.method_mut() = method.into();
    *lowered.uri_mut() = uri;
    *lowered.headers_mut() = header_map;
    Ok(lowered)
}

/// Connection failures that mention TLS are reported as such.
#[allow(clippy::needless_pass_by_value)]
fn classify(err: hyper_util::client::legacy::Error) -> Error {
    let message = err.to_string();
    let tls = message.contains("tls") || message.contains("certificate");
    if tls && !err.is_connect() {
        Error::tls(message)
    } else {
        Error::connection(message)
    }
}

/// The innermost service: one deadline-bounded exchange with the pool.
#[derive(Clone)]
struct Wire {
    pool: Pool,
    timeout: Duration,
}

impl Wire {
    async fn exchange(self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let lowered = outgoing(request)?;

        let response = tokio::time::timeout(self.timeout, self.pool.request(lowered))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(classify)?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        Ok(http::Response::from_parts(parts, body).into())
    }
}

impl Service<Request<Bytes>> for Wire {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        Box::pin(self.clone().exchange(request))
    }
}

/// HTTP transport over a pooled rustls connector, with optional tower layers.
///
/// ```ignore
/// use clasp::HyperClient;
/// use std::time::Duration;
///
/// let transport = HyperClient::builder()
///     .timeout(Duration::from_secs(5))
///     .with_logging()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperClient {
    service: BoxedService,
    timeout: Duration,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Transport with default timeouts and no layers.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Whole-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl clasp_core::HttpClient for HyperClient {
    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        self.service.clone().call(request).await
    }
}

impl Service<Request<Bytes>> for HyperClient {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        self.service.call(request)
    }
}

type LayerFn = Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>;

/// Builder for [`HyperClient`].
///
/// Layers added here sit between the modifier pipeline and the wire: they see
/// requests after every modifier has run.
pub struct HyperClientBuilder {
    timeout: Duration,
    connect_timeout: Duration,
    layers: Vec<LayerFn>,
}

impl Default for HyperClientBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            layers: Vec::new(),
        }
    }
}

impl std::fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl HyperClientBuilder {
    /// Whole-request timeout, 30s by default.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// TCP connect timeout, 10s by default.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Add a tower layer. The first layer added is the outermost.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send,
    {
        self.layers
            .push(Arc::new(move |inner| BoxCloneSyncService::new(layer.layer(inner))));
        self
    }

    /// Log every request and response with `tracing`.
    #[cfg(feature = "middleware-logging")]
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Like [`with_logging`](Self::with_logging), with headers at debug level
    /// (credentials redacted).
    #[cfg(feature = "middleware-logging")]
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Retry transport failures and 5xx/429 responses.
    ///
    /// Retries at this level resend the already-modified request. To re-run the
    /// modifier pipeline per attempt, wrap the [`NetworkClient`](crate::NetworkClient)
    /// in a `RetryLayer` instead.
    #[cfg(feature = "middleware-retry")]
    #[must_use]
    pub fn with_retry(self, max_retries: u32) -> Self {
        self.layer(RetryLayer::new(RetryPolicy::new(max_retries)))
    }

    /// Build the transport.
    #[must_use]
    pub fn build(self) -> HyperClient {
        let wire = Wire {
            pool: pool(self.connect_timeout),
            timeout: self.timeout,
        };

        let service = self
            .layers
            .iter()
            .rev()
            .fold(BoxCloneSyncService::new(wire), |inner, wrap| wrap(inner));

        HyperClient {
            service,
            timeout: self.timeout,
        }
    }
}
