//! Client that runs a request-modifier pipeline before handing requests to a transport.

use std::borrow::Cow;
use std::task::{Context, Poll};

use bytes::Bytes;
use tower_service::Service;

use crate::{
    ConfigKey, Configs, Error, HttpClient, HyperClient, Pipeline, Request, RequestModifier,
    Response, Result, ServiceFuture,
};

/// HTTP client with per-client [`Configs`] and an ordered modifier [`Pipeline`].
///
/// Every configuring method borrows `self` and returns a new client, so a
/// client can be specialised several ways without the variants affecting
/// each other:
///
/// ```ignore
/// use clasp::{AuthModifier, NetworkClient};
///
/// let base = NetworkClient::new().header("User-Agent", "clasp");
/// let admin = base.auth(AuthModifier::bearer("admin-token"));
/// let anonymous = base.clone();
/// ```
///
/// On dispatch, the modifiers run in registration order on the request, then
/// the result goes to the transport `C`. A modifier error aborts the dispatch
/// and the transport is never called.
#[derive(Debug, Clone)]
pub struct NetworkClient<C = HyperClient> {
    transport: C,
    configs: Configs,
    pipeline: Pipeline,
}

impl NetworkClient<HyperClient> {
    /// Client over a default [`HyperClient`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_transport(HyperClient::new())
    }
}

impl Default for NetworkClient<HyperClient> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> NetworkClient<C> {
    /// Client over a custom transport, with empty configs and no modifiers.
    #[must_use]
    pub fn with_transport(transport: C) -> Self {
        Self {
            transport,
            configs: Configs::new(),
            pipeline: Pipeline::new(),
        }
    }

    /// Current configuration.
    #[must_use]
    pub const fn configs(&self) -> &Configs {
        &self.configs
    }

    /// Registered modifiers.
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &C {
        &self.transport
    }

    /// Run the modifier pipeline on `request` without sending it.
    ///
    /// # Errors
    ///
    /// Returns the first modifier error.
    pub fn prepare(&self, mut request: Request<Bytes>) -> Result<Request<Bytes>> {
        self.pipeline.run(&mut request, &self.configs)?;
        Ok(request)
    }
}

impl<C: Clone> NetworkClient<C> {
    /// New client with `K` set to `value`.
    #[must_use]
    pub fn config<K: ConfigKey>(&self, value: K::Value) -> Self {
        let mut client = self.clone();
        client.configs.set::<K>(value);
        client
    }

    /// New client with `modifier` appended to the pipeline.
    #[must_use]
    pub fn modifier(&self, modifier: RequestModifier) -> Self {
        let mut client = self.clone();
        client.pipeline.push(modifier);
        client
    }

    /// New client with `modify` appended to the pipeline.
    #[must_use]
    pub fn modify_request<F>(&self, modify: F) -> Self
    where
        F: Fn(&mut Request<Bytes>, &Configs) -> Result<()> + Send + Sync + 'static,
    {
        self.modifier(RequestModifier::new(modify))
    }

    /// New client that sets header `name` to `value` on every request.
    #[must_use]
    pub fn header(
        &self,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let value = value.into();
        self.modifier(RequestModifier::named(
            format!("header:{name}"),
            move |request, _| {
                request.set_header(name.as_ref(), value.as_str());
                Ok(())
            },
        ))
    }
}

impl<C: HttpClient> HttpClient for NetworkClient<C> {
    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let request = self.prepare(request)?;
        self.transport.execute(request).await
    }
}

impl<C> Service<Request<Bytes>> for NetworkClient<C>
where
    C: HttpClient + Clone + 'static,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.execute(request).await })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::Method;

    /// Transport that records what it was asked to send.
    #[derive(Clone, Default)]
    struct Recorder {
        sent: Arc<Mutex<Vec<Request<Bytes>>>>,
    }

    impl Recorder {
        fn sent(&self) -> Vec<Request<Bytes>> {
            self.sent.lock().expect("lock").clone()
        }
    }

    impl HttpClient for Recorder {
        async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
            self.sent.lock().expect("lock").push(request);
            Ok(Response::new(200, Bytes::new()))
        }
    }

    struct Region;

    impl ConfigKey for Region {
        type Value = String;

        fn default_value() -> String {
            "eu".to_string()
        }
    }

    fn request() -> Request<Bytes> {
        let url = url::Url::parse("https://api.example.com/things").expect("valid URL");
        Request::builder(Method::Get, url).build()
    }

    #[tokio::test]
    async fn modifiers_run_before_transport() {
        let recorder = Recorder::default();
        let client = NetworkClient::with_transport(recorder.clone())
            .header("X-One", "1")
            .header("X-Two", "2");

        client.execute(request()).await.expect("execute");

        let sent = recorder.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header("X-One"), Some("1"));
        assert_eq!(sent[0].header("X-Two"), Some("2"));
    }

    #[tokio::test]
    async fn modifier_failure_skips_transport() {
        let recorder = Recorder::default();
        let client = NetworkClient::with_transport(recorder.clone())
            .modify_request(|_, _| Err(Error::modifier("refused")));

        let err = client.execute(request()).await.expect_err("modifier fails");

        assert!(err.is_modifier());
        assert!(recorder.sent().is_empty());
    }

    #[test]
    fn derived_clients_are_independent() {
        let base = NetworkClient::with_transport(Recorder::default()).header("X-Base", "1");
        let eu = base.config::<Region>("eu-west".to_string());
        let traced = base.header("X-Trace", "abc");

        assert_eq!(base.pipeline().len(), 1);
        assert_eq!(traced.pipeline().len(), 2);
        assert_eq!(eu.pipeline().len(), 1);
        assert_eq!(base.configs().get::<Region>(), "eu");
        assert_eq!(eu.configs().get::<Region>(), "eu-west");
        assert!(!traced.configs().contains::<Region>());
    }

    #[test]
    fn modifiers_read_client_configs() {
        let client = NetworkClient::with_transport(Recorder::default())
            .modify_request(|request, configs| {
                request.set_header("X-Region", configs.get::<Region>());
                Ok(())
            })
            .config::<Region>("us".to_string());

        let prepared = client.prepare(request()).expect("prepare");

        assert_eq!(prepared.header("X-Region"), Some("us"));
    }

    #[test]
    fn later_header_modifier_wins() {
        let client = NetworkClient::with_transport(Recorder::default())
            .header("Accept", "text/plain")
            .header("accept", "application/json");

        let prepared = client.prepare(request()).expect("prepare");

        assert_eq!(prepared.headers().len(), 1);
        assert_eq!(prepared.header("Accept"), Some("application/json"));
    }
}
