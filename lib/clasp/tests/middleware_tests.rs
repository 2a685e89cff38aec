//! Tower middleware composed with the modifier pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clasp::middleware::{RetryLayer, RetryPolicy, ServiceBuilder};
use clasp::tower::ServiceExt;
use clasp::{AuthModifier, HttpClientExt, HyperClient, Method, NetworkClient, Request};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

/// Retrying above the client re-runs every modifier for each attempt.
#[tokio::test]
async fn test_retry_reruns_pipeline() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .and(header("X-API-Key", "k1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3) // Initial + 2 retries
        .mount(&mock_server)
        .await;

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);

    let client = NetworkClient::with_transport(HyperClient::new())
        .modify_request(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .auth(AuthModifier::api_key("k1"));

    let service = ServiceBuilder::new()
        .layer(RetryLayer::new(RetryPolicy::new(2)))
        .service(client);

    let url = url::Url::parse(&format!("{}/flaky", mock_server.uri())).expect("url");
    let response = service
        .oneshot(Request::builder(Method::Get, url).build())
        .await
        .expect("response");

    assert_eq!(response.status(), 503);
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

/// No retry for client errors such as a rejected credential.
#[tokio::test]
async fn test_no_retry_on_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NetworkClient::with_transport(HyperClient::new())
        .auth(AuthModifier::bearer("expired"));

    let service = ServiceBuilder::new()
        .layer(RetryLayer::new(RetryPolicy::new(3)))
        .service(client);

    let url = url::Url::parse(&mock_server.uri()).expect("url");
    let response = service
        .oneshot(Request::builder(Method::Get, url).build())
        .await
        .expect("response");

    assert_eq!(response.status(), 401);
}

/// Transport-side layers see the request after auth was applied.
#[tokio::test]
async fn test_transport_layers_with_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logged"))
        .and(header("Authorization", "Basic c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = HyperClient::builder()
        .with_debug_logging()
        .with_retry(1)
        .build();
    let client = NetworkClient::with_transport(transport).auth(AuthModifier::basic("secret"));

    let response = client
        .get(&format!("{}/logged", mock_server.uri()))
        .await
        .expect("response");

    assert!(response.is_success());
}
