//! Integration tests for `RestClient` against a local mock server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use oxr_core::{
    DebugSink, Error, ErrorPolicy, HttpConfig, JsonObjectDeserializer, MemoryCache, RestClient,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_with_policy(policy: ErrorPolicy) -> RestClient {
    let config = HttpConfig {
        error_policy: policy,
        ..HttpConfig::default()
    };
    RestClient::new(config).expect("failed to create RestClient")
}

#[tokio::test]
async fn test_call_get_deserializes_json_object() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .and(query_param("API_KEY", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "timestamp": 1337904000,
            "rates": { "USD": 1.0, "EUR": 0.79 }
        })))
        .mount(&server)
        .await;

    let client = client_with_policy(ErrorPolicy::PropagateAll);
    let url = format!("{}/latest.json?API_KEY=secret", server.uri());

    let response = client
        .call_get(&url, &JsonObjectDeserializer)
        .await
        .expect("GET should succeed");

    assert_eq!(response.status(), 200);
    let content = response.content().expect("content should be present");
    assert!(content.contains_key("rates"));
    assert_eq!(content["timestamp"], serde_json::json!(1337904000));
}

#[tokio::test]
async fn test_cache_hit_skips_second_network_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "rates": { "USD": 1.0 } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_with_policy(ErrorPolicy::PropagateAll);
    client.set_cache(Some(Arc::new(MemoryCache::new())));

    let url = format!("{}/latest.json", server.uri());

    let first = client.call_get(&url, &JsonObjectDeserializer).await.unwrap();
    let second = client.call_get(&url, &JsonObjectDeserializer).await.unwrap();

    assert_eq!(first.content(), second.content());
    // MockServer verifies expect(1) on drop.
}

#[tokio::test]
async fn test_cache_is_keyed_by_full_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "rates": {} })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut client = client_with_policy(ErrorPolicy::PropagateAll);
    client.set_cache(Some(Arc::new(MemoryCache::new())));

    let a = format!("{}/latest.json?API_KEY=a", server.uri());
    let b = format!("{}/latest.json?API_KEY=b", server.uri());

    client.call_get(&a, &JsonObjectDeserializer).await.unwrap();
    client.call_get(&b, &JsonObjectDeserializer).await.unwrap();
}

#[tokio::test]
async fn test_not_found_propagates_with_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/historical/1999-01-01.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_with_policy(ErrorPolicy::PropagateAll);
    let url = format!("{}/historical/1999-01-01.json", server.uri());

    let err = client
        .call_get(&url, &JsonObjectDeserializer)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().contains("1999-01-01"));
}

#[tokio::test]
async fn test_server_error_is_connection_class() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_with_policy(ErrorPolicy::PropagateAll);
    let url = format!("{}/latest.json", server.uri());

    let err = client
        .call_get(&url, &JsonObjectDeserializer)
        .await
        .unwrap_err();

    assert!(matches!(err.root_cause(), Error::Network(_)));
    assert!(err.is_connection_class());
}

#[tokio::test]
async fn test_content_error_on_array_root() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([1, 2])))
        .mount(&server)
        .await;

    let client = client_with_policy(ErrorPolicy::PropagateAll);
    let url = format!("{}/latest.json", server.uri());

    let err = client
        .call_get(&url, &JsonObjectDeserializer)
        .await
        .unwrap_err();

    assert!(err.is_content_class());
}

#[tokio::test]
async fn test_suppress_content_returns_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/historical/1999-01-01.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_with_policy(ErrorPolicy::SuppressContent);
    let url = format!("{}/historical/1999-01-01.json", server.uri());

    let response = client
        .call_get(&url, &JsonObjectDeserializer)
        .await
        .expect("suppressing policy must not raise");

    assert!(response.content().is_none());
}

#[tokio::test]
async fn test_suppress_content_still_propagates_connection_errors() {
    // Nothing is listening on this port.
    let client = client_with_policy(ErrorPolicy::SuppressContent);

    let err = client
        .call_get("http://127.0.0.1:1/latest.json", &JsonObjectDeserializer)
        .await
        .unwrap_err();

    assert!(err.is_connection_class());
}

#[tokio::test]
async fn test_suppress_connection_swallows_refused_connection() {
    let client = client_with_policy(ErrorPolicy::SuppressConnection);

    let response = client
        .call_get("http://127.0.0.1:1/latest.json", &JsonObjectDeserializer)
        .await
        .expect("suppressing policy must not raise");

    assert!(response.content().is_none());
}

#[derive(Debug, Default)]
struct CapturingSink {
    records: Mutex<Vec<(String, Vec<u8>)>>,
}

impl DebugSink for CapturingSink {
    fn record(&self, url: &str, body: &[u8]) {
        self.records
            .lock()
            .unwrap()
            .push((url.to_string(), body.to_vec()));
    }
}

#[tokio::test]
async fn test_debug_sink_receives_url_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/currencies.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "USD": "United States Dollar" })),
        )
        .mount(&server)
        .await;

    let sink = Arc::new(CapturingSink::default());
    let mut client = client_with_policy(ErrorPolicy::PropagateAll);
    client.set_debug_sink(Some(sink.clone()));

    let url = format!("{}/currencies.json", server.uri());
    client.call_get(&url, &JsonObjectDeserializer).await.unwrap();

    let records = sink.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].0, url);
    assert!(String::from_utf8_lossy(&records[0].1).contains("United States Dollar"));
}

#[tokio::test]
async fn test_concurrent_calls_are_serialized_over_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "rates": { "USD": 1.0 } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_with_policy(ErrorPolicy::PropagateAll);
    client.set_cache(Some(Arc::new(MemoryCache::new())));
    let client = Arc::new(client);

    let url = format!("{}/latest.json", server.uri());

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let client = Arc::clone(&client);
            let url = url.clone();
            tokio::spawn(async move {
                client
                    .call_get(&url, &JsonObjectDeserializer)
                    .await
                    .map(|r| r.content().cloned())
            })
        })
        .collect();

    let mut contents: Vec<Option<serde_json::Map<String, serde_json::Value>>> = Vec::new();
    for task in tasks {
        contents.push(task.await.unwrap().unwrap());
    }

    // Every caller observed the same payload, and the mock saw one GET.
    assert!(contents.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_headers_are_exposed_on_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_json(serde_json::json!({ "rates": {} })),
        )
        .mount(&server)
        .await;

    let client = client_with_policy(ErrorPolicy::PropagateAll);
    let url = format!("{}/latest.json", server.uri());

    let response = client.call_get(&url, &JsonObjectDeserializer).await.unwrap();
    let headers: &HashMap<String, Vec<String>> = response.headers();
    assert_eq!(
        headers.get("content-type").map(|v| v[0].as_str()),
        Some("application/json")
    );
}
