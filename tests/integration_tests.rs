//! Integration tests using wiremock to simulate HTTP servers.

use courier::{Client, Error, ResponseType, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestData {
    id: u32,
    name: String,
}

#[derive(Debug, Default, PartialEq)]
enum Outcome {
    Success(Value),
    NoContent,
    Failed(Option<u16>),
    Unauthorized,
    Exhausted,
    #[default]
    Unhandled,
}

fn client() -> Client {
    Client::new().unwrap()
}

#[tokio::test]
async fn test_successful_get_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result: Value = client()
        .get(format!("{}/x", mock_server.uri()))
        .max_retry(1)
        .on_success(|response| async move { response.data })
        .send()
        .await
        .unwrap();

    assert_eq!(result, json!({ "ok": true }));
}

#[tokio::test]
async fn test_typed_response_data() {
    let mock_server = MockServer::start().await;

    let response_data = TestData {
        id: 1,
        name: "Test".to_string(),
    };

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&response_data)
                .insert_header("x-custom-header", "custom-value"),
        )
        .mount(&mock_server)
        .await;

    let result: Option<(TestData, Option<String>, usize)> = client()
        .get(format!("{}/test", mock_server.uri()))
        .on_success(|response| async move {
            let data = response.json::<TestData>().ok()?;
            let custom = response.header("x-custom-header").map(str::to_string);
            Some((data, custom, response.attempts))
        })
        .send()
        .await
        .unwrap();

    let (data, custom, attempts) = result.unwrap();
    assert_eq!(data, response_data);
    assert_eq!(custom.as_deref(), Some("custom-value"));
    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn test_post_json_body() {
    let mock_server = MockServer::start().await;

    let request_data = TestData {
        id: 0,
        name: "New".to_string(),
    };

    Mock::given(method("POST"))
        .and(path("/test"))
        .and(body_json(&request_data))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1, "name": "New" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let created: Option<TestData> = client()
        .post(format!("{}/test", mock_server.uri()))
        .json(&request_data)
        .unwrap()
        .on_success(|response| async move { response.json().ok() })
        .send()
        .await
        .unwrap();

    assert_eq!(created.map(|data| data.id), Some(1));
}

#[tokio::test]
async fn test_bearer_token_and_headers_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/secure"))
        .and(header("authorization", "Bearer t0k3n"))
        .and(header("x-request-id", "abc"))
        .and(header("user-agent", "courier-tests"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .default_header("User-Agent", "courier-tests")
        .unwrap()
        .build()
        .unwrap();

    let outcome = client
        .get(format!("{}/secure", mock_server.uri()))
        .bearer_token("t0k3n")
        .header("x-request-id", "abc")
        .on_success(|response| async move { Outcome::Success(response.data) })
        .on_failed(|response| async move { Outcome::Failed(response.status.map(|s| s.as_u16())) })
        .send()
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Success(Value::Null));
}

#[tokio::test]
async fn test_query_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let count: usize = client()
        .get(format!("{}/search", mock_server.uri()))
        .query_param("page", "1")
        .query_param("limit", "10")
        .on_success(|response| async move { response.data.as_array().map_or(0, Vec::len) })
        .send()
        .await
        .unwrap();

    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_no_content_runs_success_side_effects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/items/1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let observed = Arc::new(AtomicUsize::new(0));
    let counter = observed.clone();

    let outcome = client()
        .delete(format!("{}/items/1", mock_server.uri()))
        .success_side_effect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async {}
        })
        .on_success(|response| async move { Outcome::Success(response.data) })
        .on_no_content(|_| async { Outcome::NoContent })
        .send()
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::NoContent);
    assert_eq!(observed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_http_error_routes_to_failed_strategy() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let bodies = Arc::new(Mutex::new(Vec::new()));
    let seen = bodies.clone();

    let outcome = client()
        .get(format!("{}/test", mock_server.uri()))
        .failed_side_effect(move |response| {
            seen.lock().unwrap().push(response.raw_body.clone());
            async {}
        })
        .on_failed(|response| async move { Outcome::Failed(response.status.map(|s| s.as_u16())) })
        .send()
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Failed(Some(404)));
    assert_eq!(*bodies.lock().unwrap(), vec!["Not found".to_string()]);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = client()
        .get(format!("{}/test", mock_server.uri()))
        .max_retry(5)
        .on_failed(|response| async move { Outcome::Failed(response.status.map(|s| s.as_u16())) })
        .send()
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Failed(Some(500)));
}

#[tokio::test]
async fn test_unauthorized_without_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let refreshes = Arc::new(AtomicUsize::new(0));
    let counter = refreshes.clone();

    let outcome = client()
        .get(format!("{}/x", mock_server.uri()))
        .max_retry(1)
        .refresh_token(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .on_unauthorized(|_| async { Outcome::Unauthorized })
        .send()
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Unauthorized);
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refresh_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Alice" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let token = Arc::new(Mutex::new("stale".to_string()));
    let current = token.clone();

    let outcome = client()
        .get(format!("{}/me", mock_server.uri()))
        .bearer_token_with(move || Some(current.lock().unwrap().clone()))
        .refresh_token(move || {
            *token.lock().unwrap() = "fresh".to_string();
            async { true }
        })
        .on_success(|response| async move { Outcome::Success(response.data) })
        .on_unauthorized(|_| async { Outcome::Unauthorized })
        .send()
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Success(json!({ "name": "Alice" })));
}

#[tokio::test]
async fn test_refresh_loop_exhausts_budget() {
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(move |_req: &wiremock::Request| {
            attempt_count_clone.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(401)
        })
        .mount(&mock_server)
        .await;

    let fallback_urls = Arc::new(Mutex::new(Vec::new()));
    let seen = fallback_urls.clone();

    let outcome = client()
        .get(format!("{}/x", mock_server.uri()))
        .max_retry(2)
        .refresh_token(|| async { true })
        .retry_fallback_side_effect(move |descriptor| {
            seen.lock().unwrap().push(descriptor.url().to_string());
            async {}
        })
        .on_unauthorized(|_| async { Outcome::Unauthorized })
        .on_retry_exhausted(|_| async { Outcome::Exhausted })
        .send()
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Exhausted);
    assert_eq!(attempt_count.load(Ordering::SeqCst), 2);
    assert_eq!(
        *fallback_urls.lock().unwrap(),
        vec![format!("{}/x", mock_server.uri())]
    );
}

#[tokio::test]
async fn test_zero_retry_budget_skips_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let outcome = client()
        .get(format!("{}/x", mock_server.uri()))
        .max_retry(0)
        .on_success(|response| async move { Outcome::Success(response.data) })
        .on_retry_exhausted(|_| async { Outcome::Exhausted })
        .send()
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Exhausted);
}

#[tokio::test]
async fn test_text_response_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/raw"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .mount(&mock_server)
        .await;

    let data: Value = client()
        .get(format!("{}/raw", mock_server.uri()))
        .response_type(ResponseType::Text)
        .on_success(|response| async move { response.data })
        .send()
        .await
        .unwrap();

    assert_eq!(data, Value::String(r#"{"ok":true}"#.to_string()));
}

#[tokio::test]
async fn test_connection_failure_is_classified_failed() {
    // Bind and drop a server so the port is very likely closed.
    let uri = {
        let mock_server = MockServer::start().await;
        mock_server.uri()
    };

    let outcome = client()
        .get(format!("{}/x", uri))
        .on_success(|response| async move { Outcome::Success(response.data) })
        .on_failed(|response| async move {
            assert!(response.is_transport_error());
            Outcome::Failed(response.status.map(|s| s.as_u16()))
        })
        .send()
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Failed(None));
}

#[tokio::test]
async fn test_transport_timeout_is_classified_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let outcome = client
        .get(format!("{}/slow", mock_server.uri()))
        .on_success(|response| async move { Outcome::Success(response.data) })
        .on_failed(|response| async move { Outcome::Failed(response.status.map(|s| s.as_u16())) })
        .send()
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Failed(None));
}

#[tokio::test]
async fn test_invalid_configuration_never_dispatches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = client()
        .get::<Outcome>(format!("{}/x", mock_server.uri()))
        .header("bad header", "x")
        .send()
        .await;

    match result {
        Err(Error::Validation(ValidationError::InvalidHeader { name, .. })) => {
            assert_eq!(name, "bad header");
        }
        other => panic!("Expected InvalidHeader, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unset_strategies_return_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let outcome: Outcome = client()
        .put(format!("{}/x", mock_server.uri()))
        .body(json!({ "a": 1 }))
        .send()
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Unhandled);
}
