#![allow(clippy::unwrap_used)]
// Integration tests for `CloudClient` using wiremock.

use pretty_assertions::assert_eq;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spark_api::{CloudClient, Error, Method};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, CloudClient) {
    let server = MockServer::start().await;
    let client = CloudClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        SecretString::from("T1".to_string()),
    )
    .unwrap();
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices_sends_bearer_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "a1", "name": "core1", "connected": true, "last_heard": "2014-01-01T00:00:00Z" },
            { "id": "a2", "name": null, "connected": false }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].id, "a1");
    assert_eq!(devices[0].name.as_deref(), Some("core1"));
    assert!(devices[0].connected);
    assert_eq!(devices[1].name, None);
}

#[tokio::test]
async fn test_get_device_capabilities() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a1",
            "name": "core1",
            "connected": true,
            "variables": { "temp": "double", "label": "string" },
            "functions": ["led", "brew"],
            "product_id": 0
        })))
        .mount(&server)
        .await;

    let device = client.get_device("a1").await.unwrap();

    assert_eq!(device.name.as_deref(), Some("core1"));
    let vars = device.variables.unwrap();
    assert_eq!(vars.get("temp").map(String::as_str), Some("double"));
    assert_eq!(device.functions.unwrap(), vec!["led", "brew"]);
    assert!(device.extra.contains_key("product_id"));
}

#[tokio::test]
async fn test_get_offline_device_has_no_capabilities() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a1",
            "name": "core1",
            "connected": false,
            "variables": null,
            "functions": null
        })))
        .mount(&server)
        .await;

    let device = client.get_device("a1").await.unwrap();
    assert!(device.variables.is_none());
    assert!(device.functions.is_none());
}

#[tokio::test]
async fn test_read_variable_keeps_value_unchanged() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices/a1/temp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cmd": "VarReturn",
            "name": "temp",
            "result": 21.123_456_789,
            "coreInfo": { "deviceID": "a1", "connected": true }
        })))
        .mount(&server)
        .await;

    let reading = client.read_variable("a1", "temp").await.unwrap();

    assert_eq!(reading.name, "temp");
    assert_eq!(reading.result, json!(21.123_456_789));
    assert!(reading.core_info.is_some());
}

#[tokio::test]
async fn test_call_function_posts_args() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/devices/a1/led"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "args": "on" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a1",
            "name": "core1",
            "connected": true,
            "return_value": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ret = client.call_function("a1", "led", "on").await.unwrap();
    assert_eq!(ret.return_value, json!(1));
    assert_eq!(ret.connected, Some(true));
}

#[tokio::test]
async fn test_raw_request_merges_caller_headers() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/v1/devices/a1"))
        .and(header("x-trace", "abc"))
        .and(body_json(json!({ "name": "kettle" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "a1", "name": "kettle" })))
        .mount(&server)
        .await;

    let mut headers = HeaderMap::new();
    headers.insert("x-trace", HeaderValue::from_static("abc"));
    let body = json!({ "name": "kettle" });

    let value = client
        .request("/a1", Method::Put, headers, Some(&body))
        .await
        .unwrap();
    assert_eq!(value["name"], "kettle");
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_rejected_token_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_token",
            "error_description": "The access token provided is invalid."
        })))
        .mount(&server)
        .await;

    let result = client.list_devices().await;
    match result {
        Err(Error::Authentication { message }) => {
            assert_eq!(message, "The access token provided is invalid.");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_device_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices/zz"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "ok": false, "error": "Device not found." })),
        )
        .mount(&server)
        .await;

    let err = client.get_device("zz").await.unwrap_err();
    assert!(err.is_not_found(), "expected not found, got: {err:?}");
}

#[tokio::test]
async fn test_ok_false_body_is_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices/a1/temp"))
        .respond_with(
            ResponseTemplate::new(408).set_body_json(json!({ "ok": false, "error": "Timed out." })),
        )
        .mount(&server)
        .await;

    let result = client.read_variable("a1", "temp").await;
    assert!(
        matches!(result, Err(Error::Api { status: 408, ref message }) if message == "Timed out."),
        "expected Api error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_empty_body_is_reported() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result = client.list_devices().await;
    assert!(matches!(result, Err(Error::EmptyResponse)), "got: {result:?}");
}

#[tokio::test]
async fn test_malformed_payload_keeps_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "not": "a list" })))
        .mount(&server)
        .await;

    match client.list_devices().await {
        Err(Error::Deserialization { body, .. }) => assert!(body.contains("a list")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_slash_in_device_id_stays_one_segment() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices/a1/temp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": 1 })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/a1%2Ftemp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a1/temp",
            "name": "odd",
            "connected": true,
            "variables": {},
            "functions": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let device = client.get_device("a1/temp").await.unwrap();
    assert_eq!(device.name.as_deref(), Some("odd"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/v1/devices/a1%2Ftemp");
}

#[tokio::test]
async fn test_dot_segment_is_rejected_before_sending() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": 1 })))
        .expect(0)
        .mount(&server)
        .await;

    let result = client.read_variable("a1", "..").await;
    assert!(
        matches!(result, Err(Error::InvalidSegment { ref segment }) if segment == ".."),
        "got: {result:?}"
    );
    let result = client.call_function("..", "led", "on").await;
    assert!(matches!(result, Err(Error::InvalidSegment { .. })), "got: {result:?}");
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Reserve a port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = CloudClient::with_client(
        reqwest::Client::new(),
        Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(),
        SecretString::from("T1".to_string()),
    )
    .unwrap();

    let err = client.list_devices().await.unwrap_err();
    assert!(err.is_transport(), "expected transport error, got: {err:?}");
}
