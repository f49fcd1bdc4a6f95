#![allow(clippy::unwrap_used)]
// Integration tests for `DeviceSession` and `VariableHandle` using wiremock.

use std::time::Duration;

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spark_core::{
    AutoUpdate, CloudConfig, CoreError, DeviceSession, PollState, SessionState, UpdateStream,
    VariableUpdate,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> CloudConfig {
    CloudConfig {
        url: Url::parse(&server.uri()).unwrap(),
        timeout: Duration::from_secs(5),
        ..CloudConfig::default()
    }
}

async fn setup() -> (MockServer, DeviceSession) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a1",
            "name": "core1",
            "connected": true,
            "variables": { "temp": "double" },
            "functions": ["led", "brew"]
        })))
        .mount(&server)
        .await;

    let cloud = config(&server)
        .client(SecretString::from("T1".to_string()))
        .unwrap();
    let session = DeviceSession::new(cloud, "a1");
    (server, session)
}

async fn next_update(updates: &mut UpdateStream) -> VariableUpdate {
    tokio::time::timeout(Duration::from_secs(5), updates.next())
        .await
        .unwrap()
        .unwrap()
}

// ── Discovery ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_populates_capabilities() {
    let (_server, session) = setup().await;
    assert_eq!(session.state(), SessionState::Connecting);

    let descriptor = session.connect().await.unwrap();

    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(descriptor.name, "core1");
    assert_eq!(session.name(), Some("core1"));
    assert_eq!(session.function_names(), ["led", "brew"]);
    assert_eq!(session.variable_names().collect::<Vec<_>>(), ["temp"]);
}

#[tokio::test]
async fn test_connect_twice_issues_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a1", "name": "core1", "connected": true,
            "variables": {}, "functions": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cloud = config(&server)
        .client(SecretString::from("T1".to_string()))
        .unwrap();
    let session = DeviceSession::new(cloud, "a1");

    session.connect().await.unwrap();
    session.connect().await.unwrap();
    assert!(session.function_names().is_empty());
}

#[tokio::test]
async fn test_missing_device_errors_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/ghost"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "Permission Denied" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cloud = config(&server)
        .client(SecretString::from("T1".to_string()))
        .unwrap();
    let session = DeviceSession::new(cloud, "ghost");

    let err = session.connect().await.unwrap_err();
    assert!(
        matches!(err, CoreError::DeviceNotFound { ref id } if id == "ghost"),
        "got: {err:?}"
    );
    assert!(matches!(session.state(), SessionState::Errored { .. }));

    // Errored is terminal: no second discovery request.
    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, CoreError::SessionFailed { .. }), "got: {err:?}");
    assert!(matches!(
        session.variable("temp").unwrap_err(),
        CoreError::SessionFailed { .. }
    ));
}

#[tokio::test]
async fn test_capabilities_unavailable_before_connect() {
    let (_server, session) = setup().await;
    let err = session.function("led").unwrap_err();
    assert!(matches!(err, CoreError::NotReady { .. }), "got: {err:?}");
}

#[tokio::test]
async fn test_wait_ready_observes_other_connect() {
    let (_server, session) = setup().await;
    let waiter = session.clone();
    let handle = tokio::spawn(async move { waiter.wait_ready().await });

    session.connect().await.unwrap();
    let descriptor = handle.await.unwrap().unwrap();
    assert_eq!(descriptor.id, "a1");
}

// ── Functions ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_invoke_declared_function() {
    let (server, session) = setup().await;
    Mock::given(method("POST"))
        .and(path("/v1/devices/a1/brew"))
        .and(body_json(json!({ "args": "coffee" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a1", "name": "core1", "connected": true, "return_value": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    session.connect().await.unwrap();
    let value = session.invoke_function("brew", "coffee").await.unwrap();

    assert_eq!(value, json!(1));
}

#[tokio::test]
async fn test_unknown_function_issues_no_request() {
    let (server, session) = setup().await;
    Mock::given(method("POST"))
        .and(path("/v1/devices/a1/explode"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    session.connect().await.unwrap();
    let err = session.invoke_function("explode", "").await.unwrap_err();

    assert!(matches!(err, CoreError::UnknownFunction { .. }), "got: {err:?}");
    assert!(err.is_unknown_capability());
}

#[tokio::test]
async fn test_function_failure_is_remote_execution() {
    let (server, session) = setup().await;
    Mock::given(method("POST"))
        .and(path("/v1/devices/a1/led"))
        .respond_with(
            ResponseTemplate::new(408).set_body_json(json!({ "ok": false, "error": "Timed out." })),
        )
        .mount(&server)
        .await;

    session.connect().await.unwrap();
    let err = session.invoke_function("led", "on").await.unwrap_err();

    match err {
        CoreError::RemoteExecution { name, source } => {
            assert_eq!(name, "led");
            assert!(source.to_string().contains("Timed out."));
        }
        other => panic!("expected RemoteExecution, got: {other:?}"),
    }
}

// ── Variables ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_variable_returns_value_unchanged() {
    let (server, session) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/a1/temp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "temp", "result": 21.5, "coreInfo": { "deviceID": "a1" }
        })))
        .expect(2)
        .mount(&server)
        .await;

    session.connect().await.unwrap();

    assert_eq!(session.read_variable("temp").await.unwrap(), json!(21.5));
    let handle = session.variable("temp").unwrap();
    assert_eq!(handle.read().await.unwrap(), json!(21.5));
}

#[tokio::test]
async fn test_unknown_variable_issues_no_request() {
    let (server, session) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/a1/humidity"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    session.connect().await.unwrap();

    let err = session.read_variable("humidity").await.unwrap_err();
    assert!(matches!(err, CoreError::UnknownVariable { .. }), "got: {err:?}");
    assert!(session.variable("humidity").is_err());
}

#[tokio::test]
async fn test_variable_handle_is_shared() {
    let (_server, session) = setup().await;
    session.connect().await.unwrap();

    let first = session.variable("temp").unwrap();
    let second = session.variable("temp").unwrap();
    first.set_auto_update(AutoUpdate::from_millis(60_000));

    assert_eq!(second.poll_state(), PollState::Polling);
    first.disable_auto_update();
    assert_eq!(second.poll_state(), PollState::Idle);
}

#[tokio::test]
async fn test_handle_outliving_session_reports_closed() {
    let (_server, session) = setup().await;
    session.connect().await.unwrap();
    let handle = session.variable("temp").unwrap();
    drop(session);

    let err = handle.read().await.unwrap_err();
    assert!(
        matches!(err, CoreError::SessionClosed { ref id } if id == "a1"),
        "got: {err:?}"
    );
}

// ── Auto-update ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_auto_update_broadcasts_values() {
    let (server, session) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/a1/temp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "temp", "result": 19, "coreInfo": {}
        })))
        .mount(&server)
        .await;

    session.connect().await.unwrap();
    let handle = session.variable("temp").unwrap();
    let mut updates = handle.updates();
    handle.set_auto_update(AutoUpdate::from_millis(20));
    assert_eq!(handle.interval(), Some(Duration::from_millis(20)));

    for _ in 0..3 {
        let update = next_update(&mut updates).await;
        assert_eq!(update.variable, "temp");
        assert_eq!(update.result.unwrap(), json!(19));
    }

    handle.disable_auto_update();
    assert_eq!(handle.poll_state(), PollState::Idle);
}

#[tokio::test]
async fn test_auto_update_survives_failed_reads() {
    let (server, session) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/a1/temp"))
        .respond_with(
            ResponseTemplate::new(408).set_body_json(json!({ "ok": false, "error": "Timed out." })),
        )
        .mount(&server)
        .await;

    session.connect().await.unwrap();
    let handle = session.variable("temp").unwrap();
    let mut updates = handle.updates();
    handle.set_auto_update(AutoUpdate::from_millis(20));

    for _ in 0..2 {
        let update = next_update(&mut updates).await;
        let err = update.result.unwrap_err();
        assert!(matches!(*err, CoreError::RemoteRead { .. }), "got: {err:?}");
    }
    assert_eq!(handle.poll_state(), PollState::Polling);

    handle.set_auto_update(AutoUpdate::from_millis(0));
    assert_eq!(handle.poll_state(), PollState::Idle);
}

#[tokio::test]
async fn test_disabling_one_handle_leaves_the_other_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a1", "name": "core1", "connected": true,
            "variables": { "temp": "double", "humidity": "int32" }, "functions": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/a1/temp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "temp", "result": 19, "coreInfo": {}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/a1/humidity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "humidity", "result": 40, "coreInfo": {}
        })))
        .mount(&server)
        .await;

    let cloud = config(&server)
        .client(SecretString::from("T1".to_string()))
        .unwrap();
    let session = DeviceSession::new(cloud, "a1");
    session.connect().await.unwrap();

    let temp = session.variable("temp").unwrap();
    let humidity = session.variable("humidity").unwrap();
    let mut temp_updates = temp.updates();
    let mut humidity_updates = humidity.updates();
    temp.set_auto_update(AutoUpdate::from_millis(20));
    humidity.set_auto_update(AutoUpdate::from_millis(30));

    let update = next_update(&mut temp_updates).await;
    assert_eq!(update.variable, "temp");
    assert_eq!(update.result.unwrap(), json!(19));
    let update = next_update(&mut humidity_updates).await;
    assert_eq!(update.variable, "humidity");
    assert_eq!(update.result.unwrap(), json!(40));

    temp.disable_auto_update();
    assert_eq!(temp.poll_state(), PollState::Idle);
    assert_eq!(humidity.interval(), Some(Duration::from_millis(30)));

    // Fresh subscriptions only see what happens after the switch.
    let mut temp_after = temp.updates();
    let mut humidity_after = humidity.updates();
    for _ in 0..3 {
        let update = next_update(&mut humidity_after).await;
        assert_eq!(update.variable, "humidity");
    }
    assert!(
        tokio::time::timeout(Duration::from_millis(100), temp_after.next())
            .await
            .is_err(),
        "disabled handle kept emitting"
    );

    humidity.disable_auto_update();
}

#[tokio::test]
async fn test_retuning_interval_keeps_single_timer() {
    let (_server, session) = setup().await;
    session.connect().await.unwrap();
    let handle = session.variable("temp").unwrap();

    handle.set_auto_update(AutoUpdate::from_millis(60_000));
    handle.set_auto_update(AutoUpdate::enabled());

    assert_eq!(handle.interval(), Some(Duration::from_millis(1000)));
    handle.disable_auto_update();
    assert_eq!(handle.interval(), None);
}
