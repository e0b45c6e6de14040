//! Startup preconditions and credential handling over real sockets.

use std::time::Duration;

use serde_json::Value;

use slotd::app::registry_for;
use slotd::lifecycle::{startup, Shutdown, StartupError};
use slotd::net::Listener;

mod common;

fn diagnostics() -> slotd::HandlerRegistry {
    registry_for("diagnostics").unwrap()
}

#[tokio::test]
async fn test_missing_credential_lenient() {
    let server = common::start_server(common::test_config(2, 2_000), diagnostics()).await;
    let client = common::client();

    let res = client.get(server.url("/credential")).send().await.unwrap();
    assert_eq!(res.status(), 503);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "credential unavailable");

    // Routes that do not need the credential keep working.
    let res = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let res = client.get(server.url("/healthz")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let health: Value = res.json().await.unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["credential"], "missing");
    assert_eq!(health["workers"], 2);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_mounted_credential_is_served() {
    let path = common::write_credential(r#"{"type":"service_account","private_key":"secret"}"#);
    let mut config = common::test_config(1, 2_000);
    config.credentials.path = path.clone();

    let server = common::start_server(config, diagnostics()).await;
    let client = common::client();

    let res = client.get(server.url("/credential")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let text = res.text().await.unwrap();
    assert!(!text.contains("secret"), "key material leaked: {}", text);
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["available"], true);
    assert!(body["fields"].as_array().unwrap().contains(&Value::from("private_key")));

    let health: Value = client
        .get(server.url("/healthz"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["credential"], "present");

    server.stop().await.unwrap();
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn test_strict_preflight_refuses_to_start() {
    let mut config = common::test_config(1, 2_000);
    config.credentials.strict_preflight = true;

    let shutdown = Shutdown::new();
    let result = tokio::time::timeout(
        Duration::from_secs(2),
        startup::start(config, diagnostics(), shutdown.subscribe()),
    )
    .await
    .expect("startup should fail fast");

    assert!(matches!(result, Err(StartupError::Credential(_))), "got {:?}", result);
}

#[tokio::test]
async fn test_port_in_use_is_a_bind_error() {
    let mut taken = common::test_config(1, 2_000);
    let holder = Listener::bind(&taken.listener).unwrap();
    taken.listener.port = holder.local_addr().unwrap().port();

    let shutdown = Shutdown::new();
    let result = tokio::time::timeout(
        Duration::from_secs(2),
        startup::start(taken, diagnostics(), shutdown.subscribe()),
    )
    .await
    .expect("startup should fail fast");

    assert!(matches!(result, Err(StartupError::Bind(_))), "got {:?}", result);
}

#[tokio::test]
async fn test_start_serves_until_shutdown() {
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(startup::start(
        common::test_config(1, 2_000),
        diagnostics(),
        shutdown.subscribe(),
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.trigger();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok(), "got {:?}", result);
}

#[tokio::test]
async fn test_health_endpoint_can_be_disabled() {
    let mut config = common::test_config(1, 2_000);
    config.health.enabled = false;

    let server = common::start_server(config, diagnostics()).await;
    let res = common::client().get(server.url("/healthz")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    server.stop().await.unwrap();
}
