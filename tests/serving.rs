//! End-to-end tests of the serving core over real sockets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::response::IntoResponse;
use serde_json::Value;

use slotd::{AppRequest, HandlerError, HandlerRegistry, HandlerResult};

mod common;

async fn fast(_req: AppRequest) -> HandlerResult {
    Ok("fast".into_response())
}

async fn slow(_req: AppRequest) -> HandlerResult {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Ok("slow".into_response())
}

async fn panics(_req: AppRequest) -> HandlerResult {
    panic!("handler exploded");
}

#[tokio::test]
async fn test_concurrency_is_bounded_by_pool() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let (a, p) = (active.clone(), peak.clone());
    let registry = HandlerRegistry::new().get("/work", move |_req: AppRequest| {
        let (active, peak) = (a.clone(), p.clone());
        async move {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(150)).await;
            active.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, HandlerError>("done".into_response())
        }
    });

    let server = common::start_server(common::test_config(2, 5_000), registry).await;
    let client = common::client();

    let mut tasks = Vec::new();
    for _ in 0..5 {
        let client = client.clone();
        let url = server.url("/work");
        tasks.push(tokio::spawn(async move { client.get(url).send().await }));
    }
    for task in tasks {
        let res = task.await.unwrap().expect("request failed");
        assert_eq!(res.status(), 200);
    }

    let peak = peak.load(Ordering::SeqCst);
    assert!(peak <= 2, "at most 2 handlers may run at once (saw {})", peak);
    assert!(peak >= 1);

    server.wait_idle().await;
    assert_eq!(server.pool.stats().served, 5);
    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_timeout_returns_504_and_frees_slot() {
    let registry = HandlerRegistry::new().get("/slow", slow).get("/fast", fast);
    let server = common::start_server(common::test_config(1, 200), registry).await;
    let client = common::client();

    let started = Instant::now();
    let res = client.get(server.url("/slow")).send().await.unwrap();
    assert_eq!(res.status(), 504);
    assert!(started.elapsed() < Duration::from_secs(2));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "request timed out");

    // The only slot must be usable again.
    server.wait_idle().await;
    let res = client.get(server.url("/fast")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "fast");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_queued_request_runs_after_timed_out_slot_frees() {
    let server = common::start_server(
        common::test_config(1, 200),
        HandlerRegistry::new().get("/slow", slow),
    )
    .await;
    let client = common::client();

    let started = Instant::now();
    let first = tokio::spawn(client.get(server.url("/slow")).send());
    let second = tokio::spawn(client.get(server.url("/slow")).send());

    // The second request waits in the backlog, then gets its own deadline.
    assert_eq!(first.await.unwrap().unwrap().status(), 504);
    assert_eq!(second.await.unwrap().unwrap().status(), 504);
    assert!(started.elapsed() < Duration::from_secs(3));

    server.wait_idle().await;
    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_panic_returns_500_and_frees_slot() {
    let registry = HandlerRegistry::new().get("/panic", panics).get("/fast", fast);
    let server = common::start_server(common::test_config(1, 2_000), registry).await;
    let client = common::client();

    let res = client.get(server.url("/panic")).send().await.unwrap();
    assert_eq!(res.status(), 500);
    let body = res.text().await.unwrap();
    assert!(!body.contains("exploded"), "panic message leaked: {}", body);

    let res = client.get(server.url("/fast")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_unknown_path_and_wrong_method() {
    let registry = HandlerRegistry::new().get("/", fast);
    let server = common::start_server(common::test_config(1, 2_000), registry).await;
    let client = common::client();

    let res = client.get(server.url("/nope")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    let res = client.post(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 405);
    assert_eq!(res.headers()["allow"], "GET");

    server.wait_idle().await;
    assert_eq!(server.pool.stats().served, 2);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_response_headers() {
    let server = common::start_server(
        common::test_config(1, 2_000),
        HandlerRegistry::new().get("/", fast),
    )
    .await;
    let client = common::client();

    let a = client.get(server.url("/")).send().await.unwrap();
    let b = client.get(server.url("/")).send().await.unwrap();

    assert_eq!(a.headers()["connection"], "close");
    assert_eq!(a.headers()["x-worker-slot"], "0");
    assert_ne!(a.headers()["x-request-id"], b.headers()["x-request-id"]);
    assert_eq!(a.text().await.unwrap(), b.text().await.unwrap());

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = common::test_config(1, 2_000);
    config.limits.max_body_bytes = 16;
    let server = common::start_server(config, slotd::app::registry_for("diagnostics").unwrap()).await;
    let client = common::client();

    let res = client.post(server.url("/echo")).body(vec![b'x'; 64]).send().await.unwrap();
    assert_eq!(res.status(), 413);

    let res = client.post(server.url("/echo")).body("small").send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "small");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_graceful_shutdown_drains_in_flight() {
    let registry = HandlerRegistry::new().get("/work", |_req: AppRequest| async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok::<_, HandlerError>("finished".into_response())
    });
    let server = common::start_server(common::test_config(2, 5_000), registry).await;
    let addr = server.addr;
    let client = common::client();

    let url = server.url("/work");
    let in_flight = tokio::spawn(async move { client.get(url).send().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Still draining: the request has not finished yet.
    assert!(!in_flight.is_finished());
    assert!(
        tokio::net::TcpStream::connect(addr).await.is_err(),
        "new connections must be refused once shutdown starts"
    );

    let res = in_flight.await.unwrap().expect("in-flight request was dropped");
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "finished");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_idle_server_reports_no_busy_slots() {
    let server = common::start_server(
        common::test_config(2, 2_000),
        HandlerRegistry::new().get("/", fast),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let stats = server.pool.stats();
    assert_eq!(stats.busy, 0, "{:?}", stats);
    assert_eq!(stats.idle, 2);
    assert_eq!(stats.served, 0);

    // The health request is the only one in flight.
    let health: Value = common::client()
        .get(server.url("/healthz"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["busy"], 1);
    assert_eq!(health["idle"], 1);

    server.wait_idle().await;
    assert_eq!(server.pool.stats().served, 1);
    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_aborts_after_grace_window() {
    let mut config = common::test_config(1, 10_000);
    config.workers.graceful_timeout_ms = Some(100);
    let server = common::start_server(config, HandlerRegistry::new().get("/slow", slow)).await;
    let client = common::client();

    let url = server.url("/slow");
    let in_flight = tokio::spawn(async move { client.get(url).send().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    server.stop().await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));

    // The aborted connection closes without a response.
    assert!(in_flight.await.unwrap().is_err());
}

#[tokio::test]
async fn test_idle_shutdown_is_immediate() {
    let server = common::start_server(
        common::test_config(1, 2_000),
        HandlerRegistry::new().get("/", fast),
    )
    .await;

    let started = Instant::now();
    server.stop().await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(500));
}
