//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tokio::task::JoinHandle;

use slotd::config::ServerConfig;
use slotd::lifecycle::Shutdown;
use slotd::net::Listener;
use slotd::workers::WorkerPool;
use slotd::{HandlerRegistry, HttpServer};

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub pool: WorkerPool,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the accept loop to finish draining.
    pub async fn stop(self) -> std::io::Result<()> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }

    /// Wait until no slot is held (connection tasks finish just after the
    /// client has read its response).
    pub async fn wait_idle(&self) {
        for _ in 0..100 {
            if self.pool.busy() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("slots still busy: {:?}", self.pool.stats());
    }
}

/// Path that is guaranteed not to exist.
pub fn missing_credential_path() -> PathBuf {
    std::env::temp_dir().join(format!("slotd-missing-{}.json", uuid::Uuid::new_v4()))
}

/// Write `contents` to a fresh temp file and return its path.
pub fn write_credential(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("slotd-key-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).unwrap();
    path
}

/// Defaults suitable for tests: ephemeral port, small pool, short timeout,
/// no credential mounted.
pub fn test_config(workers: usize, request_timeout_ms: u64) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.port = 0;
    config.workers.count = workers;
    config.workers.request_timeout_ms = request_timeout_ms;
    config.credentials.path = missing_credential_path();
    config
}

/// Bind, build and spawn a server.
pub async fn start_server(config: ServerConfig, registry: HandlerRegistry) -> TestServer {
    let listener = Listener::bind(&config.listener).unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = HttpServer::new(config, registry);
    let pool = server.pool().clone();

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let handle = tokio::spawn(server.run(listener, signal));

    TestServer {
        addr: SocketAddr::from(([127, 0, 0, 1], port)),
        pool,
        shutdown,
        handle,
    }
}

/// Client without connection reuse, so every request takes a fresh slot.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
