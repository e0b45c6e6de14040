//! HTTP server: accept loop and connection serving.
//!
//! # Responsibilities
//! - Acquire a worker slot, then accept one connection for it
//! - Serve that connection (one request, HTTP/1.1, no keep-alive)
//! - Bound every connection by a hard deadline
//! - On shutdown: stop accepting, drain in-flight work, close the rest
//!
//! # Design Decisions
//! - Slot before accept: when all slots are busy, new connections wait in
//!   the kernel backlog and are never read by this process
//! - The `SlotGuard` moves into the connection task, so the slot is freed
//!   when the task ends for any reason (completion, timeout, panic, abort)
//! - Header reads share the request timeout, so a silent client cannot
//!   pin a slot

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, Request};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;
use tokio::task::JoinSet;

use super::dispatch::dispatch;
use crate::config::ServerConfig;
use crate::credentials::CredentialStore;
use crate::health;
use crate::lifecycle::ShutdownSignal;
use crate::net::{ConnectionInfo, Listener};
use crate::resilience::Deadline;
use crate::routing::HandlerRegistry;
use crate::workers::{PoolError, SlotGuard, WorkerPool};

/// Pause after a failed `accept` (e.g. EMFILE) before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Shared state handed to every connection task.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<ServerConfig>,
    pub(crate) registry: Arc<HandlerRegistry>,
    pub(crate) pool: WorkerPool,
    pub(crate) credentials: Arc<CredentialStore>,
}

/// The serving core: worker pool, handler registry and accept loop.
pub struct HttpServer {
    state: AppState,
}

impl HttpServer {
    /// Create a server for `registry`. Registers the health endpoint unless
    /// it is disabled or the application already serves that path.
    pub fn new(config: ServerConfig, mut registry: HandlerRegistry) -> Self {
        if let Some(path) = config.health_path() {
            if registry.has_path(path) {
                tracing::warn!(path, "Application serves the health path; built-in endpoint skipped");
            } else {
                registry.insert(Method::GET, path, health::health);
            }
        }

        let pool = WorkerPool::new(config.workers.count);
        let credentials = Arc::new(CredentialStore::new(config.credentials.path.clone()));

        Self {
            state: AppState {
                config: Arc::new(config),
                registry: Arc::new(registry),
                pool,
                credentials,
            },
        }
    }

    /// The worker pool backing this server.
    pub fn pool(&self) -> &WorkerPool {
        &self.state.pool
    }

    /// Run until `shutdown` fires, then drain and return.
    pub async fn run(self, listener: Listener, mut shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            workers = self.state.pool.capacity(),
            request_timeout_ms = self.state.config.workers.request_timeout_ms,
            routes = self.state.registry.len(),
            "HTTP server starting"
        );

        let mut connections = JoinSet::new();

        loop {
            let mut slot = tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                Some(joined) = connections.join_next() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!(error = %e, "Connection task panicked");
                        }
                    }
                    continue;
                }
                acquired = self.state.pool.acquire() => match acquired {
                    Ok(slot) => slot,
                    Err(PoolError::Closed) => break,
                    Err(e) => return Err(std::io::Error::other(e)),
                },
            };

            let (stream, peer) = tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        drop(slot);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                },
            };

            // Reserved until now; only an accepted connection counts as busy.
            slot.activate();
            connections.spawn(serve_connection(self.state.clone(), stream, peer, slot));
        }

        // Closing the socket makes further connection attempts fail fast.
        drop(listener);
        self.drain(connections).await;
        self.state.pool.close();

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    async fn drain(&self, mut connections: JoinSet<()>) {
        if connections.is_empty() {
            return;
        }

        let grace = self.state.config.graceful_timeout();
        tracing::info!(
            in_flight = connections.len(),
            grace_ms = grace.as_millis() as u64,
            "Draining in-flight requests"
        );

        let drained = tokio::time::timeout(grace, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                remaining = connections.len(),
                "Grace window elapsed; closing remaining connections"
            );
            connections.shutdown().await;
        }
    }
}

/// Serve one connection on `slot`. The slot is released when this returns.
async fn serve_connection(state: AppState, stream: TcpStream, peer: SocketAddr, slot: SlotGuard) {
    let conn = ConnectionInfo::new(peer, slot.id());
    tracing::debug!(connection = %conn.id, peer = %peer, slot = %conn.slot, "Connection accepted");

    let header_timeout = state.config.request_timeout();
    let deadline = Deadline::start(state.config.connection_deadline());

    let service = service_fn(move |req: Request<Incoming>| {
        let state = state.clone();
        async move { Ok::<_, Infallible>(dispatch(&state, conn, req).await) }
    });

    let connection = http1::Builder::new()
        .keep_alive(false)
        .timer(TokioTimer::new())
        .header_read_timeout(header_timeout)
        .serve_connection(TokioIo::new(stream), service);

    match deadline.run(connection).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::debug!(connection = %conn.id, error = %e, "Connection closed with error");
        }
        Err(e) => {
            tracing::warn!(
                connection = %conn.id,
                slot = %conn.slot,
                limit_ms = e.limit.as_millis() as u64,
                "Connection deadline exceeded; closing"
            );
        }
    }

    drop(slot);
    tracing::debug!(connection = %conn.id, elapsed_ms = conn.accepted_at.elapsed().as_millis() as u64, "Connection closed");
}
