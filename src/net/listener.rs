//! TCP listener.
//!
//! # Responsibilities
//! - Bind to the wildcard interface on the configured port
//! - Apply the configured listen backlog
//! - Accept incoming TCP connections
//!
//! # Design Decisions
//! - Bind failures are fatal and carry the address for the operator
//! - Admission control lives in the worker pool, not here: the accept loop
//!   only calls `accept` once a slot is free

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::config::ListenerConfig;

/// Error type for binding the listener.
#[derive(Debug)]
pub enum BindError {
    /// Failed to create the socket.
    Socket(std::io::Error),
    /// Failed to bind or listen on the address (port in use, no permission).
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindError::Socket(e) => write!(f, "Failed to create socket: {}", e),
            BindError::Bind { addr, source } => write!(f, "Failed to bind {}: {}", addr, source),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BindError::Socket(e) => Some(e),
            BindError::Bind { source, .. } => Some(source),
        }
    }
}

/// The single listening socket shared by all workers.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind `0.0.0.0:<port>`.
    pub fn bind(config: &ListenerConfig) -> Result<Self, BindError> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
        let bind_err = |source| BindError::Bind { addr, source };

        let socket = TcpSocket::new_v4().map_err(BindError::Socket)?;
        // Allows quick restarts over TIME_WAIT; a live listener on the same
        // port still makes bind fail.
        #[cfg(unix)]
        socket.set_reuseaddr(true).map_err(BindError::Socket)?;
        socket.bind(addr).map_err(bind_err)?;
        let inner = socket.listen(config.backlog).map_err(bind_err)?;

        let local_addr = inner.local_addr().map_err(bind_err)?;
        tracing::info!(
            address = %local_addr,
            backlog = config.backlog,
            "Listener bound"
        );

        Ok(Self { inner })
    }

    /// Accept the next connection from the backlog.
    pub async fn accept(&self) -> std::io::Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = self.inner.accept().await?;
        stream.set_nodelay(true)?;
        Ok((stream, peer))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_wildcard_on_ephemeral_port() {
        let listener = Listener::bind(&ListenerConfig { port: 0, backlog: 16 }).unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.ip().is_unspecified());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn port_in_use_is_bind_error() {
        let first = Listener::bind(&ListenerConfig { port: 0, backlog: 16 }).unwrap();
        let port = first.local_addr().unwrap().port();

        let err = Listener::bind(&ListenerConfig { port, backlog: 16 }).unwrap_err();
        assert!(matches!(err, BindError::Bind { .. }));
        assert!(err.to_string().contains(&port.to_string()));
    }

    #[tokio::test]
    async fn accepts_connections() {
        let listener = Listener::bind(&ListenerConfig { port: 0, backlog: 16 }).unwrap();
        let port = listener.local_addr().unwrap().port();

        let client = tokio::spawn(async move { TcpStream::connect(("127.0.0.1", port)).await });
        let (_stream, peer) = listener.accept().await.unwrap();
        assert!(peer.ip().is_loopback());
        client.await.unwrap().unwrap();
    }
}
