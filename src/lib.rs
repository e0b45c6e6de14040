//! slotd: worker-pool HTTP serving core.
//!
//! Binds one port, admits at most `workers.count` requests at a time, bounds
//! each by a deadline, and drains cleanly on shutdown. Applications plug in
//! as a [`HandlerRegistry`](routing::HandlerRegistry).

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod routing;
pub mod workers;

// Application-facing
pub mod app;
pub mod credentials;
pub mod health;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::ServerConfig;
pub use http::{AppRequest, HandlerError, HandlerResult, HttpServer};
pub use lifecycle::{Shutdown, ShutdownSignal, StartupError};
pub use routing::HandlerRegistry;
