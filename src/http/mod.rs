//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Slot acquired, connection accepted
//!     → server.rs (hyper HTTP/1.1, one request per connection)
//!     → dispatch.rs (request ID, route lookup, deadline, panic capture)
//!     → handler.rs (application code via the Handler trait)
//!     → response.rs (error bodies, outcome classification)
//!     → Send to client, close connection, free slot
//! ```

pub mod dispatch;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use handler::{BoxedHandler, Handler, HandlerError, HandlerFuture, HandlerResult};
pub use request::{AppRequest, RequestContext, RequestId, X_REQUEST_ID, X_WORKER_SLOT};
pub use response::Outcome;
pub use server::HttpServer;
