//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (registry lookup)
//!     → matcher.rs (evaluate path patterns)
//!     → Return: Matched handler | NotFound | MethodNotAllowed
//!
//! Registry construction (at startup):
//!     application builds HandlerRegistry
//!     → server adds the health route
//!     → Freeze behind Arc, shared by all workers
//! ```
//!
//! # Design Decisions
//! - Routes fixed at startup, immutable at runtime
//! - No regex in hot path (exact and prefix matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use matcher::PathPattern;
pub use router::{HandlerRegistry, RouteMatch};
