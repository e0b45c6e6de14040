//! Application catalogue.
//!
//! The entry point named by `APP_MODULE` is resolved here to a
//! [`HandlerRegistry`]. Unknown names are a startup error.

pub mod diagnostics;

use crate::routing::HandlerRegistry;

/// Names accepted by [`registry_for`].
pub const APPLICATIONS: &[&str] = &[diagnostics::NAME];

/// Build the registry for the named application.
pub fn registry_for(name: &str) -> Option<HandlerRegistry> {
    match name {
        diagnostics::NAME => Some(diagnostics::registry()),
        _ => None,
    }
}
