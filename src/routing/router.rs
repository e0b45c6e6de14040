//! Handler registry and lookup.
//!
//! # Responsibilities
//! - Store route → handler bindings supplied by the application
//! - Look up a handler by method + path
//! - Return matched handler, explicit not-found, or method-not-allowed
//!
//! # Design Decisions
//! - Immutable after construction (shared across workers without locks)
//! - Most specific pattern wins; method is checked after the path
//! - Explicit NotFound rather than silent default

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::Method;

use super::matcher::PathPattern;
use crate::http::handler::{BoxedHandler, Handler};

/// Result of a registry lookup.
pub enum RouteMatch<'a> {
    /// A handler is bound to this method + path.
    Matched {
        handler: &'a BoxedHandler,
        pattern: &'a PathPattern,
    },
    /// No route covers the path.
    NotFound,
    /// The path is routed, but not for this method.
    MethodNotAllowed { allowed: Vec<Method> },
}

impl std::fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteMatch::Matched { pattern, .. } => {
                f.debug_struct("Matched").field("pattern", pattern).finish()
            }
            RouteMatch::NotFound => f.write_str("NotFound"),
            RouteMatch::MethodNotAllowed { allowed } => f
                .debug_struct("MethodNotAllowed")
                .field("allowed", allowed)
                .finish(),
        }
    }
}

struct Route {
    pattern: PathPattern,
    // Keyed by method name so `Allow` lists come out in a stable order.
    handlers: BTreeMap<String, (Method, BoxedHandler)>,
}

/// Route → handler bindings for one application.
#[derive(Default)]
pub struct HandlerRegistry {
    routes: Vec<Route>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `method` + `path`. A later binding for the same
    /// method and path replaces the earlier one.
    pub fn route<H: Handler>(mut self, method: Method, path: &str, handler: H) -> Self {
        self.insert(method, path, handler);
        self
    }

    pub fn get<H: Handler>(self, path: &str, handler: H) -> Self {
        self.route(Method::GET, path, handler)
    }

    pub fn post<H: Handler>(self, path: &str, handler: H) -> Self {
        self.route(Method::POST, path, handler)
    }

    /// In-place form of [`route`](Self::route).
    pub fn insert<H: Handler>(&mut self, method: Method, path: &str, handler: H) {
        let pattern = PathPattern::parse(path);
        let handler: BoxedHandler = Arc::new(handler);
        let key = method.as_str().to_string();

        if let Some(route) = self.routes.iter_mut().find(|r| r.pattern == pattern) {
            if route.handlers.insert(key, (method.clone(), handler)).is_some() {
                tracing::debug!(method = %method, path = %path, "Replaced existing handler");
            }
            return;
        }

        let mut handlers = BTreeMap::new();
        handlers.insert(key, (method, handler));
        self.routes.push(Route { pattern, handlers });
        // Most specific first, so lookup can stop at the first hit.
        self.routes
            .sort_by(|a, b| b.pattern.specificity().cmp(&a.pattern.specificity()));
    }

    /// Whether any route covers `path` exactly as written.
    pub fn has_path(&self, path: &str) -> bool {
        let pattern = PathPattern::parse(path);
        self.routes.iter().any(|r| r.pattern == pattern)
    }

    /// Number of method + path bindings.
    pub fn len(&self) -> usize {
        self.routes.iter().map(|r| r.handlers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the handler for a request.
    pub fn lookup(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        let Some(route) = self.routes.iter().find(|r| r.pattern.matches(path)) else {
            return RouteMatch::NotFound;
        };

        match route.handlers.get(method.as_str()) {
            Some((_, handler)) => RouteMatch::Matched {
                handler,
                pattern: &route.pattern,
            },
            None => RouteMatch::MethodNotAllowed {
                allowed: route.handlers.values().map(|(m, _)| m.clone()).collect(),
            },
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for route in &self.routes {
            for method in route.handlers.keys() {
                list.entry(&format_args!("{} {}", method, route.pattern));
            }
        }
        list.finish()
    }
}
