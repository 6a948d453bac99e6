//! Route table and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Find the first route whose method and path both match
//! - Invoke its handler with params, query and body
//! - Fall back to an empty 404 when nothing matches
//!
//! # Design Decisions
//! - Immutable after startup (shared via Arc, no locks)
//! - Handlers borrow state mutably; the caller decides how it is guarded
//! - O(n) scan over routes (route counts are tiny)
//! - Dispatch does no body/query validation; handlers own that

use std::collections::HashMap;

use axum::http::{Method, StatusCode};
use serde_json::Value;

use crate::routing::matcher::{Params, PathPattern, PatternError};

/// Everything a handler receives about the request.
#[derive(Debug, Clone, Default)]
pub struct RouteRequest {
    /// Named parameters captured from the path.
    pub params: Params,
    /// Decoded query string pairs (last value wins).
    pub query: HashMap<String, String>,
    /// Parsed JSON body; `Value::Null` when absent.
    pub body: Value,
}

impl RouteRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// Transport-independent response produced by handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl Response {
    /// Response with a status and no body.
    pub fn empty(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    /// Response with a JSON body.
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    pub fn not_found() -> Self {
        Self::empty(StatusCode::NOT_FOUND)
    }
}

/// A request handler operating on exclusively borrowed state `S`.
pub trait Handler<S, E>: Send + Sync {
    fn call(&self, state: &mut S, request: RouteRequest) -> Result<Response, E>;
}

impl<S, E, F> Handler<S, E> for F
where
    F: Fn(&mut S, RouteRequest) -> Result<Response, E> + Send + Sync,
{
    fn call(&self, state: &mut S, request: RouteRequest) -> Result<Response, E> {
        self(state, request)
    }
}

struct Route<S, E> {
    method: Method,
    pattern: PathPattern,
    handler: Box<dyn Handler<S, E>>,
}

/// Ordered route table. First match wins.
pub struct Router<S, E> {
    routes: Vec<Route<S, E>>,
}

impl<S, E> Default for Router<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E> std::fmt::Debug for Router<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                self.routes
                    .iter()
                    .map(|r| format!("{} {}", r.method, r.pattern.as_str())),
            )
            .finish()
    }
}

impl<S, E> Router<S, E> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Append a route. Fails if the pattern does not compile.
    pub fn register<H>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, PatternError>
    where
        H: Handler<S, E> + 'static,
    {
        let pattern = PathPattern::compile(pattern)?;
        tracing::debug!(method = %method, pattern = %pattern.as_str(), "Route registered");
        self.routes.push(Route {
            method,
            pattern,
            handler: Box::new(handler),
        });
        Ok(self)
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the first route matching `method` and `path`.
    /// Returns the route's pattern text and captured params.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<(&str, Params)> {
        self.find(method, path)
            .map(|(route, params)| (route.pattern.as_str(), params))
    }

    fn find(&self, method: &Method, path: &str) -> Option<(&Route<S, E>, Params)> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| route.pattern.match_path(path).map(|params| (route, params)))
    }

    /// Dispatch a request to the first matching handler, or 404.
    /// Handler errors are returned untouched.
    pub fn dispatch(
        &self,
        state: &mut S,
        method: &Method,
        path: &str,
        query: HashMap<String, String>,
        body: Value,
    ) -> Result<Response, E> {
        match self.find(method, path) {
            Some((route, params)) => {
                tracing::debug!(
                    method = %method,
                    path = %path,
                    route = %route.pattern.as_str(),
                    "Route matched"
                );
                route.handler.call(state, RouteRequest { params, query, body })
            }
            None => {
                tracing::debug!(method = %method, path = %path, "No route matched");
                Ok(Response::not_found())
            }
        }
    }
}
