//! Route middleware.
//!
//! # Responsibilities
//! - Type-erased middleware callable (`Middleware`)
//! - Name → middleware registry used by descriptors
//! - Upstream JSON body parser
//!
//! A middleware receives the request and the rest of the pipeline. It either
//! calls `next.run(req)` to continue or returns its own response, which ends
//! the pipeline.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::error::AdapterError;
use crate::http::request::ParsedBody;
use crate::routing::MiddlewareRef;

type MiddlewareFn = dyn Fn(Request, Next) -> BoxFuture<'static, Response> + Send + Sync;

/// A named, cloneable middleware stage.
#[derive(Clone)]
pub struct Middleware {
    name: Arc<str>,
    f: Arc<MiddlewareFn>,
}

impl Middleware {
    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            f: Arc::new(move |req, next| f(req, next).boxed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, req: Request, next: Next) -> BoxFuture<'static, Response> {
        (self.f)(req, next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Middleware").field(&self.name).finish()
    }
}

/// Middleware available to descriptors by name. Read-only after setup.
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    entries: HashMap<String, Middleware>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a middleware under `name`, builder style.
    pub fn with<F, Fut>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.insert(name, Middleware::from_fn(name, f));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, middleware: Middleware) {
        self.entries.insert(name.into(), middleware);
    }

    pub fn get(&self, name: &str) -> Option<&Middleware> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Turn a descriptor reference into a callable.
    pub fn resolve(&self, reference: &MiddlewareRef) -> Result<Middleware, AdapterError> {
        match reference {
            MiddlewareRef::Named(name) => self
                .entries
                .get(name)
                .cloned()
                .ok_or_else(|| AdapterError::InvalidMiddleware(name.clone())),
            MiddlewareRef::Direct(middleware) => Ok(middleware.clone()),
        }
    }
}

/// Parses `application/json` bodies and attaches them as [`ParsedBody`].
///
/// The raw bytes are put back on the request so later stages can still read
/// them. Malformed JSON ends the request with `400 Bad Request`.
pub fn json_body_parser(limit: usize) -> Middleware {
    Middleware::from_fn("json", move |req: Request, next: Next| async move {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);

        if !is_json {
            return next.run(req).await;
        }

        let (mut parts, body) = req.into_parts();
        let bytes = match axum::body::to_bytes(body, limit).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read JSON body");
                return StatusCode::PAYLOAD_TOO_LARGE.into_response();
            }
        };

        let value = if bytes.is_empty() {
            Value::Object(Default::default())
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!(error = %e, "Rejected malformed JSON body");
                    return (StatusCode::BAD_REQUEST, "Malformed JSON body").into_response();
                }
            }
        };

        parts.extensions.insert(ParsedBody(value));
        next.run(Request::from_parts(parts, Body::from(bytes))).await
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_named_and_direct() {
        let registry = MiddlewareRegistry::new().with("head", |req, next| async move {
            next.run(req).await
        });

        let named = registry.resolve(&MiddlewareRef::from("head")).unwrap();
        assert_eq!(named.name(), "head");

        let direct = Middleware::from_fn("inline", |req, next| async move { next.run(req).await });
        let resolved = registry.resolve(&MiddlewareRef::from(direct)).unwrap();
        assert_eq!(resolved.name(), "inline");
    }

    #[test]
    fn test_resolve_unknown_name() {
        let registry = MiddlewareRegistry::new();
        let err = registry
            .resolve(&MiddlewareRef::from("not-a-function-key"))
            .unwrap_err();
        assert_eq!(err.to_string(), "expected valid middleware, got not-a-function-key");
    }
}
