//! Error types shared across the adapter.
//!
//! # Design Decisions
//! - Setup problems (`AdapterError`) are returned from registration and abort startup
//! - Per-request problems (`RouteError`) travel through the response to the host's error stage
//! - The adapter never renders an error body itself

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::dispatch::DispatchError;

/// Configuration errors raised while registering routes.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// `register` was called without a server context.
    #[error("no context provided")]
    MissingContext,

    /// A middleware reference did not resolve to a callable.
    #[error("expected valid middleware, got {0}")]
    InvalidMiddleware(String),

    /// The route declares an HTTP verb the server cannot register.
    #[error("unsupported method '{method}' on route {path}")]
    UnsupportedMethod { method: String, path: String },

    /// The route path cannot be expressed as a server route.
    #[error("invalid route path '{0}'")]
    InvalidPath(String),

    /// The route uses delegated auth but no provider was supplied.
    #[error("route {path} uses auth strategy '{strategy}' but no auth provider was supplied")]
    MissingAuthProvider { path: String, strategy: String },

    /// The auth provider does not know the requested strategy.
    #[error("unknown authentication strategy '{0}'")]
    UnknownStrategy(String),

    /// The same method and path would be registered twice.
    #[error("route {method} {path} is already registered")]
    DuplicateRoute { method: String, path: String },
}

/// Errors surfaced while translating a single request.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The request body could not be read.
    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    /// The dispatcher failed or the handler replied with an error.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The delegated auth strategy errored (as opposed to rejecting).
    #[error("authentication error: {0}")]
    Auth(String),
}

impl RouteError {
    /// Status used when no host error stage rewrites the response.
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::Dispatch(e) => e.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Response extension carrying the error that ended a request.
#[derive(Debug, Clone)]
pub struct RouteFailure(pub Arc<RouteError>);

impl RouteFailure {
    pub fn error(&self) -> &RouteError {
        &self.0
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response
            .extensions_mut()
            .insert(RouteFailure(Arc::new(self)));
        response
    }
}
