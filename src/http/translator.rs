//! Terminal route handler: HTTP request → dispatched message → HTTP response.
//!
//! # Data Flow
//! ```text
//! Request (survived the pipeline)
//!     → body acquisition (read + parse, or upstream ParsedBody)
//!     → Message { request, response, args }
//!     → Dispatcher::dispatch(route.pattern, message)
//!     → Reply::shape → redirect | JSON auto-reply | action's own response
//! ```
//!
//! # Design Decisions
//! - One sequential async path with a single `Result` channel; the first error wins
//! - Exactly one terminating outcome per request
//! - A response already sent through the handle is never overwritten

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::Request,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::dispatch::{Dispatcher, Message, MessageArgs};
use crate::error::RouteError;
use crate::http::request::{
    parse_query, path_params, read_body, AuthenticatedUser, ParsedBody, RequestHandle,
};
use crate::http::response::{json_reply, redirect, ResponseHandle};
use crate::observability::metrics;
use crate::routing::RouteDescriptor;

/// Where the route handler gets the request body from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySource {
    /// Read and parse the raw body, up to `limit` bytes.
    Read { limit: usize },
    /// Use the `ParsedBody` an upstream stage attached, else `{}`.
    Upstream,
}

/// How a successful dispatch is turned into a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Redirect(String),
    Auto(Value),
    Manual,
}

impl Reply {
    /// `redirect` beats `autoreply`; with neither, the action answers itself.
    pub fn shape(route: &RouteDescriptor, result: Value) -> Self {
        if let Some(target) = &route.redirect {
            Reply::Redirect(target.clone())
        } else if route.autoreply {
            Reply::Auto(result)
        } else {
            Reply::Manual
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Reply::Redirect(_) => "redirect",
            Reply::Auto(_) => "autoreply",
            Reply::Manual => "manual",
        }
    }
}

/// The last stage of every route pipeline.
pub struct RouteHandler {
    route: Arc<RouteDescriptor>,
    dispatcher: Arc<dyn Dispatcher>,
    body: BodySource,
}

impl RouteHandler {
    pub fn new(route: Arc<RouteDescriptor>, dispatcher: Arc<dyn Dispatcher>, body: BodySource) -> Self {
        Self {
            route,
            dispatcher,
            body,
        }
    }

    pub fn route(&self) -> &Arc<RouteDescriptor> {
        &self.route
    }

    /// Run the translation. Errors become responses carrying a `RouteFailure`.
    pub async fn handle(&self, request: Request) -> Response {
        match self.translate(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    pattern = %self.route.pattern,
                    path = %self.route.path,
                    error = %e,
                    "Route failed"
                );
                e.into_response()
            }
        }
    }

    async fn translate(&self, request: Request) -> Result<Response, RouteError> {
        let (mut parts, body) = request.into_parts();
        let body = self.acquire_body(&parts, body).await?;

        let params = path_params(&mut parts).await;
        let query = parse_query(parts.uri.query());
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .map(|user| user.0.clone());

        let response = ResponseHandle::new();
        let message = Message {
            request: RequestHandle::new(parts),
            response: response.clone(),
            args: MessageArgs {
                body,
                route: self.route.clone(),
                params,
                query,
                user,
            },
        };

        tracing::debug!(pattern = %self.route.pattern, path = %self.route.path, "Dispatching");
        let started = Instant::now();
        let result = self.dispatcher.dispatch(&self.route.pattern, message).await;

        let value = match result {
            Ok(value) => value,
            Err(e) => {
                metrics::record_dispatch(&self.route.pattern, "error", started);
                return Err(e.into());
            }
        };

        let reply = Reply::shape(&self.route, value);
        metrics::record_dispatch(&self.route.pattern, reply.label(), started);

        if let Some(sent) = response.take_sent() {
            if reply != Reply::Manual {
                tracing::warn!(
                    pattern = %self.route.pattern,
                    skipped = reply.label(),
                    "Action already sent a response"
                );
            }
            return Ok(sent);
        }

        Ok(match reply {
            Reply::Redirect(target) => response.finish_redirect(redirect(&target)),
            Reply::Auto(value) => response.finish(json_reply(value)),
            Reply::Manual => {
                tracing::warn!(
                    pattern = %self.route.pattern,
                    "Action sent no response and route has no autoreply"
                );
                response.finish(StatusCode::OK.into_response())
            }
        })
    }

    async fn acquire_body(&self, parts: &Parts, body: Body) -> Result<Value, RouteError> {
        match self.body {
            BodySource::Read { limit } => {
                let content_type = parts
                    .headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok());
                read_body(body, content_type, limit).await
            }
            BodySource::Upstream => Ok(parts
                .extensions
                .get::<ParsedBody>()
                .map(|parsed| parsed.0.clone())
                .unwrap_or_else(|| Value::Object(Default::default()))),
        }
    }
}
