//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{header, Method},
    middleware::{from_fn, Next},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use route_adapter::auth::AuthProvider;
use route_adapter::dispatch::ActionRegistry;
use route_adapter::http::{AuthenticatedUser, AxumContext};
use route_adapter::routing::{AdapterOptions, RouteAdapter, RouteDescriptor};
use route_adapter::AdapterError;

/// Header the fake session layer reads the logged-in user from.
pub const SESSION_HEADER: &str = "x-session-user";

/// Register `routes` on a fresh context and return the router.
pub fn app(
    routes: Vec<RouteDescriptor>,
    actions: &ActionRegistry,
    options: AdapterOptions,
    auth: Option<&dyn AuthProvider>,
) -> Result<Router, AdapterError> {
    app_with_context(AxumContext::new(), routes, actions, options, auth)
}

pub fn app_with_context(
    mut context: AxumContext,
    routes: Vec<RouteDescriptor>,
    actions: &ActionRegistry,
    options: AdapterOptions,
    auth: Option<&dyn AuthProvider>,
) -> Result<Router, AdapterError> {
    let adapter = RouteAdapter::new(Arc::new(actions.clone()), options);
    adapter.register(Some(&mut context), auth, routes)?;
    Ok(context.into_router())
}

/// Stand-in for a host session layer: `x-session-user: <json>` logs a user in.
pub fn with_session(router: Router) -> Router {
    router.layer(from_fn(|mut req: Request, next: Next| async move {
        let user = req
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| serde_json::from_str::<Value>(v).ok());
        if let Some(user) = user {
            req.extensions_mut().insert(AuthenticatedUser(user));
        }
        next.run(req).await
    }))
}

pub async fn send(router: &Router, request: Request) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

pub fn request(method: Method, uri: &str) -> Request {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
