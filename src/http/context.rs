//! Server context: the seam between registration and the HTTP router.
//!
//! # Responsibilities
//! - `ServerContext` trait consumed by the registrar
//! - `AxumContext`: registers pipelines on an `axum::Router`
//! - Host error stage that turns `RouteFailure` responses into real replies
//!
//! # Design Decisions
//! - Each pipeline stage becomes a `route_layer`, so 405 fallbacks skip them
//! - Layers are applied innermost-first; the first stage runs first

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::Method,
    middleware::{from_fn, Next},
    response::Response,
    routing::{on, MethodFilter, MethodRouter},
    Router,
};

use crate::error::{AdapterError, RouteError, RouteFailure};
use crate::http::middleware::Middleware;
use crate::http::translator::RouteHandler;

/// Ordered stages ending in the route handler.
pub struct Pipeline {
    pub stages: Vec<Middleware>,
    pub terminal: Arc<RouteHandler>,
}

impl Pipeline {
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(Middleware::name).collect()
    }
}

/// Something routes can be registered on.
pub trait ServerContext {
    fn has_route(&self, method: &Method, path: &str) -> bool;

    fn add_route(&mut self, method: Method, path: &str, pipeline: Pipeline) -> Result<(), AdapterError>;
}

/// Host-provided error stage.
pub type ErrorHandler = Arc<dyn Fn(&RouteError) -> Response + Send + Sync>;

/// `ServerContext` backed by an axum router.
#[derive(Default)]
pub struct AxumContext {
    router: Router,
    registered: HashSet<(Method, String)>,
    error_handler: Option<ErrorHandler>,
}

impl AxumContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing router that already serves `routes`.
    ///
    /// `routes` must list every method and path on `router` (in axum path
    /// syntax) so that overlapping descriptors are rejected at registration.
    pub fn from_router<I, P>(router: Router, routes: I) -> Self
    where
        I: IntoIterator<Item = (Method, P)>,
        P: Into<String>,
    {
        Self {
            router,
            registered: routes
                .into_iter()
                .map(|(method, path)| (method, path.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Install the stage that renders route errors.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RouteError) -> Response + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Method/path pairs known to the context, host routes included.
    pub fn route_count(&self) -> usize {
        self.registered.len()
    }

    /// Finish registration and hand back the router.
    pub fn into_router(self) -> Router {
        match self.error_handler {
            Some(handler) => self.router.layer(from_fn(move |req: Request, next: Next| {
                let handler = handler.clone();
                async move {
                    let response = next.run(req).await;
                    match response.extensions().get::<RouteFailure>().cloned() {
                        Some(failure) => handler(failure.error()),
                        None => response,
                    }
                }
            })),
            None => self.router,
        }
    }
}

impl ServerContext for AxumContext {
    fn has_route(&self, method: &Method, path: &str) -> bool {
        self.registered.contains(&(method.clone(), path.to_string()))
    }

    fn add_route(&mut self, method: Method, path: &str, pipeline: Pipeline) -> Result<(), AdapterError> {
        let filter = MethodFilter::try_from(method.clone()).map_err(|_| AdapterError::UnsupportedMethod {
            method: method.to_string(),
            path: path.to_string(),
        })?;

        let terminal = pipeline.terminal;
        let mut method_router: MethodRouter = on(filter, move |req: Request| {
            let terminal = terminal.clone();
            async move { terminal.handle(req).await }
        });

        for stage in pipeline.stages.into_iter().rev() {
            method_router =
                method_router.route_layer(from_fn(move |req: Request, next: Next| stage.call(req, next)));
        }

        self.router = std::mem::take(&mut self.router).route(path, method_router);
        self.registered.insert((method, path.to_string()));
        Ok(())
    }
}
