//! Route registration.
//!
//! # Responsibilities
//! - Resolve middleware references against the registry
//! - Classify each route and assemble its pipeline
//! - Register one pipeline per route per method on the server context
//!
//! # Design Decisions
//! - The whole batch is planned and checked before the first route is added,
//!   so a bad descriptor never leaves a half-populated route table
//! - Auth steps are built once per route and shared by all of its methods

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::Method;
use axum::routing::MethodFilter;

use crate::auth::{session_guard, AuthProvider, AuthRedirects};
use crate::config::OptionsConfig;
use crate::dispatch::Dispatcher;
use crate::error::AdapterError;
use crate::http::context::{Pipeline, ServerContext};
use crate::http::middleware::{Middleware, MiddlewareRegistry};
use crate::http::translator::{BodySource, RouteHandler};
use crate::observability::metrics;
use crate::routing::descriptor::RouteDescriptor;
use crate::routing::mode::HandlingMode;
use crate::routing::path::to_server_path;

/// Default cap on bodies read by the adapter (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Global adapter options.
#[derive(Clone)]
pub struct AdapterOptions {
    /// Named middleware available to descriptors.
    pub middleware: MiddlewareRegistry,

    /// Read and parse the body in the route handler, ignoring upstream parsers.
    pub parse_body: bool,

    /// Maximum body size read by the route handler.
    pub body_limit: usize,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            middleware: MiddlewareRegistry::new(),
            parse_body: true,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl AdapterOptions {
    pub fn from_config(config: &OptionsConfig, middleware: MiddlewareRegistry) -> Self {
        Self {
            middleware,
            parse_body: config.parse_body,
            body_limit: config.body_limit,
        }
    }
}

/// Result of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub routes: Vec<Arc<RouteDescriptor>>,
}

/// A pipeline ready to be added to the context.
struct PlannedRoute {
    method: Method,
    path: String,
    mode: HandlingMode,
    pipeline: Pipeline,
}

/// Wires route descriptors onto a server context.
pub struct RouteAdapter {
    dispatcher: Arc<dyn Dispatcher>,
    options: AdapterOptions,
}

impl RouteAdapter {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, options: AdapterOptions) -> Self {
        Self {
            dispatcher,
            options,
        }
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// Register every route on `context`.
    ///
    /// Fails without touching the context if any descriptor is invalid.
    pub fn register<C>(
        &self,
        context: Option<&mut C>,
        auth: Option<&dyn AuthProvider>,
        routes: Vec<RouteDescriptor>,
    ) -> Result<Registration, AdapterError>
    where
        C: ServerContext + ?Sized,
    {
        let context = context.ok_or(AdapterError::MissingContext)?;

        let mut planned = Vec::new();
        let mut seen = HashSet::new();
        let mut registered = Vec::with_capacity(routes.len());

        for route in routes {
            let route = Arc::new(route);
            for entry in self.plan(&route, auth)? {
                if !seen.insert((entry.method.clone(), entry.path.clone()))
                    || context.has_route(&entry.method, &entry.path)
                {
                    return Err(AdapterError::DuplicateRoute {
                        method: entry.method.to_string(),
                        path: route.path.clone(),
                    });
                }
                planned.push(entry);
            }
            registered.push(route);
        }

        for entry in planned {
            tracing::info!(
                method = %entry.method,
                path = %entry.path,
                mode = entry.mode.label(),
                pattern = %entry.pipeline.terminal.route().pattern,
                stages = entry.pipeline.stages.len(),
                "Registering route"
            );
            metrics::record_registration(entry.mode.label());
            context.add_route(entry.method, &entry.path, entry.pipeline)?;
        }

        Ok(Registration { routes: registered })
    }

    fn plan(
        &self,
        route: &Arc<RouteDescriptor>,
        auth: Option<&dyn AuthProvider>,
    ) -> Result<Vec<PlannedRoute>, AdapterError> {
        let middleware = route
            .middleware
            .iter()
            .map(|reference| self.options.middleware.resolve(reference))
            .collect::<Result<Vec<_>, _>>()?;

        let methods = normalize_methods(route)?;
        let path = to_server_path(&route.path)?;
        let mode = HandlingMode::classify(route);

        if methods.is_empty() {
            tracing::warn!(path = %route.path, pattern = %route.pattern, "Route declares no methods");
        }

        let auth_step = match &mode {
            HandlingMode::DelegatedAuth(config) => {
                let provider = auth.ok_or_else(|| AdapterError::MissingAuthProvider {
                    path: route.path.clone(),
                    strategy: config.strategy.clone(),
                })?;
                let redirects = AuthRedirects {
                    success_redirect: Some(config.pass.clone()),
                    failure_redirect: Some(config.fail.clone()),
                };
                Some(provider.authenticate(&config.strategy, redirects)?)
            }
            _ => None,
        };

        let terminal = Arc::new(RouteHandler::new(
            route.clone(),
            self.dispatcher.clone(),
            self.body_source(),
        ));

        Ok(methods
            .into_iter()
            .map(|method| PlannedRoute {
                method,
                path: path.clone(),
                pipeline: build_pipeline(&mode, auth_step.clone(), &middleware, terminal.clone()),
                mode: mode.clone(),
            })
            .collect())
    }

    fn body_source(&self) -> BodySource {
        if self.options.parse_body {
            BodySource::Read {
                limit: self.options.body_limit,
            }
        } else {
            BodySource::Upstream
        }
    }
}

/// Assemble the ordered stages for one route.
pub fn build_pipeline(
    mode: &HandlingMode,
    auth_step: Option<Middleware>,
    middleware: &[Middleware],
    terminal: Arc<RouteHandler>,
) -> Pipeline {
    let mut stages = Vec::with_capacity(middleware.len() + 1);

    match mode {
        HandlingMode::Open => stages.extend_from_slice(middleware),
        HandlingMode::SessionGated { fail } => {
            stages.extend_from_slice(middleware);
            stages.push(session_guard(fail.clone()));
        }
        HandlingMode::DelegatedAuth(_) => {
            stages.extend(auth_step);
            stages.extend_from_slice(middleware);
        }
    }

    Pipeline { stages, terminal }
}

/// Uppercase, parse and dedupe the declared verbs.
fn normalize_methods(route: &RouteDescriptor) -> Result<Vec<Method>, AdapterError> {
    let mut methods: Vec<Method> = Vec::with_capacity(route.methods.len());

    for raw in &route.methods {
        let unsupported = || AdapterError::UnsupportedMethod {
            method: raw.clone(),
            path: route.path.clone(),
        };
        let method = Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| unsupported())?;
        MethodFilter::try_from(method.clone()).map_err(|_| unsupported())?;

        if !methods.contains(&method) {
            methods.push(method);
        }
    }

    Ok(methods)
}
