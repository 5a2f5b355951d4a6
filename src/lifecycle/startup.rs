//! Startup orchestration.

use std::sync::Arc;

use crate::auth::AuthProvider;
use crate::config::AdapterConfig;
use crate::dispatch::Dispatcher;
use crate::error::AdapterError;
use crate::http::{AxumContext, HttpServer, MiddlewareRegistry};
use crate::routing::{AdapterOptions, RouteAdapter};

/// Register the configured routes on `context` and wrap it in a server.
///
/// Nothing is bound here; a registration error means no server at all.
pub fn build_server(
    config: AdapterConfig,
    mut context: AxumContext,
    dispatcher: Arc<dyn Dispatcher>,
    middleware: MiddlewareRegistry,
    auth: Option<&dyn AuthProvider>,
) -> Result<HttpServer, AdapterError> {
    let options = AdapterOptions::from_config(&config.options, middleware);
    let adapter = RouteAdapter::new(dispatcher, options);

    let registration = adapter.register(Some(&mut context), auth, config.routes.clone())?;
    tracing::info!(
        routes = registration.routes.len(),
        pipelines = context.route_count(),
        "Routes registered"
    );

    Ok(HttpServer::new(config, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ActionRegistry;
    use crate::routing::RouteDescriptor;

    fn config(route: RouteDescriptor) -> AdapterConfig {
        let mut config = AdapterConfig::default();
        config.routes.push(route);
        config
    }

    #[test]
    fn test_auth_route_without_provider_fails_startup() {
        let route = RouteDescriptor::new("/login", "cmd:login")
            .with_method("POST")
            .with_auth("local", "/profile", "/");

        let err = build_server(
            config(route),
            AxumContext::new(),
            Arc::new(ActionRegistry::new()),
            MiddlewareRegistry::new(),
            None,
        )
        .err()
        .unwrap();

        assert!(matches!(
            err,
            AdapterError::MissingAuthProvider { ref path, ref strategy }
                if path == "/login" && strategy == "local"
        ));
    }

    #[test]
    fn test_open_routes_build() {
        let route = RouteDescriptor::new("/ping", "cmd:ping").with_method("GET");

        let server = build_server(
            config(route),
            AxumContext::new(),
            Arc::new(ActionRegistry::new()),
            MiddlewareRegistry::new(),
            None,
        );
        assert!(server.is_ok());
    }
}
