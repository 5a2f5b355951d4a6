//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the registered routes with host layers (tracing, timeouts, body limit, request ID)
//! - Bind server to listener
//! - Graceful shutdown on the lifecycle signal

use std::time::Duration;

use axum::{http::HeaderName, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AdapterConfig;
use crate::http::context::AxumContext;

pub const X_REQUEST_ID: &str = "x-request-id";

/// HTTP server hosting the registered routes.
pub struct HttpServer {
    router: Router,
    config: AdapterConfig,
}

impl HttpServer {
    /// Build the server from a populated context.
    pub fn new(config: AdapterConfig, context: AxumContext) -> Self {
        let router = Self::build_router(&config, context.into_router());
        Self { router, config }
    }

    /// Apply host layers. The last layer added runs first.
    #[allow(deprecated)]
    fn build_router(config: &AdapterConfig, routes: Router) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        routes
            .layer(RequestBodyLimitLayer::new(config.options.body_limit))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
    }

    /// The fully layered router, e.g. for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }
}
