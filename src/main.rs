//! Route adapter server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ host layers ──▶ route pipeline ──────────────▶ RouteHandler
//!                      (request id,    [auth step | middleware |       (body → Message)
//!                       trace,          session guard]                      │
//!                       timeout)                                           ▼
//!                                                                    Dispatcher
//!     Client Response                                                      │
//!     ◀─────────────── redirect / JSON / action's own response ◀──────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use route_adapter::config::{load_config, AdapterConfig};
use route_adapter::dispatch::ActionRegistry;
use route_adapter::http::{json_body_parser, AxumContext, MiddlewareRegistry};
use route_adapter::lifecycle::{build_server, wait_for_signal, Shutdown};
use route_adapter::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "route-adapter")]
#[command(about = "Serve declarative routes backed by an action dispatcher")]
#[command(long_about = "Serve declarative routes backed by an action dispatcher.\n\n\
The binary ships the role:system ping and echo actions and no auth provider: \
routes declaring `auth` are rejected at startup. `secure` routes need a session \
layer in front of the adapter and otherwise always redirect.")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Actions available to configured routes.
fn builtin_actions() -> ActionRegistry {
    let actions = ActionRegistry::new();
    actions.add("role:system,cmd:ping", |_msg| async { Ok(json!({"res": "pong"})) });
    actions.add("role:system,cmd:echo", |msg| async move {
        Ok(json!({
            "body": msg.args.body,
            "params": msg.args.params,
            "query": msg.args.query,
        }))
    });
    actions
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AdapterConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("route-adapter v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        parse_body = config.options.parse_body,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut middleware = MiddlewareRegistry::new();
    middleware.insert("json", json_body_parser(config.options.body_limit));

    let bind_address = config.listener.bind_address.clone();
    let server = build_server(
        config,
        AxumContext::new(),
        Arc::new(builtin_actions()),
        middleware,
        None,
    )?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
