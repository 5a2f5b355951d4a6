//! Route registration adapter.
//!
//! Wires declarative route descriptors onto an axum router and translates
//! each request into a single message for an action dispatcher, then turns
//! the reply back into a redirect or JSON response.

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::AdapterConfig;
pub use dispatch::{ActionRegistry, Dispatcher, Message};
pub use error::{AdapterError, RouteError};
pub use http::{AxumContext, HttpServer};
pub use lifecycle::Shutdown;
pub use routing::{AdapterOptions, RouteAdapter, RouteDescriptor};
