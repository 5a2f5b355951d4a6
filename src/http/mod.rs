//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (host layers: request ID, trace, timeout, body limit)
//!     → context.rs (axum router built from registered pipelines)
//!     → middleware.rs stages (named/direct middleware, auth gates)
//!     → translator.rs (body → Message → dispatch → reply)
//!     → response.rs (redirect / JSON / action's own response)
//!     → Send to client
//! ```

pub mod context;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod translator;

pub use context::{AxumContext, Pipeline, ServerContext};
pub use middleware::{json_body_parser, Middleware, MiddlewareRegistry};
pub use request::{AuthenticatedUser, ParsedBody, RequestHandle};
pub use response::ResponseHandle;
pub use server::{HttpServer, X_REQUEST_ID};
pub use translator::{BodySource, Reply, RouteHandler};
