//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     RouteDescriptor[]
//!     → registrar.rs (resolve middleware, normalize methods)
//!     → mode.rs (open / secure / auth)
//!     → path.rs (descriptor path → server path)
//!     → Pipeline per method, added to the ServerContext
//! ```
//!
//! # Design Decisions
//! - Routes are classified once; nothing is re-evaluated per request
//! - Misconfiguration fails registration before any traffic flows
//! - One bad descriptor aborts the whole batch

pub mod descriptor;
pub mod mode;
pub mod path;
pub mod registrar;

pub use descriptor::{AuthConfig, MiddlewareRef, RouteDescriptor, SecureConfig};
pub use mode::HandlingMode;
pub use registrar::{AdapterOptions, Registration, RouteAdapter, DEFAULT_BODY_LIMIT};
