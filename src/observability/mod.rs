//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! registrar / translator / auth gates produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout log lines
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is set by the host layers and appears in trace spans
//! - Metrics are cheap and silently disabled without a recorder

pub mod logging;
pub mod metrics;
