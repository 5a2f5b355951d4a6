//! Message dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! translator builds Message { request, response, args }
//!     → Dispatcher::dispatch(pattern, message)
//!     → registered action runs (may use the response handle)
//!     → Result<Value, DispatchError> back to the translator
//! ```
//!
//! # Design Decisions
//! - The dispatcher is a trait seam; the adapter never inspects patterns itself
//! - `ActionRegistry` is a minimal exact-match implementation for hosts and tests
//! - Dispatch errors are passed through untouched

pub mod message;
pub mod registry;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub use message::{Message, MessageArgs};
pub use registry::{canonical_pattern, ActionRegistry};

/// Errors produced by a dispatcher.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// No action is registered for the pattern.
    #[error("no action registered for pattern '{0}'")]
    NoHandler(String),

    /// The action ran and replied with an error.
    #[error("{message}")]
    Failed {
        message: String,
        /// Optional HTTP status hint supplied by the action.
        status: Option<StatusCode>,
    },
}

impl DispatchError {
    pub fn failed(message: impl Into<String>) -> Self {
        DispatchError::Failed {
            message: message.into(),
            status: None,
        }
    }

    pub fn failed_with_status(message: impl Into<String>, status: StatusCode) -> Self {
        DispatchError::Failed {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Status hint attached by the action, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DispatchError::NoHandler(_) => None,
            DispatchError::Failed { status, .. } => *status,
        }
    }
}

/// Sends a message to whatever action is registered for `pattern`.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, pattern: &str, message: Message) -> Result<Value, DispatchError>;
}
