//! The payload handed to the dispatcher for each request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::request::RequestHandle;
use crate::http::response::ResponseHandle;
use crate::routing::RouteDescriptor;

/// One dispatched message per inbound request.
///
/// `request` and `response` borrow the live transaction for the duration of
/// the dispatch and are never serialized, so anything that moves a message
/// across a process boundary only sees `args`.
#[derive(Debug, Serialize)]
pub struct Message {
    #[serde(skip)]
    pub request: RequestHandle,

    #[serde(skip)]
    pub response: ResponseHandle,

    pub args: MessageArgs,
}

/// Request data exposed to actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageArgs {
    pub body: Value,
    pub route: Arc<RouteDescriptor>,
    pub params: Map<String, Value>,
    pub query: Map<String, Value>,
    pub user: Option<Value>,
}

impl Message {
    /// Serialized form suitable for transport. Handles are stripped.
    pub fn to_transport(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
