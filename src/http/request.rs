//! Request-side helpers for the route handler.
//!
//! # Responsibilities
//! - Request extensions shared with upstream layers (`ParsedBody`, `AuthenticatedUser`)
//! - Non-owning request handle exposed to actions
//! - Body reading, query and path parameter extraction
//!
//! # Design Decisions
//! - Raw body reading never decodes JSON; upstream parsers do that
//! - Form bodies and query strings repeat keys as arrays
//! - Missing path params yield an empty map rather than an error

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, Path},
    http::{request::Parts, Extensions, HeaderMap, Method, Uri},
};
use serde_json::{map::Entry, Map, Value};

use crate::error::RouteError;

/// Body parsed by an upstream stage.
#[derive(Debug, Clone)]
pub struct ParsedBody(pub Value);

/// Principal attached by the host's session layer (or an auth strategy).
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser(pub Value);

/// Read-only view of the current request, valid for one dispatch.
#[derive(Clone)]
pub struct RequestHandle(Arc<Parts>);

impl RequestHandle {
    /// Wrap the request head for the duration of one dispatch.
    pub fn new(parts: Parts) -> Self {
        Self(Arc::new(parts))
    }

    /// HTTP method of the request.
    pub fn method(&self) -> &Method {
        &self.0.method
    }

    /// Full request URI, query included.
    pub fn uri(&self) -> &Uri {
        &self.0.uri
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.0.headers
    }

    /// Extensions attached by upstream layers (`ParsedBody`, session data, ...).
    pub fn extensions(&self) -> &Extensions {
        &self.0.extensions
    }

    /// Authenticated principal, if the session layer or a strategy attached one.
    pub fn user(&self) -> Option<&Value> {
        self.0.extensions.get::<AuthenticatedUser>().map(|u| &u.0)
    }
}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("method", &self.0.method)
            .field("uri", &self.0.uri)
            .finish()
    }
}

/// Read the whole body and parse it by content type.
///
/// Empty bodies become `{}`; urlencoded forms become an object; everything
/// else is passed through as UTF-8 text.
pub async fn read_body(
    body: Body,
    content_type: Option<&str>,
    limit: usize,
) -> Result<Value, RouteError> {
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(RouteError::Body)?;

    if bytes.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let is_form = content_type
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    if is_form {
        return Ok(Value::Object(parse_pairs(&bytes)));
    }

    Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Parse a query string into an object.
pub fn parse_query(query: Option<&str>) -> Map<String, Value> {
    query.map(|q| parse_pairs(q.as_bytes())).unwrap_or_default()
}

/// Path captures for the matched route, or an empty map.
pub async fn path_params(parts: &mut Parts) -> Map<String, Value> {
    match Path::<HashMap<String, String>>::from_request_parts(parts, &()).await {
        Ok(Path(params)) => params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
        Err(_) => Map::new(),
    }
}

fn parse_pairs(input: &[u8]) -> Map<String, Value> {
    let mut map = Map::new();

    for (key, value) in url::form_urlencoded::parse(input) {
        let value = Value::String(value.into_owned());
        match map.entry(key.into_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                Value::Array(values) => values.push(value),
                existing => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            },
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_read_empty_body() {
        let value = read_body(Body::empty(), None, 1024).await.unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn test_read_json_body_as_text() {
        let value = read_body(
            Body::from(r#"{"foo":"bar"}"#),
            Some("application/json"),
            1024,
        )
        .await
        .unwrap();
        assert_eq!(value, json!(r#"{"foo":"bar"}"#));
    }

    #[tokio::test]
    async fn test_read_form_body() {
        let value = read_body(
            Body::from("name=ada&tag=a&tag=b"),
            Some("application/x-www-form-urlencoded; charset=utf-8"),
            1024,
        )
        .await
        .unwrap();
        assert_eq!(value, json!({"name": "ada", "tag": ["a", "b"]}));
    }

    #[tokio::test]
    async fn test_read_body_over_limit() {
        let err = read_body(Body::from(vec![b'x'; 64]), None, 16).await.unwrap_err();
        assert!(matches!(err, RouteError::Body(_)));
    }

    #[test]
    fn test_parse_query() {
        assert_eq!(
            Value::Object(parse_query(Some("a=1&b=two%20words"))),
            json!({"a": "1", "b": "two words"})
        );
        assert!(parse_query(None).is_empty());
    }
}
