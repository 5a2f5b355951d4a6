//! Response shaping.
//!
//! # Responsibilities
//! - Response handle actions use to set status/headers or reply themselves
//! - Redirect and JSON reply helpers used by the route handler
//!
//! # Design Decisions
//! - Redirects are `302 Found`, the conventional login-flow redirect
//! - A handle accepts at most one sent response; later sends are refused

use std::fmt;
use std::sync::{Arc, Mutex};

use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;
use url::{Position, Url};

#[derive(Default)]
struct ResponseSlot {
    status: Option<StatusCode>,
    headers: HeaderMap,
    sent: Option<Response>,
}

/// Handle to the pending response, shared between the route handler and the
/// action it dispatched to.
#[derive(Clone, Default)]
pub struct ResponseHandle {
    slot: Arc<Mutex<ResponseSlot>>,
}

impl ResponseHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status applied to the adapter's own reply.
    pub fn set_status(&self, status: StatusCode) {
        self.lock().status = Some(status);
    }

    /// Header applied to the adapter's own reply.
    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.lock().headers.insert(name, value);
    }

    /// End the response from inside an action.
    ///
    /// Returns `false` if a response was already sent.
    pub fn send(&self, response: impl IntoResponse) -> bool {
        let mut slot = self.lock();
        if slot.sent.is_some() {
            return false;
        }
        slot.sent = Some(response.into_response());
        true
    }

    /// Shorthand for sending a JSON body.
    pub fn json(&self, value: Value) -> bool {
        self.send(Json(value))
    }

    pub fn is_sent(&self) -> bool {
        self.lock().sent.is_some()
    }

    pub(crate) fn take_sent(&self) -> Option<Response> {
        self.lock().sent.take()
    }

    /// Apply the recorded status and headers to `response`.
    pub(crate) fn finish(&self, mut response: Response) -> Response {
        let mut slot = self.lock();
        if let Some(status) = slot.status {
            *response.status_mut() = status;
        }
        let headers = std::mem::take(&mut slot.headers);
        response.headers_mut().extend(headers);
        response
    }

    /// Apply the recorded headers to a redirect. Status and `Location` stay.
    pub(crate) fn finish_redirect(&self, mut response: Response) -> Response {
        let mut headers = std::mem::take(&mut self.lock().headers);
        headers.remove(header::LOCATION);
        response.headers_mut().extend(headers);
        response
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ResponseSlot> {
        self.slot.lock().expect("response handle mutex poisoned")
    }
}

impl fmt::Debug for ResponseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.lock();
        f.debug_struct("ResponseHandle")
            .field("status", &slot.status)
            .field("sent", &slot.sent.is_some())
            .finish()
    }
}

/// `302 Found` to `location`, percent-encoded where needed.
pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, encode_location(location))]).into_response()
}

fn encode_location(location: &str) -> String {
    if location.bytes().all(|b| b.is_ascii_graphic()) {
        return location.to_string();
    }

    if let Ok(url) = Url::parse(location) {
        return url.into();
    }
    match Url::parse("http://localhost/").and_then(|base| base.join(location)) {
        Ok(url) => url[Position::BeforePath..].to_string(),
        Err(_) => location.to_string(),
    }
}

/// Dispatch result as a JSON body; `null` yields an empty body.
pub fn json_reply(value: Value) -> Response {
    match value {
        Value::Null => StatusCode::OK.into_response(),
        value => Json(value).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redirect() {
        let response = redirect("/profile");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/profile");
    }

    #[test]
    fn test_redirect_encodes_location() {
        let response = redirect("/café?name=zoë");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/caf%C3%A9?name=zo%C3%AB"
        );

        let response = redirect("https://example.com/über");
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://example.com/%C3%BCber"
        );

        let response = redirect("/already%20encoded?x=1");
        assert_eq!(response.headers()[header::LOCATION], "/already%20encoded?x=1");
    }

    #[test]
    fn test_finish_redirect_keeps_status_and_location() {
        let handle = ResponseHandle::new();
        handle.set_status(StatusCode::CREATED);
        handle.insert_header(header::SET_COOKIE, HeaderValue::from_static("sid=abc"));
        handle.insert_header(header::LOCATION, HeaderValue::from_static("/elsewhere"));

        let response = handle.finish_redirect(redirect("/home"));
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/home");
        assert_eq!(response.headers()[header::SET_COOKIE], "sid=abc");
    }

    #[test]
    fn test_handle_accepts_one_send() {
        let handle = ResponseHandle::new();
        assert!(handle.json(json!({"a": 1})));
        assert!(!handle.send(StatusCode::ACCEPTED));
        assert!(handle.is_sent());

        let sent = handle.take_sent().unwrap();
        assert_eq!(sent.status(), StatusCode::OK);
    }

    #[test]
    fn test_finish_applies_status_and_headers() {
        let handle = ResponseHandle::new();
        handle.set_status(StatusCode::CREATED);
        handle.insert_header(
            HeaderName::from_static("x-custom"),
            HeaderValue::from_static("yes"),
        );

        let response = handle.finish(json_reply(json!({"id": 7})));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-custom"], "yes");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }
}
