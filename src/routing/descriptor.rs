//! Declarative route descriptors.
//!
//! A descriptor ties a path and a set of HTTP verbs to a dispatch pattern,
//! plus optional middleware and one of the auth gates. Descriptors are loaded
//! from config (serde) or built in code with the `with_*` helpers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::http::middleware::Middleware;

/// Delegated authentication settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Strategy name understood by the auth provider.
    pub strategy: String,

    /// Redirect target on successful authentication.
    pub pass: String,

    /// Redirect target on failed authentication.
    pub fail: String,
}

/// Session-presence gate settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SecureConfig {
    /// Redirect target when no authenticated user is attached.
    pub fail: String,
}

/// Reference to a middleware, either by registry name or directly.
///
/// Only names survive serialization; a direct middleware serializes as its
/// label.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum MiddlewareRef {
    Named(String),
    Direct(Middleware),
}

impl From<String> for MiddlewareRef {
    fn from(name: String) -> Self {
        MiddlewareRef::Named(name)
    }
}

impl From<&str> for MiddlewareRef {
    fn from(name: &str) -> Self {
        MiddlewareRef::Named(name.to_string())
    }
}

impl From<Middleware> for MiddlewareRef {
    fn from(middleware: Middleware) -> Self {
        MiddlewareRef::Direct(middleware)
    }
}

impl From<MiddlewareRef> for String {
    fn from(reference: MiddlewareRef) -> Self {
        reference.to_string()
    }
}

impl fmt::Display for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareRef::Named(name) => f.write_str(name),
            MiddlewareRef::Direct(middleware) => f.write_str(middleware.name()),
        }
    }
}

fn default_autoreply() -> bool {
    true
}

/// A single route to register.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteDescriptor {
    /// Route path. Accepts `:param` and `*` segments.
    pub path: String,

    /// HTTP verbs, case-insensitive.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Middleware run before the route handler, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub middleware: Vec<MiddlewareRef>,

    /// Delegated authentication. Takes precedence over `secure`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,

    /// Session-presence gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<SecureConfig>,

    /// Fixed redirect issued after a successful dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,

    /// Send the dispatch result as the response body.
    #[serde(default = "default_autoreply")]
    pub autoreply: bool,

    /// Dispatch pattern, e.g. `role:web,cmd:ping`.
    pub pattern: String,
}

impl RouteDescriptor {
    /// An open, auto-replying route with no methods yet.
    pub fn new(path: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            methods: Vec::new(),
            middleware: Vec::new(),
            auth: None,
            secure: None,
            redirect: None,
            autoreply: default_autoreply(),
            pattern: pattern.into(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.methods.push(method.into());
        self
    }

    pub fn with_middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.middleware.push(middleware.into());
        self
    }

    pub fn with_auth(
        mut self,
        strategy: impl Into<String>,
        pass: impl Into<String>,
        fail: impl Into<String>,
    ) -> Self {
        self.auth = Some(AuthConfig {
            strategy: strategy.into(),
            pass: pass.into(),
            fail: fail.into(),
        });
        self
    }

    pub fn with_secure(mut self, fail: impl Into<String>) -> Self {
        self.secure = Some(SecureConfig { fail: fail.into() });
        self
    }

    pub fn with_redirect(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    pub fn with_autoreply(mut self, autoreply: bool) -> Self {
        self.autoreply = autoreply;
        self
    }
}
