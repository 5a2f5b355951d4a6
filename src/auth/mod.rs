//! Authentication gates.
//!
//! # Data Flow
//! ```text
//! secure route:  [middleware..., session_guard] → handler
//!                guard: AuthenticatedUser present? → continue : 302 secure.fail
//!
//! auth route:    [AuthProvider::authenticate(strategy) step, middleware...] → handler
//!                provider redirects to pass/fail on its own terms
//! ```
//!
//! # Design Decisions
//! - A missing principal is not an error, it is a redirect
//! - The adapter never looks inside a strategy; the provider owns that logic

pub mod strategy;

use axum::{extract::Request, middleware::Next};

use crate::error::AdapterError;
use crate::http::middleware::Middleware;
use crate::http::request::AuthenticatedUser;
use crate::http::response::redirect;

pub use strategy::{Strategy, StrategyAuthenticator, StrategyError};

/// Where the provider should send the client after a strategy runs.
///
/// `None` means "no redirect": continue the pipeline on success, answer
/// `401 Unauthorized` on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthRedirects {
    pub success_redirect: Option<String>,
    pub failure_redirect: Option<String>,
}

/// Delegated authentication provider.
pub trait AuthProvider: Send + Sync {
    /// Build the pipeline stage that runs `strategy`.
    ///
    /// Unknown strategies are a setup error.
    fn authenticate(&self, strategy: &str, redirects: AuthRedirects) -> Result<Middleware, AdapterError>;
}

/// Redirects to `fail` unless the session layer attached a user.
pub fn session_guard(fail: String) -> Middleware {
    Middleware::from_fn("secure", move |req: Request, next: Next| {
        let fail = fail.clone();
        async move {
            if req.extensions().get::<AuthenticatedUser>().is_none() {
                tracing::debug!(path = %req.uri().path(), redirect = %fail, "No session user, redirecting");
                return redirect(&fail);
            }
            next.run(req).await
        }
    })
}
