//! Strategy-based auth provider.
//!
//! Strategies are looked up by name when routes are registered. At request
//! time the chosen strategy inspects the request head (and any `ParsedBody`
//! an upstream parser attached) and either yields a principal or rejects.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use thiserror::Error;

use super::{AuthProvider, AuthRedirects};
use crate::error::{AdapterError, RouteError};
use crate::http::middleware::Middleware;
use crate::http::request::AuthenticatedUser;
use crate::http::response::redirect;

/// A strategy failed to run (as opposed to rejecting the credentials).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StrategyError(pub String);

/// A named authentication strategy.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// `Ok(Some(user))` on success, `Ok(None)` when credentials are rejected.
    async fn verify(&self, request: &Parts) -> Result<Option<Value>, StrategyError>;
}

/// `AuthProvider` over a fixed set of named strategies.
///
/// On success with a success redirect, the principal is attached to the
/// redirect response as an `AuthenticatedUser` extension so a host session
/// layer can persist it.
#[derive(Clone, Default)]
pub struct StrategyAuthenticator {
    strategies: HashMap<String, Arc<dyn Strategy>>,
}

impl StrategyAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, strategy: impl Strategy + 'static) -> Self {
        self.strategies.insert(name.into(), Arc::new(strategy));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }
}

impl AuthProvider for StrategyAuthenticator {
    fn authenticate(&self, strategy: &str, redirects: AuthRedirects) -> Result<Middleware, AdapterError> {
        let chosen = self
            .strategies
            .get(strategy)
            .cloned()
            .ok_or_else(|| AdapterError::UnknownStrategy(strategy.to_string()))?;

        Ok(Middleware::from_fn(format!("auth:{}", strategy), move |req, next| {
            run_strategy(chosen.clone(), redirects.clone(), req, next)
        }))
    }
}

async fn run_strategy(
    strategy: Arc<dyn Strategy>,
    redirects: AuthRedirects,
    req: Request,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();

    match strategy.verify(&parts).await {
        Ok(Some(user)) => match redirects.success_redirect {
            Some(target) => {
                let mut response = redirect(&target);
                response.extensions_mut().insert(AuthenticatedUser(user));
                response
            }
            None => {
                let mut req = Request::from_parts(parts, body);
                req.extensions_mut().insert(AuthenticatedUser(user));
                next.run(req).await
            }
        },
        Ok(None) => {
            tracing::debug!(path = %parts.uri.path(), "Authentication rejected");
            match redirects.failure_redirect {
                Some(target) => redirect(&target),
                None => StatusCode::UNAUTHORIZED.into_response(),
            }
        }
        Err(e) => RouteError::Auth(e.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouteFailure;
    use axum::{body::Body, http::header, routing::get, Router};
    use tower::ServiceExt;

    struct HeaderStrategy;

    #[async_trait]
    impl Strategy for HeaderStrategy {
        async fn verify(&self, request: &Parts) -> Result<Option<Value>, StrategyError> {
            match request.headers.get("x-user").map(|v| v.to_str()) {
                Some(Ok("boom")) => Err(StrategyError("backend down".into())),
                Some(Ok(name)) => Ok(Some(Value::String(name.to_string()))),
                _ => Ok(None),
            }
        }
    }

    fn app(redirects: AuthRedirects) -> Router {
        let provider = StrategyAuthenticator::new().with("header", HeaderStrategy);
        let step = provider.authenticate("header", redirects).unwrap();
        Router::new().route(
            "/login",
            get(|req: Request| async move {
                let user = req.extensions().get::<AuthenticatedUser>().cloned();
                format!("{:?}", user.map(|u| u.0))
            })
            .route_layer(axum::middleware::from_fn(move |req: Request, next: Next| {
                step.call(req, next)
            })),
        )
    }

    fn login(user: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/login");
        if let Some(user) = user {
            builder = builder.header("x-user", user);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn redirects() -> AuthRedirects {
        AuthRedirects {
            success_redirect: Some("/profile".into()),
            failure_redirect: Some("/".into()),
        }
    }

    #[test]
    fn test_unknown_strategy() {
        let provider = StrategyAuthenticator::new().with("header", HeaderStrategy);
        let err = provider.authenticate("oauth", AuthRedirects::default()).unwrap_err();
        assert!(matches!(err, AdapterError::UnknownStrategy(_)));
    }

    #[tokio::test]
    async fn test_success_redirects_with_principal() {
        let response = app(redirects()).oneshot(login(Some("ada"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/profile");
        assert_eq!(
            response.extensions().get::<AuthenticatedUser>(),
            Some(&AuthenticatedUser(Value::String("ada".into())))
        );
    }

    #[tokio::test]
    async fn test_failure_redirects() {
        let response = app(redirects()).oneshot(login(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn test_without_redirects() {
        let response = app(AuthRedirects::default())
            .oneshot(login(Some("ada")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(AuthRedirects::default()).oneshot(login(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_strategy_error_propagates() {
        let response = app(redirects()).oneshot(login(Some("boom"))).await.unwrap();
        let failure = response.extensions().get::<RouteFailure>().unwrap();
        assert!(matches!(failure.error(), RouteError::Auth(msg) if msg == "backend down"));
    }
}
