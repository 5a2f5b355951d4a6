//! Route handling modes.

use crate::routing::descriptor::{AuthConfig, RouteDescriptor};

/// How a route's pipeline is assembled. Decided once at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlingMode {
    /// `[middleware..., handler]`
    Open,

    /// `[middleware..., session guard, handler]`
    SessionGated { fail: String },

    /// `[auth step, middleware..., handler]`
    DelegatedAuth(AuthConfig),
}

impl HandlingMode {
    /// `auth` wins over `secure`; a route is open only when both are absent.
    pub fn classify(route: &RouteDescriptor) -> Self {
        match (&route.auth, &route.secure) {
            (Some(auth), _) => HandlingMode::DelegatedAuth(auth.clone()),
            (None, Some(secure)) => HandlingMode::SessionGated {
                fail: secure.fail.clone(),
            },
            (None, None) => HandlingMode::Open,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HandlingMode::Open => "open",
            HandlingMode::SessionGated { .. } => "secure",
            HandlingMode::DelegatedAuth(_) => "auth",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_route() {
        let route = RouteDescriptor::new("/ping", "cmd:ping");
        assert_eq!(HandlingMode::classify(&route), HandlingMode::Open);
    }

    #[test]
    fn test_secure_route() {
        let route = RouteDescriptor::new("/profile", "cmd:profile").with_secure("/");
        assert_eq!(
            HandlingMode::classify(&route),
            HandlingMode::SessionGated { fail: "/".into() }
        );
    }

    #[test]
    fn test_auth_wins_over_secure() {
        let route = RouteDescriptor::new("/login", "cmd:login")
            .with_secure("/nope")
            .with_auth("local", "/profile", "/");

        match HandlingMode::classify(&route) {
            HandlingMode::DelegatedAuth(auth) => assert_eq!(auth.strategy, "local"),
            other => panic!("expected delegated auth, got {:?}", other),
        }
    }
}
