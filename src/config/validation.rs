//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0, addresses parse)
//! - Check every route is registrable (path, pattern, methods, gate targets)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AdapterConfig → Result<(), Vec<ValidationError>>
//! - Middleware names are not checked here; the registry is only known at registration

use std::net::SocketAddr;

use axum::http::Method;
use axum::routing::MethodFilter;
use thiserror::Error;

use crate::config::schema::AdapterConfig;
use crate::routing::RouteDescriptor;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("route #{index}: path '{path}' must start with '/'")]
    RoutePath { index: usize, path: String },

    #[error("route #{index} ({path}): pattern is empty")]
    EmptyPattern { index: usize, path: String },

    #[error("route #{index} ({path}): no methods declared")]
    NoMethods { index: usize, path: String },

    #[error("route #{index} ({path}): unsupported method '{method}'")]
    BadMethod { index: usize, path: String, method: String },

    #[error("route #{index} ({path}): {field} is empty")]
    EmptyField { index: usize, path: String, field: &'static str },
}

pub fn validate_config(config: &AdapterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.options.body_limit == 0 {
        errors.push(ValidationError::Zero("options.body_limit"));
    }

    for (index, route) in config.routes.iter().enumerate() {
        validate_route(index, route, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_route(index: usize, route: &RouteDescriptor, errors: &mut Vec<ValidationError>) {
    let path = route.path.clone();

    if !route.path.starts_with('/') {
        errors.push(ValidationError::RoutePath { index, path: path.clone() });
    }
    if route.pattern.trim().is_empty() {
        errors.push(ValidationError::EmptyPattern { index, path: path.clone() });
    }
    if route.methods.is_empty() {
        errors.push(ValidationError::NoMethods { index, path: path.clone() });
    }
    for method in &route.methods {
        let known = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .ok()
            .and_then(|m| MethodFilter::try_from(m).ok())
            .is_some();
        if !known {
            errors.push(ValidationError::BadMethod {
                index,
                path: path.clone(),
                method: method.clone(),
            });
        }
    }

    let mut require = |value: &str, field: &'static str| {
        if value.trim().is_empty() {
            errors.push(ValidationError::EmptyField { index, path: path.clone(), field });
        }
    };
    if let Some(auth) = &route.auth {
        require(&auth.strategy, "auth.strategy");
        require(&auth.pass, "auth.pass");
        require(&auth.fail, "auth.fail");
    }
    if let Some(secure) = &route.secure {
        require(&secure.fail, "secure.fail");
    }
    if let Some(redirect) = &route.redirect {
        require(redirect, "redirect");
    }
}
