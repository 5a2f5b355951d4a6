//! Route path normalization.
//!
//! Descriptors use `:name` captures and `*` wildcards; axum wants `{name}` and
//! `{*name}`. Paths already in axum syntax pass through.

use crate::error::AdapterError;

/// Convert a descriptor path into the server's route syntax.
pub fn to_server_path(path: &str) -> Result<String, AdapterError> {
    if !path.starts_with('/') {
        return Err(AdapterError::InvalidPath(path.to_string()));
    }

    let segments: Vec<&str> = path.split('/').skip(1).collect();
    let last = segments.len().saturating_sub(1);
    let mut out = String::with_capacity(path.len() + 4);

    for (i, segment) in segments.iter().enumerate() {
        out.push('/');

        if let Some(name) = segment.strip_prefix(':') {
            if name.is_empty() || !is_ident(name) {
                return Err(AdapterError::InvalidPath(path.to_string()));
            }
            out.push('{');
            out.push_str(name);
            out.push('}');
        } else if let Some(name) = segment.strip_prefix('*') {
            if i != last {
                return Err(AdapterError::InvalidPath(path.to_string()));
            }
            let name = if name.is_empty() { "wildcard" } else { name };
            if !is_ident(name) {
                return Err(AdapterError::InvalidPath(path.to_string()));
            }
            out.push_str("{*");
            out.push_str(name);
            out.push('}');
        } else {
            out.push_str(segment);
        }
    }

    Ok(out)
}

fn is_ident(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_paths_unchanged() {
        assert_eq!(to_server_path("/").unwrap(), "/");
        assert_eq!(to_server_path("/api/ping").unwrap(), "/api/ping");
        assert_eq!(to_server_path("/users/{id}").unwrap(), "/users/{id}");
    }

    #[test]
    fn test_captures_and_wildcards() {
        assert_eq!(to_server_path("/users/:id").unwrap(), "/users/{id}");
        assert_eq!(
            to_server_path("/users/:id/posts/:post_id").unwrap(),
            "/users/{id}/posts/{post_id}"
        );
        assert_eq!(to_server_path("/files/*").unwrap(), "/files/{*wildcard}");
        assert_eq!(to_server_path("/files/*rest").unwrap(), "/files/{*rest}");
    }

    #[test]
    fn test_invalid_paths() {
        assert!(to_server_path("ping").is_err());
        assert!(to_server_path("/users/:").is_err());
        assert!(to_server_path("/files/*/more").is_err());
    }
}
