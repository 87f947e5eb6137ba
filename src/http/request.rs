//! Request preparation for forwarding.
//!
//! # Responsibilities
//! - Extract the request target (path and query) used for matching
//! - Rewrite the target with the route's prefix rules
//! - Build the outbound request for the backend
//!
//! # Design Decisions
//! - Strip before add; both are plain string operations on the target
//! - Method and headers pass through untouched, `Host` included
//! - The body is streamed to the backend, never buffered

use axum::body::Body;
use axum::http::{request, Request, Uri, Version};

use crate::config::RouteConfig;

/// Error preparing an outbound request.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid backend URI `{uri}`: {source}")]
    InvalidUri {
        uri: String,
        source: axum::http::uri::InvalidUri,
    },

    #[error("failed to build outbound request: {0}")]
    Build(#[from] axum::http::Error),
}

/// The request target as received: path plus query string.
pub fn request_target(uri: &Uri) -> &str {
    uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}

/// Apply `remove_prefix`, then `add_prefix`, to `target`.
pub fn rewrite_path(target: &str, remove_prefix: Option<&str>, add_prefix: Option<&str>) -> String {
    let mut path = target;
    if let Some(prefix) = remove_prefix.filter(|p| !p.is_empty()) {
        path = path.strip_prefix(prefix).unwrap_or(path);
    }

    match add_prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{prefix}{path}"),
        None => path.to_string(),
    }
}

/// Absolute URI for `target` on `backend`.
pub fn backend_uri(backend: &str, target: &str) -> Result<Uri, ForwardError> {
    let origin_form = if target.is_empty() {
        "/".to_string()
    } else if target.starts_with('/') {
        target.to_string()
    } else {
        format!("/{target}")
    };

    let uri = format!("http://{backend}{origin_form}");
    uri.parse::<Uri>()
        .map_err(|source| ForwardError::InvalidUri { uri, source })
}

/// Build the request sent to the route's backend.
pub fn outbound_request(
    parts: request::Parts,
    body: Body,
    route: &RouteConfig,
    target: &str,
) -> Result<Request<Body>, ForwardError> {
    let uri = backend_uri(&route.backend, target)?;

    // Backends speak HTTP/1.x regardless of the client's protocol.
    let version = if parts.version == Version::HTTP_10 {
        Version::HTTP_10
    } else {
        Version::HTTP_11
    };

    let mut builder = Request::builder()
        .method(parts.method)
        .version(version)
        .uri(uri);
    if let Some(headers) = builder.headers_mut() {
        *headers = parts.headers;
    }

    Ok(builder.body(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn test_strip_then_add() {
        assert_eq!(rewrite_path("/api/users", Some("/api"), Some("/v1")), "/v1/users");
    }

    #[test]
    fn test_prefix_rules_optional() {
        assert_eq!(rewrite_path("/api/users", None, None), "/api/users");
        assert_eq!(rewrite_path("/api/users", Some("/other"), None), "/api/users");
        assert_eq!(rewrite_path("/api/users", None, Some("/base")), "/base/api/users");
        assert_eq!(rewrite_path("/api/users", Some(""), Some("")), "/api/users");
    }

    #[test]
    fn test_query_preserved() {
        assert_eq!(rewrite_path("/api/items?page=2", Some("/api"), None), "/items?page=2");
    }

    #[test]
    fn test_backend_uri_normalizes_target() {
        assert_eq!(backend_uri("svc:8080", "").unwrap().to_string(), "http://svc:8080/");
        assert_eq!(backend_uri("svc:8080", "v2").unwrap().to_string(), "http://svc:8080/v2");
        assert_eq!(
            backend_uri("svc:8080", "/a?b=c").unwrap().to_string(),
            "http://svc:8080/a?b=c"
        );
        assert!(backend_uri("svc:8080", "/bad path").is_err());
    }

    #[test]
    fn test_outbound_request_passthrough() {
        let (parts, body) = Request::builder()
            .method(Method::POST)
            .version(Version::HTTP_11)
            .uri("/api/users?x=1")
            .header("host", "proxy.example.com")
            .header("x-custom", "kept")
            .body(Body::from("payload"))
            .unwrap()
            .into_parts();

        let route = RouteConfig::new("/api", "users:9000");
        let req = outbound_request(parts, body, &route, "/v1/users?x=1").unwrap();

        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.uri().to_string(), "http://users:9000/v1/users?x=1");
        assert_eq!(req.headers().get("host").unwrap(), "proxy.example.com");
        assert_eq!(req.headers().get("x-custom").unwrap(), "kept");
    }
}
