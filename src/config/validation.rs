//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required fields: `urlContext` and `backend` must be non-empty
//! - Backends must be plain-HTTP `host[:port]` authorities
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouteConfig → Result<(), Vec<ValidationError>>
//! - Runs before a route is accepted into the table

use std::str::FromStr;

use axum::http::uri::Authority;

use crate::config::schema::RouteConfig;

/// A semantic problem with a route definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("backend `{0}` uses https; only plain HTTP backends are supported")]
    TlsBackend(String),

    #[error("backend `{0}` is not a valid host[:port]")]
    InvalidBackend(String),
}

/// Strip a tolerated `http://` scheme and trailing slashes from a backend.
pub fn normalize_backend(backend: &str) -> String {
    let trimmed = backend.trim();
    let without_scheme = trimmed.strip_prefix("http://").unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}

/// Validate a parsed route definition.
pub fn validate_route(route: &RouteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if route.url_context.is_empty() {
        errors.push(ValidationError::MissingField("urlContext"));
    }

    if route.backend.is_empty() {
        errors.push(ValidationError::MissingField("backend"));
    } else if route.backend.starts_with("https://") {
        errors.push(ValidationError::TlsBackend(route.backend.clone()));
    } else if route.backend.contains('/') || Authority::from_str(&route.backend).is_err() {
        errors.push(ValidationError::InvalidBackend(route.backend.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
