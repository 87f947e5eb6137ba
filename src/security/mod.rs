//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Matched route (cors / security options)
//!     → cors.rs (CORS headers, preflight short-circuit)
//!     → headers.rs (security response headers)
//!     → policy headers merged into the proxied or error response
//! ```
//!
//! # Design Decisions
//! - Policies are pluggable: the forwarder only sees `ResponsePolicy` trait objects
//! - Policy headers are defaults; headers sent by the backend take precedence
//! - Options are parsed at route load time, never per request

pub mod cors;
pub mod headers;

use std::sync::Arc;

use axum::http::{request, HeaderMap, StatusCode};

use crate::config::RouteConfig;

pub use cors::{CorsOptions, CorsOrigin, CorsPolicy};
pub use headers::{HeaderToggle, SecurityHeadersPolicy, SecurityOptions};

/// Result of applying a policy to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOutcome {
    /// Keep processing; the request goes to the backend.
    Continue,
    /// Answer the client directly with this status and the collected headers.
    Respond(StatusCode),
}

/// A response-header policy configured per route.
pub trait ResponsePolicy<O>: Send + Sync {
    /// Apply `options` for `request`, writing response headers into `headers`.
    fn apply(&self, options: &O, request: &request::Parts, headers: &mut HeaderMap) -> PolicyOutcome;
}

/// The CORS and security-header policies used by the forwarder.
#[derive(Clone)]
pub struct PolicySet {
    cors: Arc<dyn ResponsePolicy<CorsOptions>>,
    security: Arc<dyn ResponsePolicy<SecurityOptions>>,
}

impl PolicySet {
    pub fn new(
        cors: Arc<dyn ResponsePolicy<CorsOptions>>,
        security: Arc<dyn ResponsePolicy<SecurityOptions>>,
    ) -> Self {
        Self { cors, security }
    }

    /// Run the policies enabled on `route`. CORS runs first; a preflight
    /// answer stops before the security headers are applied.
    pub fn apply(
        &self,
        route: &RouteConfig,
        request: &request::Parts,
        headers: &mut HeaderMap,
    ) -> PolicyOutcome {
        if let Some(options) = &route.cors {
            if let PolicyOutcome::Respond(status) = self.cors.apply(options, request, headers) {
                return PolicyOutcome::Respond(status);
            }
        }

        if let Some(options) = &route.security {
            self.security.apply(options, request, headers);
        }

        PolicyOutcome::Continue
    }
}

impl Default for PolicySet {
    fn default() -> Self {
        Self::new(Arc::new(CorsPolicy), Arc::new(SecurityHeadersPolicy))
    }
}

/// Copy policy headers into `target` wherever `target` has no value yet.
pub fn merge_policy_headers(target: &mut HeaderMap, policy: &HeaderMap) {
    for name in policy.keys() {
        if target.contains_key(name) {
            continue;
        }
        for value in policy.get_all(name) {
            target.append(name.clone(), value.clone());
        }
    }
}
