//! Security response headers.
//!
//! # Responsibilities
//! - Add the standard hardening headers to proxied responses
//! - Let each route turn individual headers off or override their value
//!
//! # Design Decisions
//! - Every header is on unless the route sets it to `false`
//! - A string value replaces the default header value
//! - Backend-provided values are never overwritten (see `merge_policy_headers`)

use axum::http::{request, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use super::{PolicyOutcome, ResponsePolicy};

const DEFAULT_CSP: &str = "default-src 'self';base-uri 'self';font-src 'self' https: data:;\
form-action 'self';frame-ancestors 'self';img-src 'self' data:;object-src 'none';\
script-src 'self';script-src-attr 'none';style-src 'self' https: 'unsafe-inline';\
upgrade-insecure-requests";

/// Per-header switch: `true`/`false`, or a replacement value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HeaderToggle {
    Enabled(bool),
    Value(String),
}

impl Default for HeaderToggle {
    fn default() -> Self {
        HeaderToggle::Enabled(true)
    }
}

impl HeaderToggle {
    fn resolve<'a>(&'a self, default: &'a str) -> Option<&'a str> {
        match self {
            HeaderToggle::Enabled(true) => Some(default),
            HeaderToggle::Enabled(false) => None,
            HeaderToggle::Value(v) => Some(v.as_str()),
        }
    }
}

/// Per-route security header options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityOptions {
    pub content_security_policy: HeaderToggle,
    pub cross_origin_opener_policy: HeaderToggle,
    pub cross_origin_resource_policy: HeaderToggle,
    pub origin_agent_cluster: HeaderToggle,
    pub referrer_policy: HeaderToggle,
    pub strict_transport_security: HeaderToggle,
    pub x_content_type_options: HeaderToggle,
    pub x_dns_prefetch_control: HeaderToggle,
    pub x_download_options: HeaderToggle,
    pub x_frame_options: HeaderToggle,
    pub x_permitted_cross_domain_policies: HeaderToggle,
    pub x_xss_protection: HeaderToggle,
}

impl SecurityOptions {
    fn entries(&self) -> [(&HeaderToggle, &'static str, &'static str); 12] {
        [
            (&self.content_security_policy, "content-security-policy", DEFAULT_CSP),
            (&self.cross_origin_opener_policy, "cross-origin-opener-policy", "same-origin"),
            (&self.cross_origin_resource_policy, "cross-origin-resource-policy", "same-origin"),
            (&self.origin_agent_cluster, "origin-agent-cluster", "?1"),
            (&self.referrer_policy, "referrer-policy", "no-referrer"),
            (
                &self.strict_transport_security,
                "strict-transport-security",
                "max-age=31536000; includeSubDomains",
            ),
            (&self.x_content_type_options, "x-content-type-options", "nosniff"),
            (&self.x_dns_prefetch_control, "x-dns-prefetch-control", "off"),
            (&self.x_download_options, "x-download-options", "noopen"),
            (&self.x_frame_options, "x-frame-options", "SAMEORIGIN"),
            (
                &self.x_permitted_cross_domain_policies,
                "x-permitted-cross-domain-policies",
                "none",
            ),
            (&self.x_xss_protection, "x-xss-protection", "0"),
        ]
    }
}

/// Default security-header policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityHeadersPolicy;

impl ResponsePolicy<SecurityOptions> for SecurityHeadersPolicy {
    fn apply(
        &self,
        options: &SecurityOptions,
        _request: &request::Parts,
        headers: &mut HeaderMap,
    ) -> PolicyOutcome {
        for (toggle, name, default) in options.entries() {
            let Some(value) = toggle.resolve(default) else {
                continue;
            };
            match HeaderValue::from_str(value) {
                Ok(v) => {
                    headers.insert(HeaderName::from_static(name), v);
                }
                Err(_) => tracing::warn!(header = name, "Ignoring invalid security header value"),
            }
        }
        PolicyOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn apply(json: &str) -> HeaderMap {
        let options: SecurityOptions = serde_json::from_str(json).unwrap();
        let (parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();
        let mut headers = HeaderMap::new();
        SecurityHeadersPolicy.apply(&options, &parts, &mut headers);
        headers
    }

    #[test]
    fn test_defaults_enabled() {
        let headers = apply("{}");
        assert_eq!(headers.len(), 12);
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "SAMEORIGIN");
        assert!(headers
            .get("content-security-policy")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("default-src 'self'"));
    }

    #[test]
    fn test_disable_and_override() {
        let headers = apply(r#"{"contentSecurityPolicy": false, "xFrameOptions": "DENY"}"#);
        assert!(headers.get("content-security-policy").is_none());
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.len(), 11);
    }

    #[test]
    fn test_invalid_override_skipped() {
        let headers = apply(r#"{"referrerPolicy": "bad\nvalue"}"#);
        assert!(headers.get("referrer-policy").is_none());
    }
}
