//! Cross-Origin Resource Sharing policy.
//!
//! Mirrors the option names commonly used for per-route CORS settings:
//! `origin`, `methods`, `allowedHeaders`, `exposedHeaders`, `credentials`,
//! `maxAge`, `preflightContinue` and `optionsSuccessStatus`.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE,
    ACCESS_CONTROL_REQUEST_HEADERS, ORIGIN, VARY,
};
use axum::http::{request, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};

use super::{PolicyOutcome, ResponsePolicy};

const DEFAULT_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Which origins are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// `true` reflects the request origin, `false` disables CORS.
    Enabled(bool),
    /// A fixed value, `*` by default.
    Exact(String),
    /// Reflect the request origin only if it is listed.
    List(Vec<String>),
}

impl Default for CorsOrigin {
    fn default() -> Self {
        CorsOrigin::Exact("*".to_string())
    }
}

/// A header value given either as one string or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StringList {
    One(String),
    Many(Vec<String>),
}

impl StringList {
    fn joined(&self) -> String {
        match self {
            StringList::One(s) => s.clone(),
            StringList::Many(items) => items.join(","),
        }
    }
}

/// Per-route CORS options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorsOptions {
    pub origin: CorsOrigin,
    pub methods: Option<StringList>,
    pub allowed_headers: Option<StringList>,
    pub exposed_headers: Option<StringList>,
    pub credentials: bool,
    pub max_age: Option<u64>,
    /// Forward preflight requests to the backend instead of answering them.
    pub preflight_continue: bool,
    pub options_success_status: Option<u16>,
}

/// Default CORS policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorsPolicy;

impl ResponsePolicy<CorsOptions> for CorsPolicy {
    fn apply(
        &self,
        options: &CorsOptions,
        request: &request::Parts,
        headers: &mut HeaderMap,
    ) -> PolicyOutcome {
        if options.origin == CorsOrigin::Enabled(false) {
            return PolicyOutcome::Continue;
        }

        apply_origin(options, request, headers);

        if options.credentials {
            headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }

        if request.method != Method::OPTIONS {
            if let Some(exposed) = &options.exposed_headers {
                set(headers, ACCESS_CONTROL_EXPOSE_HEADERS, &exposed.joined());
            }
            return PolicyOutcome::Continue;
        }

        let methods = options
            .methods
            .as_ref()
            .map(StringList::joined)
            .unwrap_or_else(|| DEFAULT_METHODS.to_string());
        set(headers, ACCESS_CONTROL_ALLOW_METHODS, &methods);

        match &options.allowed_headers {
            Some(allowed) => set(headers, ACCESS_CONTROL_ALLOW_HEADERS, &allowed.joined()),
            None => {
                if let Some(requested) = request.headers.get(ACCESS_CONTROL_REQUEST_HEADERS) {
                    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
                    headers.append(VARY, HeaderValue::from_static("Access-Control-Request-Headers"));
                }
            }
        }

        if let Some(max_age) = options.max_age {
            headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(max_age));
        }

        if options.preflight_continue {
            return PolicyOutcome::Continue;
        }

        let status = options
            .options_success_status
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::NO_CONTENT);
        PolicyOutcome::Respond(status)
    }
}

fn apply_origin(options: &CorsOptions, request: &request::Parts, headers: &mut HeaderMap) {
    let request_origin = request.headers.get(ORIGIN);

    match &options.origin {
        CorsOrigin::Enabled(_) => {
            if let Some(origin) = request_origin {
                headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            }
            headers.append(VARY, HeaderValue::from_static("Origin"));
        }
        CorsOrigin::Exact(value) => {
            set(headers, ACCESS_CONTROL_ALLOW_ORIGIN, value);
            if value != "*" {
                headers.append(VARY, HeaderValue::from_static("Origin"));
            }
        }
        CorsOrigin::List(allowed) => {
            let listed = request_origin
                .and_then(|o| o.to_str().ok())
                .filter(|o| allowed.iter().any(|a| a == o));
            if let Some(origin) = listed {
                set(headers, ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            }
            headers.append(VARY, HeaderValue::from_static("Origin"));
        }
    }
}

fn set(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(_) => tracing::warn!(header = %name, value = %value, "Ignoring invalid CORS header value"),
    }
}
