//! Gateway error responses.
//!
//! # Responsibilities
//! - Map upstream failures to client-facing status codes and bodies
//! - Classify hyper client errors (unreachable vs other)
//!
//! # Design Decisions
//! - Refused connections and DNS failures are "unreachable" → 504
//! - Any other upstream error → 502
//! - Connect-phase and response-phase timeouts both → 504, distinct bodies

use std::error::Error as StdError;
use std::io;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Ways a proxied request can fail before the backend response is relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyFailure {
    /// The backend body did not start within the timeout.
    ResponseTimeout,
    /// Connecting or waiting for the response head timed out.
    RequestTimeout,
    /// Connection refused or host not resolvable.
    BackendUnreachable,
    /// Any other upstream error.
    BadGateway,
    /// The outbound request could not be prepared.
    Internal,
}

impl ProxyFailure {
    pub fn status(self) -> StatusCode {
        match self {
            ProxyFailure::ResponseTimeout
            | ProxyFailure::RequestTimeout
            | ProxyFailure::BackendUnreachable => StatusCode::GATEWAY_TIMEOUT,
            ProxyFailure::BadGateway => StatusCode::BAD_GATEWAY,
            ProxyFailure::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ProxyFailure::ResponseTimeout => "Gateway Timeout - Response took too long",
            ProxyFailure::RequestTimeout => "Gateway Timeout",
            ProxyFailure::BackendUnreachable => "Gateway Timeout - Backend Unreachable",
            ProxyFailure::BadGateway => "Bad Gateway",
            ProxyFailure::Internal => "Internal Server Error",
        }
    }
}

impl IntoResponse for ProxyFailure {
    fn into_response(self) -> Response {
        (self.status(), self.message()).into_response()
    }
}

/// Classify an error from the upstream client.
pub fn classify_upstream_error(err: &hyper_util::client::legacy::Error) -> ProxyFailure {
    if err.is_connect() && is_unreachable(err) {
        ProxyFailure::BackendUnreachable
    } else {
        ProxyFailure::BadGateway
    }
}

/// Walk the source chain looking for a refused connection or DNS failure.
pub fn is_unreachable(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(cause) = current {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        if cause.to_string().starts_with("dns error") {
            return true;
        }
        current = cause.source();
    }
    false
}
