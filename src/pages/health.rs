//! Health check payload.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Body of the `/health` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    /// RFC 3339 / ISO-8601 UTC timestamp.
    pub timestamp: String,
}

impl HealthStatus {
    pub fn current() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl IntoResponse for HealthStatus {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
