//! Configuration schema definitions.
//!
//! Route definitions are JSON documents with camelCase keys, one route per
//! file. Process settings come from the command line and the environment.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::resilience::{IgnorePatterns, TimeoutPolicy};
use crate::security::{CorsOptions, SecurityOptions};

/// A single route definition, immutable once loaded.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    /// URL prefix this route answers for.
    #[serde(default)]
    pub url_context: String,

    /// Upstream `host[:port]`.
    #[serde(default)]
    pub backend: String,

    /// Stripped from the request path before forwarding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_prefix: Option<String>,

    /// Prepended to the path after `remove_prefix` is applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_prefix: Option<String>,

    /// Request and response timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Paths matching any of these patterns skip the request timeout.
    #[serde(default, skip_serializing_if = "IgnorePatterns::is_empty")]
    pub ignore_timeout: IgnorePatterns,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityOptions>,

    /// Emit one log line per forwarded request.
    #[serde(default)]
    pub log: bool,
}

impl RouteConfig {
    /// Create a route with only the required fields set.
    pub fn new(url_context: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            url_context: url_context.into(),
            backend: backend.into(),
            ..Default::default()
        }
    }

    /// Deadlines for a request to `path` on this route.
    pub fn timeout_policy(&self, path: &str) -> TimeoutPolicy {
        TimeoutPolicy::for_request(self.timeout, &self.ignore_timeout, path)
    }
}

/// Process-level settings.
#[derive(Debug, Clone, Parser)]
#[command(name = "route-proxy", version, about = "Directory-configured HTTP reverse proxy")]
pub struct ProxyConfig {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 9000)]
    pub port: u16,

    /// Interface to bind.
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub bind_host: String,

    /// Directory holding route definition files.
    #[arg(long, env = "ROUTES_DIR", default_value = "routes")]
    pub routes_dir: PathBuf,

    /// Directory holding page templates.
    #[arg(long, env = "VIEWS_DIR", default_value = "views")]
    pub views_dir: PathBuf,
}

impl ProxyConfig {
    /// Bind address (e.g., "0.0.0.0:9000").
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: 9000,
            bind_host: "0.0.0.0".to_string(),
            routes_dir: PathBuf::from("routes"),
            views_dir: PathBuf::from("views"),
        }
    }
}
