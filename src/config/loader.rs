//! Route definition loading from disk.

use std::ffi::OsString;
use std::path::Path;

use crate::config::schema::RouteConfig;
use crate::config::validation::{normalize_backend, validate_route, ValidationError};
use crate::routing::RouteTable;

/// Extension that marks a file as a route definition.
pub const ROUTE_FILE_EXTENSION: &str = "json";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returns true if `path` names a route definition file.
pub fn is_route_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == ROUTE_FILE_EXTENSION)
}

/// Parse and validate a single route definition.
pub fn parse_route(content: &str) -> Result<RouteConfig, ConfigError> {
    let mut route: RouteConfig = serde_json::from_str(content)?;
    route.backend = normalize_backend(&route.backend);

    validate_route(&route).map_err(ConfigError::Validation)?;

    Ok(route)
}

/// Load and validate a route definition file.
pub async fn load_route_file(path: &Path) -> Result<RouteConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_route(&content)
}

/// Build a fresh route table from every definition file in `dir`.
///
/// The directory is created if it does not exist. Files that fail to parse or
/// validate are logged and skipped. Files are processed in file-name order;
/// when two files share a `urlContext`, the later one replaces the earlier.
pub async fn load_all(dir: &Path) -> Result<RouteTable, ConfigError> {
    tokio::fs::create_dir_all(dir).await?;

    let mut names: Vec<OsString> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if is_route_file(Path::new(&name)) {
            names.push(name);
        }
    }
    names.sort();

    let mut table = RouteTable::new();
    for name in names {
        let path = dir.join(&name);
        match load_route_file(&path).await {
            Ok(route) => {
                tracing::debug!(
                    file = %path.display(),
                    url_context = %route.url_context,
                    backend = %route.backend,
                    "Loaded route"
                );
                if let Some(previous) = table.insert(route) {
                    tracing::warn!(
                        file = %path.display(),
                        url_context = %previous.url_context,
                        "Duplicate urlContext, replacing earlier definition"
                    );
                }
            }
            Err(e) => {
                tracing::error!(file = %path.display(), error = %e, "Skipping route definition");
            }
        }
    }

    tracing::info!(dir = %dir.display(), routes = table.len(), "Route table loaded");
    Ok(table)
}
