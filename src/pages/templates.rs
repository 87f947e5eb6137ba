//! Page templates for the landing, documentation and not-found pages.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use serde_json::{Map, Value};

pub const INDEX_VIEW: &str = "index";
pub const DOCUMENTATION_VIEW: &str = "documentation";
pub const NOT_FOUND_VIEW: &str = "404";

const BUILTIN_INDEX: &str = include_str!("../../views/index.html");
const BUILTIN_DOCUMENTATION: &str = include_str!("../../views/documentation.html");
const BUILTIN_NOT_FOUND: &str = include_str!("../../views/404.html");

/// Error rendering a page.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unknown view `{0}`")]
    UnknownView(String),
}

/// Renders a named view with optional data into an HTML body.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, view: &str, data: &Map<String, Value>) -> Result<String, RenderError>;
}

/// Renders `<dir>/<view>.html`, falling back to the built-in pages.
///
/// Templates are read once, when the renderer is built. `{{ key }}`
/// placeholders are replaced with HTML-escaped values from the data map;
/// keys ending in `_html` are inserted as-is.
#[derive(Debug, Clone)]
pub struct ViewRenderer {
    views: HashMap<&'static str, String>,
}

impl ViewRenderer {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let views = [
            (INDEX_VIEW, BUILTIN_INDEX),
            (DOCUMENTATION_VIEW, BUILTIN_DOCUMENTATION),
            (NOT_FOUND_VIEW, BUILTIN_NOT_FOUND),
        ]
        .into_iter()
        .map(|(view, builtin)| (view, load_view(dir, view, builtin)))
        .collect();

        Self { views }
    }
}

fn load_view(dir: &Path, view: &str, builtin: &str) -> String {
    let path = dir.join(format!("{view}.html"));
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            tracing::debug!(path = %path.display(), "Loaded view template");
            content
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => builtin.to_string(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read view template, using built-in");
            builtin.to_string()
        }
    }
}

impl TemplateRenderer for ViewRenderer {
    fn render(&self, view: &str, data: &Map<String, Value>) -> Result<String, RenderError> {
        let mut html = self
            .views
            .get(view)
            .cloned()
            .ok_or_else(|| RenderError::UnknownView(view.to_string()))?;
        for (key, value) in data {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let replacement = if key.ends_with("_html") {
                text
            } else {
                escape_html(&text)
            };
            html = html.replace(&format!("{{{{ {key} }}}}"), &replacement);
        }
        Ok(html)
    }
}

fn builtin(view: &str) -> Option<&'static str> {
    match view {
        INDEX_VIEW => Some(BUILTIN_INDEX),
        DOCUMENTATION_VIEW => Some(BUILTIN_DOCUMENTATION),
        NOT_FOUND_VIEW => Some(BUILTIN_NOT_FOUND),
        _ => None,
    }
}

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
