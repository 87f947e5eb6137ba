//! Built-in pages served on reserved paths.
//!
//! # Data Flow
//! ```text
//! "/"              → templates.rs (index view, current route table)
//! "/health"        → health.rs (JSON status + timestamp)
//! "/documentation" → templates.rs (documentation view)
//! no route matched → templates.rs (404 view)
//! ```
//!
//! # Design Decisions
//! - Rendering sits behind the `TemplateRenderer` trait
//! - Views on disk override the built-in pages; they are read once at startup

pub mod health;
pub mod templates;

pub use health::HealthStatus;
pub use templates::{RenderError, TemplateRenderer, ViewRenderer};
