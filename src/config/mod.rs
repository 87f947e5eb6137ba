//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! routes/*.json
//!     → loader.rs (parse & deserialize, one route per file)
//!     → validation.rs (semantic checks)
//!     → RouteTable (validated, immutable)
//!     → published through RouteStore to request handlers
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs rebuilds the whole table
//!     → atomic swap of Arc<RouteTable>
//!     → new requests resolve against the new table
//! ```
//!
//! # Design Decisions
//! - Routes are immutable once loaded; changes require full reload
//! - A bad file is skipped, never fatal to the reload
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_all, ConfigError};
pub use schema::{ProxyConfig, RouteConfig};
pub use watcher::ConfigWatcher;
