//! Directory-configured HTTP reverse proxy library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pages;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::{ProxyConfig, RouteConfig};
pub use config::ConfigWatcher;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{RouteResolver, RouteStore, RouteTable};
